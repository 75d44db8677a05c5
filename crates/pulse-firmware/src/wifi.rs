//! Wi-Fi association and network stack bring-up.

use embassy_executor::Spawner;
use embassy_net::{Config as NetConfig, Runner, Stack, StackResources};
use embassy_time::{Duration, Timer, with_timeout};
use esp_radio::wifi::{
    ClientConfiguration, Configuration, WifiController, WifiDevice, WifiEvent, WifiState,
};
use log::{info, warn};
use pulse_core::config::InternetConfig;
use static_cell::StaticCell;

/// How long boot waits for association plus DHCP before giving up.
/// Startup without a network is fatal; there is nobody to publish to.
const BRING_UP_TIMEOUT: Duration = Duration::from_secs(30);

/// Delay between association attempts.
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Bring the station interface up: spawn the connection and stack runner
/// tasks, then wait for link and a DHCP lease.
///
/// Returns `None` when the network does not come up within
/// [`BRING_UP_TIMEOUT`]; the caller treats that as fatal.
pub async fn bring_up(
    spawner: &Spawner,
    controller: WifiController<'static>,
    device: WifiDevice<'static>,
    credentials: &InternetConfig<'static>,
    seed: u64,
) -> Option<Stack<'static>> {
    static RESOURCES: StaticCell<StackResources<4>> = StaticCell::new();
    let (stack, runner) = embassy_net::new(
        device,
        NetConfig::dhcpv4(Default::default()),
        RESOURCES.init(StackResources::new()),
        seed,
    );

    spawner.spawn(net_task(runner)).expect("spawn net task");
    spawner
        .spawn(connection_task(
            controller,
            credentials.ssid,
            credentials.password,
        ))
        .expect("spawn Wi-Fi connection task");

    if with_timeout(BRING_UP_TIMEOUT, stack.wait_link_up()).await.is_err() {
        warn!("Wi-Fi association timed out");
        return None;
    }
    if with_timeout(BRING_UP_TIMEOUT, stack.wait_config_up()).await.is_err() {
        warn!("DHCP configuration timed out");
        return None;
    }

    if let Some(config) = stack.config_v4() {
        info!("Connected to Wi-Fi: {}", config.address);
    }
    Some(stack)
}

/// Keeps the station associated, re-connecting after any disconnect.
#[embassy_executor::task]
async fn connection_task(
    mut controller: WifiController<'static>,
    ssid: &'static str,
    password: &'static str,
) {
    loop {
        if esp_radio::wifi::sta_state() == WifiState::StaConnected {
            // Already up; sleep until the association drops.
            controller.wait_for_event(WifiEvent::StaDisconnected).await;
            warn!("Wi-Fi disconnected");
            Timer::after(RETRY_DELAY).await;
        }

        if !matches!(controller.is_started(), Ok(true)) {
            let client_config = Configuration::Client(ClientConfiguration {
                ssid: ssid.into(),
                password: password.into(),
                ..Default::default()
            });
            controller
                .set_configuration(&client_config)
                .expect("set Wi-Fi configuration");
            controller.start_async().await.expect("start Wi-Fi");
        }

        info!("Connecting to Wi-Fi...");
        match controller.connect_async().await {
            Ok(()) => info!("Wi-Fi associated"),
            Err(e) => {
                warn!("Wi-Fi association failed: {:?}", e);
                Timer::after(RETRY_DELAY).await;
            }
        }
    }
}

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) -> ! {
    runner.run().await
}
