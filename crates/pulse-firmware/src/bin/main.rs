#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]

use embassy_executor::Spawner;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{Duration, Instant, Ticker, Timer};
use esp_hal::Async;
use esp_hal::clock::CpuClock;
use esp_hal::efuse::Efuse;
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::rmt::Rmt;
use esp_hal::time::Rate;
use esp_hal::timer::timg::TimerGroup;
use esp_hal_smartled::{SmartLedsAdapter, smart_led_buffer};
use heapless::String;
use log::{error, info, warn};
use static_cell::StaticCell;

use pulse_core::bus::SharedI2cDevice;
use pulse_core::config::PublishMode;
use pulse_core::monitor::{HealthMonitor, MonitorState};
use pulse_core::sensors::{Max30102, Mlx90614};
use pulse_core::telemetry::TelemetryPayload;

use pulse_firmware::mqtt::{MqttBuffers, MqttHandler};
use pulse_firmware::{config, rainbow, wifi};

/// Log fill progress roughly this often while the windows fill.
const FILL_REPORT_STEP: usize = 64;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

extern crate alloc;

// This creates a default app-descriptor required by the esp-idf bootloader.
esp_bootloader_esp_idf::esp_app_desc!();

type SharedI2cBus = Mutex<CriticalSectionRawMutex, I2c<'static, Async>>;

/// Fatal boot error: log it and park the node. There is no meaningful
/// degraded mode for a sensor that cannot reach its bus or its broker.
async fn halt(message: &str) -> ! {
    error!("fatal: {message}");
    loop {
        Timer::after(Duration::from_secs(60)).await;
    }
}

/// Probe every 7-bit address and log what answers. Returns the number of
/// devices found; a silent bus means miswired or missing sensors.
async fn scan_i2c(bus: &'static SharedI2cBus) -> usize {
    let mut found = 0;
    let mut i2c = bus.lock().await;
    for address in 0x08..=0x77u8 {
        if i2c.write(address, &[]).await.is_ok() {
            info!("I2C device found at {:#04x}", address);
            found += 1;
        }
    }
    found
}

/// Uppercase colon-separated MAC, doubling as MQTT client id and sensorID.
fn format_sensor_id(mac: &[u8; 6]) -> String<17> {
    use core::fmt::Write as _;

    let mut id = String::new();
    for (i, byte) in mac.iter().enumerate() {
        if i > 0 {
            let _ = id.push(':');
        }
        let _ = write!(id, "{byte:02X}");
    }
    id
}

#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!();

    let esp_config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(esp_config);

    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 73744);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    info!("Initialising...");

    // Startup animation on the status NeoPixel.
    let rmt = Rmt::new(peripherals.RMT, Rate::from_mhz(80)).expect("initialize RMT");
    let mut led = SmartLedsAdapter::new(rmt.channel0, peripherals.GPIO21, smart_led_buffer!(1));
    rainbow::startup_sweep(&mut led).await;

    // The oximeter and the thermometer share one bus.
    let i2c = I2c::new(
        peripherals.I2C0,
        I2cConfig::default().with_frequency(Rate::from_khz(100)),
    )
    .expect("initialize I2C")
    .with_sda(peripherals.GPIO33)
    .with_scl(peripherals.GPIO34)
    .into_async();

    static I2C_BUS: StaticCell<SharedI2cBus> = StaticCell::new();
    let i2c_bus = I2C_BUS.init(Mutex::new(i2c));

    if scan_i2c(i2c_bus).await == 0 {
        halt("no I2C devices found").await;
    }

    let node_config = config::node_config();
    if node_config.internet.ssid.is_empty() {
        halt("no Wi-Fi credentials were compiled in (set PULSE_SSID/PULSE_PASSWORD)").await;
    }

    let radio_init = esp_radio::init().expect("initialize Wi-Fi controller");
    let (controller, interfaces) =
        esp_radio::wifi::new(&radio_init, peripherals.WIFI, Default::default())
            .expect("initialize Wi-Fi interfaces");

    let mac = Efuse::mac_address();
    let sensor_id = format_sensor_id(&mac);
    // The network stack wants a seed, not entropy; the MAC keeps it
    // distinct per device.
    let seed = u64::from_le_bytes([mac[0], mac[1], mac[2], mac[3], mac[4], mac[5], 0x5E, 0xED]);

    let Some(stack) = wifi::bring_up(
        &spawner,
        controller,
        interfaces.sta,
        &node_config.internet,
        seed,
    )
    .await
    else {
        halt("Wi-Fi did not come up").await;
    };

    static MQTT_BUFFERS: StaticCell<MqttBuffers> = StaticCell::new();
    let broker = &node_config.broker;
    let mut mqtt = match MqttHandler::connect(
        stack,
        MQTT_BUFFERS.init(MqttBuffers::new()),
        broker.host,
        broker.port,
        sensor_id.as_str(),
    )
    .await
    {
        Ok(handler) => handler,
        Err(e) => {
            error!("MQTT connection to {}:{} failed: {:?}", broker.host, broker.port, e);
            halt("broker unreachable at startup").await;
        }
    };

    let mut ppg = Max30102::new(SharedI2cDevice::new(i2c_bus));
    if let Err(e) = ppg.setup(&mut embassy_time::Delay).await {
        error!("pulse oximeter setup failed: {}", e);
        halt("MAX30102 unusable").await;
    }
    let thermometer = Mlx90614::new(SharedI2cDevice::new(i2c_bus));

    let monitor_config = node_config.monitor;
    info!(
        "Sampling at {} Hz into {}-sample windows ({:?} mode)",
        monitor_config.sample_rate_hz, monitor_config.window_size, monitor_config.publish_mode
    );
    let mut monitor = HealthMonitor::new(ppg, thermometer, &monitor_config);

    let mut ticker = Ticker::every(Duration::from_micros(
        1_000_000 / monitor_config.sample_rate_hz as u64,
    ));
    let mut json_buf = [0u8; 256];
    // Seeded to the window size so the first READY tick publishes right
    // away; continuous mode then republishes once per window of samples.
    let mut ticks_since_publish = monitor_config.window_size;
    let mut last_fill_report = 0;

    'sampling: loop {
        ticker.next().await;
        monitor.tick().await;
        ticks_since_publish += 1;

        if monitor.state() == MonitorState::Filling {
            let fill = monitor.fill_level();
            if fill / FILL_REPORT_STEP != last_fill_report {
                last_fill_report = fill / FILL_REPORT_STEP;
                info!("Filling sample windows: {}/{}", fill, monitor.window_size());
            }
            continue;
        }

        if ticks_since_publish < monitor_config.window_size {
            continue;
        }
        let uptime_secs = Instant::now().as_secs() as u32;
        let Some(snapshot) = monitor.get_data(uptime_secs) else {
            // Full windows but no usable heart beat (for example, no
            // finger on the sensor); keep sampling.
            continue;
        };

        let json = match TelemetryPayload::new(&snapshot, sensor_id.as_str()).to_json(&mut json_buf)
        {
            Ok(json) => json,
            Err(e) => {
                warn!("payload serialization failed: {:?}", e);
                continue;
            }
        };

        match mqtt.publish(broker.topic, json).await {
            Ok(()) => {
                ticks_since_publish = 0;
                info!(
                    "Published reading: spo2 {:.1} %, {:.1} bpm, {:.1} °F",
                    snapshot.spo2, snapshot.heart_rate, snapshot.temperature.object_f
                );
                if monitor_config.publish_mode == PublishMode::Once {
                    break 'sampling;
                }
            }
            Err(e) => warn!("publish failed: {:?}", e),
        }
    }

    // Once-mode wind-down: leave the broker cleanly and power the
    // oximeter LEDs off.
    if let Err(e) = mqtt.disconnect().await {
        warn!("MQTT disconnect failed: {:?}", e);
    }
    monitor.shutdown().await;
    info!("Reading published; node idle");

    loop {
        Timer::after(Duration::from_secs(60)).await;
    }
}
