//! Compile-time node configuration.
//!
//! Values come from the environment at build time (see `build.rs`, which
//! also loads an uncommitted `.env` file). Missing credentials leave the
//! constants empty; boot checks for that and refuses to continue rather
//! than associating with a nonsense network.

use pulse_core::config::{BrokerConfig, Config, InternetConfig, MonitorConfig, PublishMode};

pub const SSID: &str = match option_env!("PULSE_SSID") {
    Some(value) => value,
    None => "",
};

pub const PASSWORD: &str = match option_env!("PULSE_PASSWORD") {
    Some(value) => value,
    None => "",
};

pub const BROKER_HOST: &str = match option_env!("PULSE_BROKER_HOST") {
    Some(value) => value,
    None => "broker.hivemq.com",
};

const BROKER_PORT_RAW: &str = match option_env!("PULSE_BROKER_PORT") {
    Some(value) => value,
    None => "1883",
};

pub const TOPIC: &str = match option_env!("PULSE_TOPIC") {
    Some(value) => value,
    None => "pulse/sensordata",
};

const PUBLISH_MODE_RAW: &str = match option_env!("PULSE_PUBLISH_MODE") {
    Some(value) => value,
    None => "once",
};

fn broker_port() -> u16 {
    BROKER_PORT_RAW.parse().unwrap_or(1883)
}

fn publish_mode() -> PublishMode {
    match PUBLISH_MODE_RAW {
        "continuous" => PublishMode::Continuous,
        _ => PublishMode::Once,
    }
}

/// Assemble the full node configuration from the compiled-in values.
pub fn node_config() -> Config<'static> {
    Config {
        internet: InternetConfig {
            ssid: SSID,
            password: PASSWORD,
        },
        broker: BrokerConfig {
            host: BROKER_HOST,
            port: broker_port(),
            topic: TOPIC,
        },
        monitor: MonitorConfig {
            publish_mode: publish_mode(),
            ..MonitorConfig::default()
        },
    }
}
