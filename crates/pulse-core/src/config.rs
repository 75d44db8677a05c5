//! Node configuration.

use serde::{Deserialize, Serialize};

use crate::heart_rate::DEFAULT_SMOOTHING_WINDOW;

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(bound(deserialize = "'de: 'a"))]
pub struct Config<'a> {
    pub internet: InternetConfig<'a>,
    pub broker: BrokerConfig<'a>,
    pub monitor: MonitorConfig,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct InternetConfig<'a> {
    pub ssid: &'a str,
    pub password: &'a str,
}

/// MQTT broker endpoint and topic.
#[derive(Serialize, Deserialize, Debug)]
pub struct BrokerConfig<'a> {
    pub host: &'a str,
    pub port: u16,
    pub topic: &'a str,
}

impl Default for BrokerConfig<'_> {
    fn default() -> Self {
        Self {
            host: "broker.hivemq.com",
            port: 1883,
            topic: "pulse/sensordata",
        }
    }
}

/// Sampling and aggregation parameters.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct MonitorConfig {
    /// PPG sampling frequency, Hz.
    pub sample_rate_hz: u32,
    /// Capacity of the IR/Red/temperature windows, in samples.
    pub window_size: usize,
    /// Moving-average width for heart-rate smoothing, in samples.
    pub smoothing_window: usize,
    pub publish_mode: PublishMode,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 400,
            window_size: 512,
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
            publish_mode: PublishMode::default(),
        }
    }
}

/// What happens after a full window produces a reading.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PublishMode {
    /// Publish a single reading, then disconnect and power down.
    #[default]
    Once,
    /// Keep publishing a reading on every full cycle.
    Continuous,
}
