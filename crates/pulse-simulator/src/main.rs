//! Desktop simulator for the pulse-rs vitals node.
//!
//! Drives the real [`HealthMonitor`] with synthetic sensor data so the
//! whole pipeline — sample windows, SpO2, heart rate, temperature
//! aggregation and the JSON telemetry payload — can be exercised without
//! hardware or a broker. What would go to MQTT is printed to stdout.
//!
//! ```bash
//! cargo run -p pulse-simulator               # publish once, then exit
//! cargo run -p pulse-simulator -- --continuous
//! ```

use std::io::Write as _;
use std::time::Duration;

use embassy_futures::block_on;
use log::info;

use pulse_core::config::{MonitorConfig, PublishMode};
use pulse_core::monitor::{HealthMonitor, MonitorState};
use pulse_core::sensors::{PpgSensor, SensorError, Thermometer};
use pulse_core::telemetry::TelemetryPayload;

/// Stand-in for the device MAC the firmware derives from its efuses.
const SENSOR_ID: &str = "02:00:5E:10:00:01";

/// Simulated subject vitals.
const SUBJECT_BPM: f32 = 72.0;
const SUBJECT_OBJECT_C: f32 = 36.9;
const SUBJECT_AMBIENT_C: f32 = 22.5;

// ---------------------------------------------------------------------------
// Synthetic sensors
// ---------------------------------------------------------------------------

/// Synthetic pulse-oximeter front end.
///
/// Produces a cardiac-looking waveform: a DC baseline per channel with a
/// pulsatile component beating at [`SUBJECT_BPM`]. One sample pair becomes
/// available per poll, mirroring a sensor drained at its own sample rate.
struct SyntheticPpg {
    tick: u64,
    sample_rate_hz: f32,
    ready: Option<(u32, u32)>,
}

impl SyntheticPpg {
    fn new(sample_rate_hz: u32) -> Self {
        Self {
            tick: 0,
            sample_rate_hz: sample_rate_hz as f32,
            ready: None,
        }
    }
}

impl PpgSensor for SyntheticPpg {
    async fn poll(&mut self) -> Result<(), SensorError> {
        let t = self.tick as f32 / self.sample_rate_hz;
        self.tick += 1;

        // Fundamental plus a weak second harmonic: one asymmetric systolic
        // peak per beat, like a real PPG pulse with its dicrotic shoulder.
        let phase = core::f32::consts::TAU * SUBJECT_BPM / 60.0 * t;
        let beat = phase.sin() + 0.2 * (2.0 * phase + 0.5).sin();

        // IR carries the stronger pulsatile swing, as on a real finger.
        let ir = 50_000.0 + 12_000.0 * beat;
        let red = 60_000.0 + 6_500.0 * beat;
        self.ready = Some((red as u32, ir as u32));
        Ok(())
    }

    fn available(&self) -> bool {
        self.ready.is_some()
    }

    fn pop_red(&mut self) -> Option<u32> {
        self.ready.map(|(red, _)| red)
    }

    fn pop_ir(&mut self) -> Option<u32> {
        self.ready.take().map(|(_, ir)| ir)
    }

    async fn shutdown(&mut self) -> Result<(), SensorError> {
        info!("synthetic PPG powered down");
        Ok(())
    }
}

/// Synthetic thermometer with a slow drift on the object channel.
struct SyntheticThermometer {
    reads: u64,
}

impl Thermometer for SyntheticThermometer {
    async fn ambient_temperature(&mut self) -> Result<f32, SensorError> {
        Ok(SUBJECT_AMBIENT_C)
    }

    async fn object_temperature(&mut self) -> Result<f32, SensorError> {
        self.reads += 1;
        let drift = 0.05 * (self.reads as f32 / 100.0).sin();
        Ok(SUBJECT_OBJECT_C + drift)
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn parse_publish_mode() -> PublishMode {
    let mut mode = PublishMode::Once;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--continuous" => mode = PublishMode::Continuous,
            "--once" => mode = PublishMode::Once,
            other => {
                eprintln!("unknown argument: {other}");
                eprintln!("usage: pulse-simulator [--once | --continuous]");
                std::process::exit(1);
            }
        }
    }
    mode
}

fn main() {
    env_logger::init();

    let publish_mode = parse_publish_mode();
    let config = MonitorConfig {
        publish_mode,
        ..MonitorConfig::default()
    };

    info!(
        "Starting pulse-rs simulator: {} Hz, window {}, mode {:?}",
        config.sample_rate_hz, config.window_size, config.publish_mode
    );

    let ppg = SyntheticPpg::new(config.sample_rate_hz);
    let thermometer = SyntheticThermometer { reads: 0 };
    let mut monitor = HealthMonitor::new(ppg, thermometer, &config);

    let tick_period = Duration::from_secs_f64(1.0 / config.sample_rate_hz as f64);
    let started = std::time::Instant::now();
    let mut json_buf = [0u8; 256];
    let mut published = 0u32;
    // Seeded to the window size so the first READY tick publishes
    // immediately; afterwards continuous mode republishes once per
    // window-worth of fresh samples.
    let mut ticks_since_publish = config.window_size;

    loop {
        block_on(monitor.tick());
        ticks_since_publish += 1;

        if monitor.state() == MonitorState::Filling {
            print!(
                "\rFilling sample window: {}/{}",
                monitor.fill_level(),
                monitor.window_size()
            );
            let _ = std::io::stdout().flush();
        } else if ticks_since_publish >= config.window_size
            && let Some(snapshot) = monitor.get_data(started.elapsed().as_secs() as u32)
        {
            let payload = TelemetryPayload::new(&snapshot, SENSOR_ID);
            match payload.to_json(&mut json_buf) {
                Ok(json) => {
                    published += 1;
                    ticks_since_publish = 0;
                    println!("\nPublished: {}", String::from_utf8_lossy(json));
                }
                Err(e) => {
                    eprintln!("\npayload serialization failed: {e:?}");
                    std::process::exit(1);
                }
            }

            if config.publish_mode == PublishMode::Once {
                info!("single reading published, shutting down");
                block_on(monitor.shutdown());
                break;
            }
        }

        std::thread::sleep(tick_period);
    }

    info!("Simulator exiting after {published} published reading(s)");
}
