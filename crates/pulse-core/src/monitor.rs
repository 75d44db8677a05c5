//! Sampling orchestrator.
//!
//! [`HealthMonitor`] owns the three channel windows and the latest derived
//! vitals. One `tick()` pulls one reading from each sensor collaborator;
//! once the windows are full every tick also recomputes SpO2, heart rate
//! and temperature. Callers poll [`HealthMonitor::get_data`] until a
//! complete snapshot is available.

use log::{debug, warn};

use crate::buffer::SampleBuffer;
use crate::config::MonitorConfig;
use crate::heart_rate::HeartRateEstimator;
use crate::sensors::{PpgSensor, Thermometer};
use crate::spo2;
use crate::telemetry::{self, HealthSnapshot};
use crate::temperature::TemperatureReading;

/// Fill state of the sampling windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// At least one window is still below capacity.
    Filling,
    /// All windows are full; derived vitals are recomputed every tick.
    Ready,
}

pub struct HealthMonitor<P, T> {
    ppg: P,
    thermometer: T,
    estimator: HeartRateEstimator,

    ir_window: SampleBuffer,
    red_window: SampleBuffer,
    object_window: SampleBuffer,
    /// Latest successful ambient read; instantaneous, not windowed.
    ambient_c: Option<f32>,

    spo2: Option<f32>,
    heart_rate: Option<f32>,
    temperature: Option<TemperatureReading>,
}

impl<P, T> HealthMonitor<P, T>
where
    P: PpgSensor,
    T: Thermometer,
{
    pub fn new(ppg: P, thermometer: T, config: &MonitorConfig) -> Self {
        Self {
            ppg,
            thermometer,
            estimator: HeartRateEstimator::new(config.sample_rate_hz, config.smoothing_window),
            ir_window: SampleBuffer::new(config.window_size),
            red_window: SampleBuffer::new(config.window_size),
            object_window: SampleBuffer::new(config.window_size),
            ambient_c: None,
            spo2: None,
            heart_rate: None,
            temperature: None,
        }
    }

    /// Run one sampling iteration.
    ///
    /// A failed sensor read is logged and that channel simply contributes
    /// nothing this tick; the windows keep their previous contents.
    pub async fn tick(&mut self) {
        self.sample_ppg().await;
        self.sample_temperature().await;
        self.recompute();
    }

    async fn sample_ppg(&mut self) {
        if let Err(e) = self.ppg.poll().await {
            warn!("PPG poll failed, no optical sample this tick: {}", e);
            return;
        }
        if !self.ppg.available() {
            debug!("PPG has no sample ready");
            return;
        }

        // Red and IR arrive as a pair; both pops succeed after available().
        let (Some(red), Some(ir)) = (self.ppg.pop_red(), self.ppg.pop_ir()) else {
            return;
        };
        self.red_window.push(red as f32);
        self.ir_window.push(ir as f32);
    }

    async fn sample_temperature(&mut self) {
        let ambient = match self.thermometer.ambient_temperature().await {
            Ok(value) => value,
            Err(e) => {
                warn!("ambient temperature read failed, skipping this tick: {}", e);
                return;
            }
        };
        let object = match self.thermometer.object_temperature().await {
            Ok(value) => value,
            Err(e) => {
                warn!("object temperature read failed, skipping this tick: {}", e);
                return;
            }
        };

        self.ambient_c = Some(ambient);
        self.object_window.push(object);
    }

    /// Refresh the derived vitals from any window that has reached capacity.
    fn recompute(&mut self) {
        if self.ir_window.is_full() && self.red_window.is_full() {
            let ir = self.ir_window.snapshot();
            let red = self.red_window.snapshot();
            self.spo2 = spo2::estimate(&ir, &red);
            // Overwrites with None on a degenerate window (< 2 peaks) so a
            // stale rate is never republished.
            self.heart_rate = self.estimator.estimate(&ir);
        }

        if self.object_window.is_full()
            && let Some(ambient) = self.ambient_c
        {
            self.temperature = TemperatureReading::from_window(ambient, &self.object_window.snapshot());
        }
    }

    pub fn state(&self) -> MonitorState {
        if self.ir_window.is_full() && self.red_window.is_full() && self.object_window.is_full() {
            MonitorState::Ready
        } else {
            MonitorState::Filling
        }
    }

    /// Occupancy of the IR window, for fill-progress reporting.
    pub fn fill_level(&self) -> usize {
        self.ir_window.len()
    }

    pub fn window_size(&self) -> usize {
        self.ir_window.capacity()
    }

    /// The current snapshot, or `None` while any derived value is absent.
    ///
    /// `uptime_secs` is the device's seconds-since-boot counter; it is
    /// shifted into the published epoch by [`telemetry::boot_timestamp`].
    pub fn get_data(&self, uptime_secs: u32) -> Option<HealthSnapshot> {
        Some(HealthSnapshot {
            timestamp: telemetry::boot_timestamp(uptime_secs),
            spo2: self.spo2?,
            heart_rate: self.heart_rate?,
            temperature: self.temperature?,
        })
    }

    /// Power the PPG sensor down. Terminal: the monitor is consumed.
    pub async fn shutdown(mut self) {
        if let Err(e) = self.ppg.shutdown().await {
            warn!("PPG shutdown failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitorConfig;
    use crate::sensors::SensorError;
    use alloc::collections::VecDeque;
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::Cell;
    use embassy_futures::block_on;

    /// Scripted PPG source: yields one queued (red, ir) pair per poll.
    struct ScriptedPpg {
        pairs: VecDeque<(u32, u32)>,
        ready: Option<(u32, u32)>,
        fail_polls: usize,
        shut_down: Rc<Cell<bool>>,
    }

    impl ScriptedPpg {
        fn new(pairs: impl IntoIterator<Item = (u32, u32)>) -> Self {
            Self {
                pairs: pairs.into_iter().collect(),
                ready: None,
                fail_polls: 0,
                shut_down: Rc::new(Cell::new(false)),
            }
        }
    }

    impl PpgSensor for ScriptedPpg {
        async fn poll(&mut self) -> Result<(), SensorError> {
            if self.fail_polls > 0 {
                self.fail_polls -= 1;
                return Err(SensorError::Bus {
                    sensor: "scripted",
                    operation: "poll",
                });
            }
            if self.ready.is_none() {
                self.ready = self.pairs.pop_front();
            }
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
            self.shut_down.set(true);
            Ok(())
        }
    }

    /// Thermometer with a fixed ambient and scripted object readings.
    struct ScriptedThermometer {
        ambient_c: f32,
        object_c: VecDeque<f32>,
        fail_reads: usize,
    }

    impl ScriptedThermometer {
        fn constant(ambient_c: f32, object_c: f32, ticks: usize) -> Self {
            Self {
                ambient_c,
                object_c: (0..ticks).map(|_| object_c).collect(),
                fail_reads: 0,
            }
        }
    }

    impl Thermometer for ScriptedThermometer {
        async fn ambient_temperature(&mut self) -> Result<f32, SensorError> {
            if self.fail_reads > 0 {
                self.fail_reads -= 1;
                return Err(SensorError::Bus {
                    sensor: "scripted",
                    operation: "ambient",
                });
            }
            Ok(self.ambient_c)
        }

        async fn object_temperature(&mut self) -> Result<f32, SensorError> {
            Ok(self.object_c.pop_front().unwrap_or(f32::NAN))
        }
    }

    fn small_config() -> MonitorConfig {
        MonitorConfig {
            // min peak distance = 2 samples, so the 4-sample beat below fits.
            sample_rate_hz: 4,
            window_size: 8,
            smoothing_window: 1,
            ..MonitorConfig::default()
        }
    }

    /// IR beat pattern with apexes every 4 samples; paired with a weaker
    /// red channel so SpO2 lands strictly inside (0, 100).
    fn beat_pairs(count: usize) -> Vec<(u32, u32)> {
        (0..count)
            .map(|i| {
                let ir = match i % 4 {
                    0 => 50_000,
                    1 => 52_000,
                    2 => 50_000,
                    _ => 49_000,
                };
                let red = match i % 4 {
                    0 => 60_000,
                    1 => 61_000,
                    2 => 60_000,
                    _ => 59_000,
                };
                (red, ir)
            })
            .collect()
    }

    #[test]
    fn test_snapshot_absent_until_eighth_tick() {
        let ppg = ScriptedPpg::new(beat_pairs(8));
        let thermometer = ScriptedThermometer::constant(22.0, 36.8, 8);
        let mut monitor = HealthMonitor::new(ppg, thermometer, &small_config());

        for tick in 0..7 {
            block_on(monitor.tick());
            assert_eq!(monitor.state(), MonitorState::Filling);
            assert!(
                monitor.get_data(tick).is_none(),
                "snapshot leaked at tick {tick}"
            );
        }

        block_on(monitor.tick());
        assert_eq!(monitor.state(), MonitorState::Ready);

        let snapshot = monitor.get_data(100).expect("snapshot after 8 ticks");
        assert_eq!(snapshot.timestamp, telemetry::boot_timestamp(100));
        assert!(snapshot.spo2 > 0.0 && snapshot.spo2 <= 100.0);
        // Apexes every 4 samples at 4 Hz: one beat per second.
        assert!((snapshot.heart_rate - 60.0).abs() < 1.0);
        assert!((snapshot.temperature.object_c - 36.8).abs() < 1e-4);
        assert!((snapshot.temperature.ambient_c - 22.0).abs() < 1e-4);
    }

    #[test]
    fn test_failed_reads_skip_tick_without_corrupting_windows() {
        let mut ppg = ScriptedPpg::new(beat_pairs(8));
        ppg.fail_polls = 3;
        let mut thermometer = ScriptedThermometer::constant(22.0, 36.8, 8);
        thermometer.fail_reads = 3;
        let mut monitor = HealthMonitor::new(ppg, thermometer, &small_config());

        // Three failing ticks contribute nothing.
        for _ in 0..3 {
            block_on(monitor.tick());
        }
        assert_eq!(monitor.fill_level(), 0);

        // The remaining ticks fill as usual and produce a snapshot.
        for _ in 0..8 {
            block_on(monitor.tick());
        }
        assert_eq!(monitor.state(), MonitorState::Ready);
        assert!(monitor.get_data(0).is_some());
    }

    #[test]
    fn test_flat_ir_window_keeps_snapshot_absent() {
        // A full window with no cardiac signal: SpO2 computes (flat but
        // positive dc) yet heart rate must be explicitly absent, so no
        // snapshot is produced.
        let pairs: Vec<(u32, u32)> = (0..8).map(|_| (60_000, 50_000)).collect();
        let ppg = ScriptedPpg::new(pairs);
        let thermometer = ScriptedThermometer::constant(22.0, 36.8, 8);
        let mut monitor = HealthMonitor::new(ppg, thermometer, &small_config());

        for _ in 0..8 {
            block_on(monitor.tick());
        }
        assert_eq!(monitor.state(), MonitorState::Ready);
        assert!(monitor.get_data(0).is_none());
    }

    #[test]
    fn test_window_slides_after_full() {
        let ppg = ScriptedPpg::new(beat_pairs(12));
        let thermometer = ScriptedThermometer::constant(22.0, 36.8, 12);
        let mut monitor = HealthMonitor::new(ppg, thermometer, &small_config());

        for _ in 0..12 {
            block_on(monitor.tick());
        }
        // Window stays at capacity; extra ticks slide rather than grow it.
        assert_eq!(monitor.fill_level(), 8);
        assert_eq!(monitor.state(), MonitorState::Ready);
        assert!(monitor.get_data(0).is_some());
    }

    #[test]
    fn test_shutdown_powers_down_ppg() {
        let ppg = ScriptedPpg::new(beat_pairs(1));
        let shut_down = ppg.shut_down.clone();
        let thermometer = ScriptedThermometer::constant(22.0, 36.8, 1);
        let monitor = HealthMonitor::new(ppg, thermometer, &small_config());

        block_on(monitor.shutdown());
        assert!(shut_down.get());
    }
}
