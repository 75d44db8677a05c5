//! Heart-rate estimation from the smoothed IR channel.
//!
//! Three stages: a simple moving average knocks the high-frequency noise
//! off the raw PPG signal, interior local maxima with a minimum spacing
//! become candidate beats, and the mean inter-peak interval converts to
//! beats per minute.

use alloc::vec::Vec;

/// Default moving-average window, in samples.
pub const DEFAULT_SMOOTHING_WINDOW: usize = 5;

/// Minimum plausible inter-beat gap, in seconds (~600 ms).
///
/// Candidate peaks closer than this to the previously accepted one are
/// rejected as noise rather than beats.
const MIN_PEAK_SPACING_SECS: f32 = 0.6;

/// Smoothed window: `smoothed[i] = mean(raw[i..i + window])`.
///
/// Output length is `len - window + 1`; empty when the input is shorter
/// than the window.
pub fn moving_average(raw: &[f32], window: usize) -> Vec<f32> {
    if window == 0 || raw.len() < window {
        return Vec::new();
    }

    let mut smoothed = Vec::with_capacity(raw.len() - window + 1);
    let mut sum: f32 = raw[..window].iter().sum();
    smoothed.push(sum / window as f32);
    for i in window..raw.len() {
        sum += raw[i] - raw[i - window];
        smoothed.push(sum / window as f32);
    }
    smoothed
}

/// Indices of interior local maxima at least `min_distance` samples apart.
///
/// Scans left to right; the first accepted peak wins and later candidates
/// inside its exclusion zone are discarded without backtracking.
pub fn find_peaks(data: &[f32], min_distance: usize) -> Vec<usize> {
    let mut peaks: Vec<usize> = Vec::new();
    if data.len() < 3 {
        return peaks;
    }

    for i in 1..data.len() - 1 {
        if data[i] > data[i - 1] && data[i] > data[i + 1] {
            match peaks.last() {
                Some(&previous) if i - previous < min_distance => {}
                _ => peaks.push(i),
            }
        }
    }
    peaks
}

/// Beats-per-minute estimator over a full IR sample window.
#[derive(Debug, Clone, Copy)]
pub struct HeartRateEstimator {
    sample_rate_hz: f32,
    smoothing_window: usize,
}

impl HeartRateEstimator {
    pub fn new(sample_rate_hz: u32, smoothing_window: usize) -> Self {
        Self {
            sample_rate_hz: sample_rate_hz as f32,
            smoothing_window,
        }
    }

    /// Minimum accepted distance between beats, in samples.
    fn min_peak_distance(&self) -> usize {
        (self.sample_rate_hz * MIN_PEAK_SPACING_SECS) as usize
    }

    /// Estimate the heart rate over one IR window.
    ///
    /// Returns `None` when fewer than two peaks survive peak detection —
    /// there is no interval to measure, so the cycle has no reading. Callers
    /// must treat this as "no reading", never as "keep the previous one".
    pub fn estimate(&self, ir: &[f32]) -> Option<f32> {
        let smoothed = moving_average(ir, self.smoothing_window);
        let peaks = find_peaks(&smoothed, self.min_peak_distance());
        if peaks.len() < 2 {
            return None;
        }

        let span = (peaks[peaks.len() - 1] - peaks[0]) as f32;
        let mean_interval_secs = span / (peaks.len() - 1) as f32 / self.sample_rate_hz;
        Some(60.0 / mean_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    /// Triangle wave with apexes every `period` samples.
    fn triangle(len: usize, period: usize) -> Vec<f32> {
        (0..len)
            .map(|i| {
                let phase = i % period;
                let half = period / 2;
                if phase <= half {
                    phase as f32
                } else {
                    (period - phase) as f32
                }
            })
            .collect()
    }

    #[test]
    fn test_moving_average_length_and_values() {
        let smoothed = moving_average(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(smoothed, vec![2.0, 3.0, 4.0]);
        assert!(moving_average(&[1.0, 2.0], 3).is_empty());
    }

    #[test]
    fn test_find_peaks_requires_strict_local_maximum() {
        // Plateaus are not peaks: neither of the equal middle samples
        // strictly dominates both neighbors.
        let plateau = [0.0, 1.0, 1.0, 0.0];
        assert!(find_peaks(&plateau, 0).is_empty());

        let single = [0.0, 1.0, 0.0, 2.0, 0.0];
        assert_eq!(find_peaks(&single, 0), vec![1, 3]);
    }

    #[test]
    fn test_find_peaks_enforces_minimum_distance() {
        // Peaks at 1, 3, 5: with min_distance 4 only 1 and 5 survive.
        let data = [0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0];
        assert_eq!(find_peaks(&data, 4), vec![1, 5]);
    }

    #[test]
    fn test_periodic_signal_yields_expected_bpm() {
        // Apexes every 80 samples at 100 Hz: 60 * 100 / 80 = 75 bpm.
        let estimator = HeartRateEstimator::new(100, DEFAULT_SMOOTHING_WINDOW);
        let ir = triangle(800, 80);
        let bpm = estimator.estimate(&ir).unwrap();
        assert!((bpm - 75.0).abs() < 0.5, "bpm = {bpm}");
    }

    #[test]
    fn test_sub_spacing_peaks_are_thinned() {
        // A 30-sample period at 100 Hz is below the 60-sample exclusion
        // zone; every other apex is discarded, leaving 60-sample intervals.
        let estimator = HeartRateEstimator::new(100, DEFAULT_SMOOTHING_WINDOW);
        let ir = triangle(600, 30);
        let bpm = estimator.estimate(&ir).unwrap();
        assert!((bpm - 100.0).abs() < 0.5, "bpm = {bpm}");
    }

    #[test]
    fn test_fewer_than_two_peaks_is_absent() {
        let estimator = HeartRateEstimator::new(100, DEFAULT_SMOOTHING_WINDOW);

        // Flat line: no peaks at all.
        assert_eq!(estimator.estimate(&[1000.0; 256]), None);

        // Single apex: one peak is not an interval.
        let ir = triangle(80, 80);
        assert_eq!(estimator.estimate(&ir), None);

        // Degenerate inputs must not panic either.
        assert_eq!(estimator.estimate(&[]), None);
        assert_eq!(estimator.estimate(&[1.0, 2.0]), None);
    }
}
