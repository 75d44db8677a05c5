//! SpO2 estimation from paired IR/Red PPG windows.
//!
//! Uses the ratio-of-ratios method: the pulsatile (AC) over mean (DC)
//! perfusion of the Red channel relative to the IR channel maps onto an
//! oxygen saturation percentage through a linear calibration curve.

/// Calibration intercept for `spo2 = OFFSET - SLOPE * ratio`.
///
/// These constants come from empirical calibration of the MAX3010x family
/// and are an approximation, not a physiologically exact model.
const CALIBRATION_OFFSET: f32 = 110.0;

/// Calibration slope, see [`CALIBRATION_OFFSET`].
const CALIBRATION_SLOPE: f32 = 25.0;

/// Pulsatile swing (max - min) and mean level of one PPG channel.
fn ac_dc(series: &[f32]) -> (f32, f32) {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    let mut sum = 0.0f32;
    for &sample in series {
        min = min.min(sample);
        max = max.max(sample);
        sum += sample;
    }
    (max - min, sum / series.len() as f32)
}

/// Estimate oxygen saturation from same-length IR and Red sample windows.
///
/// Returns `None` for an empty window or when either channel's DC component
/// is not positive (a dark or saturated channel carries no usable signal and
/// would divide by zero). The result is clamped to `0.0..=100.0`.
pub fn estimate(ir: &[f32], red: &[f32]) -> Option<f32> {
    if ir.is_empty() || red.is_empty() {
        return None;
    }

    let (ir_ac, ir_dc) = ac_dc(ir);
    let (red_ac, red_dc) = ac_dc(red);

    if ir_dc <= 0.0 || red_dc <= 0.0 {
        return None;
    }

    let ir_perfusion = ir_ac / ir_dc;
    let red_perfusion = red_ac / red_dc;

    // A flat IR channel has no pulsatile information to normalize against;
    // the ratio degenerates to zero rather than dividing by zero.
    let ratio = if ir_perfusion == 0.0 {
        0.0
    } else {
        red_perfusion / ir_perfusion
    };

    let spo2 = CALIBRATION_OFFSET - CALIBRATION_SLOPE * ratio;
    Some(spo2.clamp(0.0, 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    #[test]
    fn test_zero_variance_clamps_to_full_saturation() {
        // ac = 0 on both channels with a positive dc: ratio 0 gives the
        // calibration intercept 110, clamped to 100.
        let flat = vec![1000.0; 16];
        let spo2 = estimate(&flat, &flat).unwrap();
        assert_eq!(spo2, 100.0);
    }

    #[test]
    fn test_non_positive_dc_is_absent() {
        let zeros = vec![0.0; 16];
        let signal = vec![1.0, 2.0, 3.0, 2.0];
        assert_eq!(estimate(&zeros, &signal), None);
        assert_eq!(estimate(&signal, &zeros), None);

        let negative = vec![-5.0; 16];
        assert_eq!(estimate(&negative, &signal), None);
    }

    #[test]
    fn test_empty_window_is_absent() {
        assert_eq!(estimate(&[], &[1.0]), None);
        assert_eq!(estimate(&[1.0], &[]), None);
    }

    #[test]
    fn test_known_ratio() {
        // IR swings 90..110 around dc 100 (perfusion 0.2); Red swings
        // 99..101 around dc 100 (perfusion 0.02). Ratio = 0.1, so
        // spo2 = 110 - 25 * 0.1 = 107.5, clamped to 100.
        let ir: Vec<f32> = vec![90.0, 100.0, 110.0, 100.0];
        let red: Vec<f32> = vec![99.0, 100.0, 101.0, 100.0];
        assert_eq!(estimate(&ir, &red), Some(100.0));

        // A larger red swing pulls the estimate down:
        // red perfusion 0.2 / ir perfusion 0.2 = 1.0 -> 110 - 25 = 85.
        let red_strong: Vec<f32> = vec![90.0, 100.0, 110.0, 100.0];
        let spo2 = estimate(&ir, &red_strong).unwrap();
        assert!((spo2 - 85.0).abs() < 1e-4);
    }

    #[test]
    fn test_result_clamped_to_valid_percentage() {
        // Red perfusion 10x the IR perfusion: 110 - 250 < 0, clamped to 0.
        let ir: Vec<f32> = vec![99.0, 100.0, 101.0, 100.0];
        let red: Vec<f32> = vec![90.0, 100.0, 110.0, 100.0];
        assert_eq!(estimate(&ir, &red), Some(0.0));
    }
}
