//! Body-temperature aggregation.
//!
//! Object temperature is smoothed over the same fixed window as the PPG
//! channels; ambient temperature is reported instantaneously. Both come out
//! in Celsius and Fahrenheit.

/// `F = C * 1.8 + 32`
pub fn celsius_to_fahrenheit(celsius: f32) -> f32 {
    celsius * 1.8 + 32.0
}

/// One aggregated temperature reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureReading {
    /// Instantaneous ambient (die) temperature, °C.
    pub ambient_c: f32,
    /// Object temperature averaged over the sample window, °C.
    pub object_c: f32,
    pub ambient_f: f32,
    pub object_f: f32,
}

impl TemperatureReading {
    /// Aggregate a full object-temperature window against the latest
    /// ambient reading. `None` for an empty window.
    pub fn from_window(ambient_c: f32, object_window: &[f32]) -> Option<Self> {
        if object_window.is_empty() {
            return None;
        }

        let object_c = object_window.iter().sum::<f32>() / object_window.len() as f32;
        Some(Self {
            ambient_c,
            object_c,
            ambient_f: celsius_to_fahrenheit(ambient_c),
            object_f: celsius_to_fahrenheit(object_c),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_fahrenheit_fixed_points() {
        assert_eq!(celsius_to_fahrenheit(0.0), 32.0);
        assert_eq!(celsius_to_fahrenheit(100.0), 212.0);
        assert!((celsius_to_fahrenheit(37.0) - 98.6).abs() < 1e-4);
    }

    #[test]
    fn test_window_average() {
        let window = vec![36.0, 36.5, 37.0, 37.5];
        let reading = TemperatureReading::from_window(22.0, &window).unwrap();
        assert!((reading.object_c - 36.75).abs() < 1e-5);
        assert_eq!(reading.ambient_c, 22.0);
        assert!((reading.object_f - celsius_to_fahrenheit(36.75)).abs() < 1e-4);
        assert_eq!(reading.ambient_f, celsius_to_fahrenheit(22.0));
    }

    #[test]
    fn test_empty_window_is_absent() {
        assert_eq!(TemperatureReading::from_window(22.0, &[]), None);
    }
}
