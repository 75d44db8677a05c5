//! Aggregated vitals and the MQTT wire payload.

use serde::Serialize;

use crate::temperature::TemperatureReading;

/// Offset added to the device's seconds-since-boot counter so published
/// timestamps land in the Unix epoch domain.
///
/// The RTC starts at zero (2000-01-01) on boot, so the result is
/// "year-2000 epoch plus uptime" — an approximation of wall-clock time,
/// not a synchronized clock.
pub const Y2K_EPOCH_OFFSET_SECS: u32 = 946_684_800;

/// Convert an uptime into the published timestamp domain.
pub fn boot_timestamp(uptime_secs: u32) -> u32 {
    Y2K_EPOCH_OFFSET_SECS.saturating_add(uptime_secs)
}

/// One complete set of derived vitals.
///
/// Only produced when every derived value is present; superseded wholesale
/// by the next aggregation cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthSnapshot {
    /// Unix-epoch seconds, see [`boot_timestamp`].
    pub timestamp: u32,
    /// Oxygen saturation, percent.
    pub spo2: f32,
    /// Heart rate, beats per minute.
    pub heart_rate: f32,
    pub temperature: TemperatureReading,
}

/// JSON body published to the broker:
///
/// ```json
/// {"timestamp":946684923,
///  "sensorData":{"spo2":98.2,"temperature":98.1,"heartrate":72.4},
///  "sensorID":"AA:BB:CC:DD:EE:FF"}
/// ```
#[derive(Debug, Serialize)]
pub struct TelemetryPayload<'a> {
    pub timestamp: u32,
    #[serde(rename = "sensorData")]
    pub sensor_data: SensorData,
    #[serde(rename = "sensorID")]
    pub sensor_id: &'a str,
}

/// The derived vitals as the broker consumers expect them.
#[derive(Debug, Serialize)]
pub struct SensorData {
    pub spo2: f32,
    /// Averaged object temperature, Fahrenheit.
    pub temperature: f32,
    pub heartrate: f32,
}

impl<'a> TelemetryPayload<'a> {
    /// Flatten a snapshot for the wire; `sensor_id` is the device MAC.
    pub fn new(snapshot: &HealthSnapshot, sensor_id: &'a str) -> Self {
        Self {
            timestamp: snapshot.timestamp,
            sensor_data: SensorData {
                spo2: snapshot.spo2,
                temperature: snapshot.temperature.object_f,
                heartrate: snapshot.heart_rate,
            },
            sensor_id,
        }
    }

    /// Serialize into `buf`, returning the written prefix.
    pub fn to_json<'b>(
        &self,
        buf: &'b mut [u8],
    ) -> Result<&'b [u8], serde_json_core::ser::Error> {
        let len = serde_json_core::to_slice(self, buf)?;
        Ok(&buf[..len])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boot_timestamp_applies_y2k_offset() {
        assert_eq!(boot_timestamp(0), 946_684_800);
        assert_eq!(boot_timestamp(123), 946_684_923);
        // Saturates instead of wrapping on absurd uptimes.
        assert_eq!(boot_timestamp(u32::MAX), u32::MAX);
    }

    #[test]
    fn test_payload_wire_shape() {
        let snapshot = HealthSnapshot {
            timestamp: 946_684_923,
            spo2: 98.5,
            heart_rate: 72.0,
            temperature: crate::temperature::TemperatureReading {
                ambient_c: 22.0,
                object_c: 37.0,
                ambient_f: 71.6,
                object_f: 98.6,
            },
        };

        let payload = TelemetryPayload::new(&snapshot, "AA:BB:CC:DD:EE:FF");
        let mut buf = [0u8; 256];
        let json = payload.to_json(&mut buf).unwrap();
        let json = core::str::from_utf8(json).unwrap();

        // Field names and nesting are the broker contract.
        assert!(json.starts_with("{\"timestamp\":946684923"), "{json}");
        assert!(json.contains("\"sensorData\":{\"spo2\":98.5"), "{json}");
        assert!(json.contains("\"temperature\":98.6"), "{json}");
        assert!(json.contains("\"heartrate\":72.0"), "{json}");
        assert!(json.contains("\"sensorID\":\"AA:BB:CC:DD:EE:FF\""), "{json}");
    }
}
