//! MLX90614 infrared thermometer driver.
//!
//! Reads the linearized ambient and object temperatures from RAM. Words
//! come back LSB-first with a trailing PEC byte; a set MSB flags an invalid
//! measurement.

use super::{SensorError, Thermometer};
use embedded_hal_async::i2c::I2c;

/// Factory-default 7-bit bus address.
pub const ADDRESS: u8 = 0x5A;

const SENSOR: &str = "MLX90614";

/// RAM cell: ambient (die) temperature.
const RAM_TA: u8 = 0x06;
/// RAM cell: object temperature, primary IR channel.
const RAM_TOBJ1: u8 = 0x07;

/// Error flag in the raw temperature word.
const FLAG_INVALID: u16 = 0x8000;

/// Raw words are fiftieths of a Kelvin.
const KELVIN_PER_LSB: f32 = 0.02;
const ZERO_CELSIUS_IN_KELVIN: f32 = 273.15;

pub struct Mlx90614<I> {
    i2c: I,
}

impl<I: I2c> Mlx90614<I> {
    pub const fn new(i2c: I) -> Self {
        Self { i2c }
    }

    async fn read_temperature(&mut self, ram_cell: u8) -> Result<f32, SensorError> {
        let mut word = [0u8; 3];
        self.i2c
            .write_read(ADDRESS, &[ram_cell], &mut word)
            .await
            .map_err(|_| SensorError::Bus {
                sensor: SENSOR,
                operation: "RAM read",
            })?;

        let raw = u16::from_le_bytes([word[0], word[1]]);
        if raw & FLAG_INVALID != 0 {
            return Err(SensorError::InvalidReading {
                sensor: SENSOR,
                details: "error flag set in temperature word",
            });
        }

        Ok(f32::from(raw) * KELVIN_PER_LSB - ZERO_CELSIUS_IN_KELVIN)
    }
}

impl<I: I2c> Thermometer for Mlx90614<I> {
    async fn ambient_temperature(&mut self) -> Result<f32, SensorError> {
        self.read_temperature(RAM_TA).await
    }

    async fn object_temperature(&mut self) -> Result<f32, SensorError> {
        self.read_temperature(RAM_TOBJ1).await
    }
}
