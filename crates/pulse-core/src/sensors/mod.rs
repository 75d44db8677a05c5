//! Sensor collaborator contracts and their I2C drivers.
//!
//! The orchestrator only sees the [`PpgSensor`] and [`Thermometer`] traits;
//! the MAX30102 and MLX90614 drivers below implement them against
//! `embedded-hal-async`, and tests substitute fakes.

mod max30102;
mod mlx90614;

pub use max30102::Max30102;
pub use mlx90614::Mlx90614;

use core::future::Future;
use thiserror_no_std::Error;

/// Errors surfaced by the sensor collaborators.
///
/// Per-read failures are recoverable: the orchestrator logs them and skips
/// that channel's contribution for the tick. Setup failures are fatal at
/// boot.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// I2C transaction failed.
    #[error("{sensor}: I2C bus error during {operation}")]
    Bus {
        sensor: &'static str,
        operation: &'static str,
    },
    /// The device answered, but the data is unusable.
    #[error("{sensor}: invalid reading ({details})")]
    InvalidReading {
        sensor: &'static str,
        details: &'static str,
    },
    /// Probe found a different part on the expected address.
    #[error("{sensor}: unexpected part id {found:#04x}")]
    WrongDevice { sensor: &'static str, found: u8 },
}

/// Pulse-oximeter front end: paired Red/IR photoplethysmography channels.
///
/// Implementations buffer samples internally. `poll` drains whatever the
/// hardware has ready without blocking; the `pop_*` reads are destructive
/// and return `None` once the internal storage is drained.
pub trait PpgSensor {
    /// Move any samples the hardware has ready into internal storage.
    fn poll(&mut self) -> impl Future<Output = Result<(), SensorError>>;

    /// Whether a paired Red/IR sample is ready to pop.
    fn available(&self) -> bool;

    /// Consume the oldest buffered Red sample.
    fn pop_red(&mut self) -> Option<u32>;

    /// Consume the oldest buffered IR sample.
    fn pop_ir(&mut self) -> Option<u32>;

    /// Put the sensor into its low-power shutdown state.
    fn shutdown(&mut self) -> impl Future<Output = Result<(), SensorError>>;
}

/// Non-contact infrared thermometer.
///
/// Both reads are instantaneous and individually fallible; a failed read
/// means "no value this tick", not a dead sensor.
pub trait Thermometer {
    /// Ambient (die) temperature, °C.
    fn ambient_temperature(&mut self) -> impl Future<Output = Result<f32, SensorError>>;

    /// Object (target) temperature, °C.
    fn object_temperature(&mut self) -> impl Future<Output = Result<f32, SensorError>>;
}
