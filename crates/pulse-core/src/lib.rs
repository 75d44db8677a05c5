//! Hardware-independent core library for pulse-rs
//!
//! This crate contains all platform-agnostic logic for the pulse vitals
//! sensor node: the sample windows, the SpO2/heart-rate/temperature
//! estimators, the sampling orchestrator, the sensor collaborator traits
//! with their I2C drivers, and the MQTT telemetry payload.
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! embedded targets (ESP32-S3) and desktop hosts (for the simulator and
//! tests).

#![no_std]

extern crate alloc;

pub mod buffer;
pub mod bus;
pub mod config;
pub mod heart_rate;
pub mod monitor;
pub mod sensors;
pub mod spo2;
pub mod telemetry;
pub mod temperature;
