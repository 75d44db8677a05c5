//! ESP32-S3 glue for the pulse-rs vitals sensor node.
//!
//! Everything algorithmically interesting lives in `pulse-core`; this crate
//! only wires it to the radio, the broker and the board peripherals.

#![no_std]

pub mod config;
pub mod mqtt;
pub mod rainbow;
pub mod wifi;
