//! Trait definitions for hardware abstraction.
//!
//! This module defines the core abstractions that allow barn-gate to:
//! - Run on different hardware (ESP32, desktop mock)
//! - Drive the door through any ramped stepper implementation
//! - Read tags from any RFID reader driver
//!
//! # Hardware Abstraction
//!
//! The key hardware traits are:
//!
//! - [`StepperDriver`]: Ramped stepper actuator with absolute targets
//! - [`StepOutput`]: STEP/DIR pulse output used by the software ramp
//! - [`TagReader`]: RFID reader with read/acknowledge handshake
//! - [`Clock`]: Time source for `no_std` environments

pub mod hardware;

pub use hardware::*;
