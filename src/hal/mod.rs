//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`] for various platforms.
//!
//! # Available Implementations
//!
//! - `mock`: Test implementations for desktop development
//! - `step_dir`: STEP/DIR pulse output on any `embedded-hal` pins
//! - `system`: `std::time::Instant` clock (requires `std` feature)
//! - `esp32`: ESP32 gate board with two MFRC522 readers and a STEP/DIR
//!   driver (requires `esp32` feature)

pub mod mock;
pub mod step_dir;

#[cfg(feature = "std")]
pub mod system;

#[cfg(feature = "esp32")]
pub mod esp32;

pub use mock::*;
pub use step_dir::StepDirOutput;

#[cfg(feature = "std")]
pub use system::SystemClock;
