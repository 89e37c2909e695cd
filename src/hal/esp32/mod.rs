//! ESP32 gate board hardware abstraction layer.
//!
//! # Hardware Configuration
//!
//! - **MCU**: ESP32 (dual core, Xtensa LX6)
//! - **Door**: NEMA17 stepper on an A4988/DRV8825 STEP/DIR driver
//! - **Readers**: two MFRC522 (RC522) modules on one SPI bus, entry and exit
//!
//! # Pin Assignments
//!
//! See the [`pins`] module.

mod clock;
mod rfid;
mod task;

pub use clock::EspClock;
pub use rfid::{Esp32Rfid, RfidError};
pub use task::{spawn_motor_task_pinned, spawn_on_core, Core, MOTOR_PRIORITY, MOTOR_STACK_KB};

#[cfg(feature = "wifi")]
mod wifi;
#[cfg(feature = "wifi")]
pub use wifi::Esp32Wifi;

#[cfg(feature = "esp32-http")]
mod http;
#[cfg(feature = "esp32-http")]
pub use http::Esp32HttpServer;

use esp_idf_hal::delay::Ets;
use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};
use esp_idf_hal::sys::EspError;

use crate::hal::StepDirOutput;
use crate::stepper::RampedStepper;

/// Output pin driver used for STEP, DIR and ENABLE.
pub type OutPin = PinDriver<'static, AnyOutputPin, Output>;

/// STEP/DIR driver pins with the busy-wait ROM delay for pulse timing.
pub type Esp32StepOutput = StepDirOutput<OutPin, OutPin, OutPin, Ets>;

/// The door stepper as used by the firmware.
pub type Esp32Stepper = RampedStepper<Esp32StepOutput, EspClock>;

/// Build the door stepper from the three driver pins.
///
/// # Errors
///
/// Returns an error if a pin cannot be configured as output.
pub fn door_stepper(
    step: AnyOutputPin,
    dir: AnyOutputPin,
    enable: AnyOutputPin,
) -> Result<Esp32Stepper, EspError> {
    let output = StepDirOutput::new(
        PinDriver::output(step)?,
        PinDriver::output(dir)?,
        PinDriver::output(enable)?,
        Ets,
    )?;
    Ok(RampedStepper::new(output, EspClock::new()))
}

/// Pin assignments for the gate board.
pub mod pins {
    // =========================================================================
    // Stepper Driver (A4988 / DRV8825)
    // =========================================================================

    /// STEP pulse output
    pub const STEP: i32 = 25;

    /// DIR output (high = toward open)
    pub const DIR: i32 = 26;

    /// ENABLE output, active low
    pub const ENABLE: i32 = 27;

    // =========================================================================
    // RFID Readers (MFRC522, shared SPI bus)
    // =========================================================================

    /// SPI clock
    pub const SPI_SCK: i32 = 18;

    /// SPI MISO
    pub const SPI_MISO: i32 = 19;

    /// SPI MOSI
    pub const SPI_MOSI: i32 = 23;

    /// Entry reader chip select (outside the barn)
    pub const ENTRY_CS: i32 = 5;

    /// Exit reader chip select (inside the barn)
    pub const EXIT_CS: i32 = 17;

    /// Shared reset line of both readers
    pub const RFID_RST: i32 = 22;

    /// SPI clock for the readers in Hz (MFRC522 max is 10 MHz)
    pub const SPI_BAUD_HZ: u32 = 4_000_000;
}
