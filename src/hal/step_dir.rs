//! STEP/DIR pulse output on plain GPIO pins.
//!
//! Works with any `embedded-hal` 1.0 [`OutputPin`] and [`DelayNs`]
//! implementation, so the same code drives an A4988/DRV8825/TMC2208 from the
//! ESP32 pins or from a test double.
//!
//! The ENABLE input of these drivers is active low.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{OutputPin, PinState};

use crate::traits::{StepDirection, StepOutput};

/// Default STEP high time in microseconds.
pub const DEFAULT_PULSE_US: u32 = 2;

/// STEP/DIR/ENABLE pins of a stepper driver chip.
///
/// All three pins must share an error type (true for `esp-idf-hal`
/// `PinDriver`s).
pub struct StepDirOutput<STEP, DIR, EN, D> {
    step: STEP,
    dir: DIR,
    enable: EN,
    delay: D,
    pulse_us: u32,
    last_direction: Option<StepDirection>,
    invert_dir: bool,
}

impl<STEP, DIR, EN, D, E> StepDirOutput<STEP, DIR, EN, D>
where
    STEP: OutputPin<Error = E>,
    DIR: OutputPin<Error = E>,
    EN: OutputPin<Error = E>,
    D: DelayNs,
{
    /// Wrap the driver pins. Outputs start disabled.
    pub fn new(mut step: STEP, dir: DIR, mut enable: EN, delay: D) -> Result<Self, E> {
        step.set_low()?;
        enable.set_high()?;
        Ok(Self {
            step,
            dir,
            enable,
            delay,
            pulse_us: DEFAULT_PULSE_US,
            last_direction: None,
            invert_dir: false,
        })
    }

    /// Set the STEP high time.
    pub fn with_pulse_us(mut self, pulse_us: u32) -> Self {
        self.pulse_us = pulse_us.max(1);
        self
    }

    /// Swap the meaning of DIR (motor wired the other way round).
    pub fn with_inverted_dir(mut self, invert: bool) -> Self {
        self.invert_dir = invert;
        self
    }

    fn dir_state(&self, direction: StepDirection) -> PinState {
        let forward = direction == StepDirection::Forward;
        PinState::from(forward != self.invert_dir)
    }
}

impl<STEP, DIR, EN, D, E> StepOutput for StepDirOutput<STEP, DIR, EN, D>
where
    STEP: OutputPin<Error = E>,
    DIR: OutputPin<Error = E>,
    EN: OutputPin<Error = E>,
    D: DelayNs,
{
    type Error = E;

    fn step(&mut self, direction: StepDirection) -> Result<(), E> {
        if self.last_direction != Some(direction) {
            self.dir.set_state(self.dir_state(direction))?;
            // DIR setup time before the STEP edge
            self.delay.delay_us(1);
            self.last_direction = Some(direction);
        }
        self.step.set_high()?;
        self.delay.delay_us(self.pulse_us);
        self.step.set_low()
    }

    fn set_enabled(&mut self, enabled: bool) -> Result<(), E> {
        self.enable.set_state(PinState::from(!enabled))
    }
}
