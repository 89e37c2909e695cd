//! Software trapezoidal ramp for STEP/DIR stepper drivers.
//!
//! [`RampedStepper`] implements [`StepperDriver`] on top of any
//! [`StepOutput`]: each call to `run()` emits at most one step, and only when
//! the interval for the current speed has elapsed. Speed grows by the
//! configured acceleration after every step until the remaining distance
//! equals the stopping distance, then shrinks symmetrically.
//!
//! ```text
//! speed
//!   ▲      ____________
//!   │     /            \
//!   │    /              \
//!   │   /                \
//!   └──┴──────────────────┴──► steps
//! ```
//!
//! Speed is tracked as steps per second; with `v` the current speed and `a`
//! the acceleration, one step changes `v²` by `2a`.
//!
//! # Example
//!
//! ```rust
//! use barn_gate::hal::{MockClock, MockStepOutput};
//! use barn_gate::stepper::RampedStepper;
//! use barn_gate::traits::StepperDriver;
//!
//! let clock = MockClock::new();
//! let mut stepper = RampedStepper::new(MockStepOutput::new(), clock.clone());
//! stepper.set_max_speed(1000.0).unwrap();
//! stepper.set_acceleration(4000.0).unwrap();
//! stepper.move_to(50).unwrap();
//!
//! while stepper.run().unwrap() {
//!     clock.advance_us(100);
//! }
//! assert_eq!(stepper.current_position(), 50);
//! assert_eq!(stepper.output().position, 50);
//! ```

use tracing::{debug, trace};

use crate::traits::{Clock, StepDirection, StepOutput, StepperDriver};

/// Lowest acceleration accepted, in steps per second squared.
const MIN_ACCELERATION: f32 = 1.0;

/// Trapezoidal-ramp stepper driver.
pub struct RampedStepper<O: StepOutput, C: Clock> {
    output: O,
    clock: C,
    position: i32,
    target: i32,
    direction: StepDirection,
    speed: f32,
    max_speed: f32,
    acceleration: f32,
    last_step_us: u64,
}

impl<O: StepOutput, C: Clock> RampedStepper<O, C> {
    /// Create a stepper at position 0, at rest.
    pub fn new(output: O, clock: C) -> Self {
        Self {
            output,
            clock,
            position: 0,
            target: 0,
            direction: StepDirection::Forward,
            speed: 0.0,
            max_speed: 1.0,
            acceleration: MIN_ACCELERATION,
            last_step_us: 0,
        }
    }

    /// Current speed in steps per second (always non-negative).
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Direction of the last step.
    pub fn direction(&self) -> StepDirection {
        self.direction
    }

    /// Borrow the pulse output.
    pub fn output(&self) -> &O {
        &self.output
    }

    /// Disable the driver outputs. Coils are re-enabled on the next step.
    pub fn release(&mut self) -> Result<(), O::Error> {
        self.speed = 0.0;
        self.target = self.position;
        self.output.set_enabled(false)
    }

    /// Interval until the next step at the current speed.
    fn step_interval_us(&self) -> u64 {
        if self.speed <= 0.0 {
            0
        } else {
            (1_000_000.0 / self.speed) as u64
        }
    }

    /// Steps needed to decelerate to rest from the current speed.
    fn stopping_distance(&self) -> f32 {
        (self.speed * self.speed) / (2.0 * self.acceleration)
    }

    fn next_speed(&self, remaining: i32) -> f32 {
        let heading_away = StepDirection::toward(remaining) != Some(self.direction);
        let v2 = self.speed * self.speed;
        if heading_away || self.stopping_distance() >= remaining.unsigned_abs() as f32 {
            let slower = v2 - 2.0 * self.acceleration;
            if slower > 0.0 {
                slower.sqrt()
            } else {
                0.0
            }
        } else {
            let faster = v2 + 2.0 * self.acceleration;
            faster.min(self.max_speed * self.max_speed).sqrt()
        }
    }
}

impl<O: StepOutput, C: Clock> StepperDriver for RampedStepper<O, C> {
    type Error = O::Error;

    fn set_max_speed(&mut self, steps_per_sec: f32) -> Result<(), O::Error> {
        self.max_speed = steps_per_sec.abs().max(1.0);
        if self.speed > self.max_speed {
            self.speed = self.max_speed;
        }
        Ok(())
    }

    fn set_acceleration(&mut self, steps_per_sec2: f32) -> Result<(), O::Error> {
        self.acceleration = steps_per_sec2.abs().max(MIN_ACCELERATION);
        Ok(())
    }

    fn move_to(&mut self, target: i32) -> Result<(), O::Error> {
        if target != self.target {
            debug!(from = self.position, to = target, "stepper target");
        }
        self.target = target;
        Ok(())
    }

    fn run(&mut self) -> Result<bool, O::Error> {
        let distance = self.target - self.position;
        if distance == 0 && self.speed == 0.0 {
            return Ok(false);
        }

        let now = self.clock.now_us();
        if self.speed > 0.0 && now.saturating_sub(self.last_step_us) < self.step_interval_us() {
            return Ok(true);
        }

        if self.speed == 0.0 {
            // Starting from rest: head toward the target and energise.
            match StepDirection::toward(distance) {
                Some(direction) => self.direction = direction,
                None => return Ok(false),
            }
            self.output.set_enabled(true)?;
        }

        self.output.step(self.direction)?;
        self.position += self.direction.delta();
        self.last_step_us = now;

        let remaining = self.target - self.position;
        self.speed = if remaining == 0 {
            0.0
        } else {
            self.next_speed(remaining)
        };
        trace!(position = self.position, speed = self.speed, "step");

        Ok(remaining != 0 || self.speed > 0.0)
    }

    fn stop(&mut self) -> Result<(), O::Error> {
        if self.speed == 0.0 {
            self.target = self.position;
            return Ok(());
        }
        let steps = self.stopping_distance() as i32 + 1;
        self.target = self.position + self.direction.delta() * steps;
        debug!(position = self.position, target = self.target, "stepper stopping");
        Ok(())
    }

    fn current_position(&self) -> i32 {
        self.position
    }

    fn target_position(&self) -> i32 {
        self.target
    }
}
