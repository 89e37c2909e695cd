//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for all hardware traits, enabling
//! development and testing on desktop without the gate board.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockStepper`] | [`StepperDriver`] | Fixed steps per `run()`, optional lost steps or stall |
//! | [`MockStepOutput`] | [`StepOutput`] | Records STEP pulses |
//! | [`MockTagReader`] | [`TagReader`] | Tag held in the field until removed |
//! | [`MockClock`] | [`Clock`] | Controllable, shareable time source |
//!
//! # Example
//!
//! ```rust
//! use barn_gate::door::{DoorController, DoorState};
//! use barn_gate::config::DoorConfig;
//! use barn_gate::hal::MockStepper;
//!
//! let stepper = MockStepper::new().with_steps_per_run(2000);
//! let mut door = DoorController::new(stepper, DoorConfig::default()).unwrap();
//!
//! door.request_open(true, 0).unwrap();
//! door.update(0).unwrap();
//! assert_eq!(door.state(), DoorState::ManualOpen);
//! ```
//!
//! [`StepperDriver`]: crate::traits::StepperDriver
//! [`StepOutput`]: crate::traits::StepOutput
//! [`TagReader`]: crate::traits::TagReader
//! [`Clock`]: crate::traits::Clock

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::Cell;

use crate::traits::{Clock, StepDirection, StepOutput, StepperDriver, TagId, TagReader};

// ============================================================================
// Hardware Mocks
// ============================================================================

/// Mock stepper driver for testing.
///
/// Each `run()` moves a fixed number of steps toward the target. A move can
/// be made to stop short (lost steps) or never progress (stall). Use the
/// public fields to inspect state after test operations.
///
/// # Example
///
/// ```rust
/// use barn_gate::hal::MockStepper;
/// use barn_gate::traits::StepperDriver;
///
/// let mut stepper = MockStepper::new().with_steps_per_run(10).with_lost_steps(2);
/// stepper.move_to(25).unwrap();
///
/// assert!(stepper.run().unwrap());  // 10
/// assert!(stepper.run().unwrap());  // 20
/// assert!(!stepper.run().unwrap()); // 23, done (two steps lost)
/// assert_eq!(stepper.current_position(), 23);
/// assert_eq!(stepper.distance_to_go(), 2);
/// assert_eq!(stepper.run_count, 3);
/// ```
#[derive(Debug, Clone)]
pub struct MockStepper {
    /// Current position in steps.
    pub position: i32,
    /// Commanded target in steps.
    pub target: i32,
    /// Steps taken per `run()` call.
    pub steps_per_run: u32,
    /// Steps lost at the end of every move.
    pub lost_steps: u32,
    /// When set, `run()` reports motion without moving.
    pub stall: bool,
    /// Last configured max speed.
    pub max_speed: f32,
    /// Last configured acceleration.
    pub acceleration: f32,
    /// Number of `run()` calls.
    pub run_count: usize,
    /// Number of `stop()` calls.
    pub stop_count: usize,
    end: i32,
}

impl Default for MockStepper {
    fn default() -> Self {
        Self {
            position: 0,
            target: 0,
            steps_per_run: 50,
            lost_steps: 0,
            stall: false,
            max_speed: 0.0,
            acceleration: 0.0,
            run_count: 0,
            stop_count: 0,
            end: 0,
        }
    }
}

impl MockStepper {
    /// Creates a mock stepper at position 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how many steps each `run()` advances.
    pub fn with_steps_per_run(mut self, steps: u32) -> Self {
        self.steps_per_run = steps.max(1);
        self
    }

    /// Lose `steps` at the end of every move.
    pub fn with_lost_steps(mut self, steps: u32) -> Self {
        self.lost_steps = steps;
        self
    }

    /// Never make progress.
    pub fn stalled(mut self) -> Self {
        self.stall = true;
        self
    }

    /// True if the mock has reached the end of the current move.
    pub fn at_rest(&self) -> bool {
        !self.stall && self.position == self.end
    }
}

impl StepperDriver for MockStepper {
    type Error = ();

    fn set_max_speed(&mut self, steps_per_sec: f32) -> Result<(), ()> {
        self.max_speed = steps_per_sec;
        Ok(())
    }

    fn set_acceleration(&mut self, steps_per_sec2: f32) -> Result<(), ()> {
        self.acceleration = steps_per_sec2;
        Ok(())
    }

    fn move_to(&mut self, target: i32) -> Result<(), ()> {
        self.target = target;
        let travel = target - self.position;
        let lost = (self.lost_steps as i32).min(travel.abs());
        self.end = target - travel.signum() * lost;
        Ok(())
    }

    fn run(&mut self) -> Result<bool, ()> {
        self.run_count += 1;
        if self.stall {
            return Ok(true);
        }
        let remaining = self.end - self.position;
        let step = remaining.clamp(-(self.steps_per_run as i32), self.steps_per_run as i32);
        self.position += step;
        Ok(self.position != self.end)
    }

    fn stop(&mut self) -> Result<(), ()> {
        self.stop_count += 1;
        self.target = self.position;
        self.end = self.position;
        Ok(())
    }

    fn current_position(&self) -> i32 {
        self.position
    }

    fn target_position(&self) -> i32 {
        self.target
    }
}

/// Mock STEP/DIR output for testing.
///
/// Records every pulse; `position` tracks the net step count.
///
/// # Example
///
/// ```rust
/// use barn_gate::hal::MockStepOutput;
/// use barn_gate::traits::{StepDirection, StepOutput};
///
/// let mut output = MockStepOutput::new();
/// output.step(StepDirection::Forward).unwrap();
/// output.step(StepDirection::Forward).unwrap();
/// output.step(StepDirection::Backward).unwrap();
///
/// assert_eq!(output.pulses.len(), 3);
/// assert_eq!(output.position, 1);
/// ```
#[derive(Debug, Default)]
pub struct MockStepOutput {
    /// Every pulse emitted, in order.
    pub pulses: Vec<StepDirection>,
    /// Net position from emitted pulses.
    pub position: i32,
    /// Driver enable state.
    pub enabled: bool,
}

impl MockStepOutput {
    /// Creates a disabled output with no pulses.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StepOutput for MockStepOutput {
    type Error = ();

    fn step(&mut self, direction: StepDirection) -> Result<(), ()> {
        self.pulses.push(direction);
        self.position += direction.delta();
        Ok(())
    }

    fn set_enabled(&mut self, enabled: bool) -> Result<(), ()> {
        self.enabled = enabled;
        Ok(())
    }
}

/// Mock RFID reader for testing.
///
/// A tag placed with [`set_present`](Self::set_present) stays in the field,
/// and is returned by every read, until [`remove`](Self::remove).
///
/// # Example
///
/// ```rust
/// use barn_gate::hal::MockTagReader;
/// use barn_gate::traits::{TagId, TagReader};
///
/// let mut reader = MockTagReader::new();
/// assert_eq!(reader.read_tag().unwrap(), None);
///
/// let id = TagId::new([1, 2, 3, 4]);
/// reader.set_present(id);
/// assert_eq!(reader.read_tag().unwrap(), Some(id));
/// reader.acknowledge().unwrap();
/// assert_eq!(reader.read_tag().unwrap(), Some(id)); // still in the field
///
/// reader.remove();
/// assert_eq!(reader.read_tag().unwrap(), None);
/// assert_eq!(reader.reads, 4);
/// assert_eq!(reader.acks, 1);
/// ```
#[derive(Debug, Default, Clone)]
pub struct MockTagReader {
    /// Tag currently in the field.
    pub present: Option<TagId>,
    /// When set, reads fail.
    pub fail_reads: bool,
    /// Number of `read_tag()` calls.
    pub reads: usize,
    /// Number of `acknowledge()` calls.
    pub acks: usize,
}

impl MockTagReader {
    /// Creates a reader with an empty field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a tag in the field.
    pub fn set_present(&mut self, id: TagId) {
        self.present = Some(id);
    }

    /// Take the tag out of the field.
    pub fn remove(&mut self) {
        self.present = None;
    }
}

impl TagReader for MockTagReader {
    type Error = ();

    fn read_tag(&mut self) -> Result<Option<TagId>, ()> {
        self.reads += 1;
        if self.fail_reads {
            return Err(());
        }
        Ok(self.present)
    }

    fn acknowledge(&mut self) -> Result<(), ()> {
        self.acks += 1;
        Ok(())
    }
}

/// Mock clock for testing.
///
/// Allows manual control of time for testing time-dependent behavior.
/// Clones share the same time, so a test can keep one handle while another
/// is owned by the code under test.
///
/// # Example
///
/// ```rust
/// use barn_gate::hal::MockClock;
/// use barn_gate::traits::Clock;
///
/// let clock = MockClock::new();
/// let handle = clock.clone();
///
/// clock.set(1000);
/// handle.advance(500);
/// assert_eq!(clock.now_ms(), 1500);
///
/// clock.advance_us(250);
/// assert_eq!(handle.now_us(), 1_500_250);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockClock {
    current_us: Rc<Cell<u64>>,
}

impl MockClock {
    /// Creates a new mock clock starting at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the current time in milliseconds.
    pub fn set(&self, ms: u64) {
        self.current_us.set(ms * 1000);
    }

    /// Advances the clock by the given number of milliseconds.
    pub fn advance(&self, ms: u64) {
        self.advance_us(ms * 1000);
    }

    /// Advances the clock by the given number of microseconds.
    pub fn advance_us(&self, us: u64) {
        self.current_us.set(self.current_us.get() + us);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.current_us.get() / 1000
    }

    fn now_us(&self) -> u64 {
        self.current_us.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // MockStepper Tests
    // =========================================================================

    #[test]
    fn mock_stepper_default() {
        let stepper = MockStepper::new();
        assert_eq!(stepper.current_position(), 0);
        assert_eq!(stepper.target_position(), 0);
        assert_eq!(stepper.steps_per_run, 50);
        assert!(stepper.at_rest());
    }

    #[test]
    fn mock_stepper_reaches_target() {
        let mut stepper = MockStepper::new().with_steps_per_run(30);
        stepper.move_to(100).unwrap();
        let mut runs = 0;
        while stepper.run().unwrap() {
            runs += 1;
        }
        assert_eq!(runs, 3);
        assert_eq!(stepper.current_position(), 100);
        assert_eq!(stepper.distance_to_go(), 0);
    }

    #[test]
    fn mock_stepper_moves_backward() {
        let mut stepper = MockStepper::new().with_steps_per_run(1000);
        stepper.move_to(-40).unwrap();
        assert!(!stepper.run().unwrap());
        assert_eq!(stepper.current_position(), -40);
    }

    #[test]
    fn mock_stepper_run_at_rest_reports_idle() {
        let mut stepper = MockStepper::new();
        assert!(!stepper.run().unwrap());
        assert_eq!(stepper.run_count, 1);
    }

    #[test]
    fn mock_stepper_lost_steps_never_overshoot_start() {
        let mut stepper = MockStepper::new().with_lost_steps(10);
        stepper.move_to(4).unwrap();
        assert!(!stepper.run().unwrap());
        assert_eq!(stepper.current_position(), 0);
    }

    #[test]
    fn mock_stepper_stall_and_stop() {
        let mut stepper = MockStepper::new().stalled();
        stepper.move_to(100).unwrap();
        assert!(stepper.run().unwrap());
        assert_eq!(stepper.current_position(), 0);
        stepper.stop().unwrap();
        assert_eq!(stepper.stop_count, 1);
        assert_eq!(stepper.target_position(), 0);
    }

    #[test]
    fn mock_stepper_zero_steps_per_run_clamped() {
        let stepper = MockStepper::new().with_steps_per_run(0);
        assert_eq!(stepper.steps_per_run, 1);
    }

    // =========================================================================
    // MockStepOutput Tests
    // =========================================================================

    #[test]
    fn mock_step_output_enable() {
        let mut output = MockStepOutput::new();
        assert!(!output.enabled);
        output.set_enabled(true).unwrap();
        assert!(output.enabled);
    }

    // =========================================================================
    // MockTagReader Tests
    // =========================================================================

    #[test]
    fn mock_reader_failure() {
        let mut reader = MockTagReader::new();
        reader.fail_reads = true;
        assert_eq!(reader.read_tag(), Err(()));
        assert_eq!(reader.reads, 1);
    }

    // =========================================================================
    // MockClock Tests
    // =========================================================================

    #[test]
    fn mock_clock_default() {
        let clock = MockClock::default();
        assert_eq!(clock.now_ms(), 0);
        assert_eq!(clock.now_us(), 0);
    }

    #[test]
    fn mock_clock_sub_millisecond() {
        let clock = MockClock::new();
        clock.advance_us(999);
        assert_eq!(clock.now_ms(), 0);
        clock.advance_us(1);
        assert_eq!(clock.now_ms(), 1);
    }
}
