//! Door motor state machine.
//!
//! This module provides [`DoorController`], which drives a stepper actuator
//! between the closed and open positions and holds the door open for a fixed
//! time after an automatic open.
//!
//! # Overview
//!
//! ```text
//!          request_open            motion complete (auto)
//!   Idle ───────────────► Opening ───────────────────────► OpenHolding
//!    ▲                       │                                  │
//!    │                       │ motion complete (manual)         │ hold elapsed
//!    │                       ▼                                  ▼
//!    │                   ManualOpen ─── request_close ────►  Closing
//!    │                                                          │
//!    └──────────────────── motion complete ─────────────────────┘
//! ```
//!
//! A move that does not complete within the configured timeout, or an
//! injected fault, puts the door in `Error` until [`DoorController::clear_fault`].
//!
//! # Example
//!
//! ```rust
//! use barn_gate::door::{DoorController, DoorOutcome, DoorState};
//! use barn_gate::config::DoorConfig;
//! use barn_gate::hal::MockStepper;
//!
//! let stepper = MockStepper::new().with_steps_per_run(500);
//! let mut door = DoorController::new(stepper, DoorConfig::default()).unwrap();
//!
//! assert_eq!(door.request_open(false, 0).unwrap(), DoorOutcome::Accepted);
//! assert_eq!(door.status_label(), "opening");
//!
//! // update() must be called every tick
//! for tick in 0..4 {
//!     door.update(tick).unwrap();
//! }
//! assert_eq!(door.state(), DoorState::OpenHolding);
//!
//! // After the hold time the door closes on its own
//! door.update(3_003).unwrap();
//! assert_eq!(door.state(), DoorState::Closing);
//! ```

use core::fmt;

use tracing::{debug, error, info, warn};

use crate::config::DoorConfig;
use crate::traits::StepperDriver;

/// Door motor state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DoorState {
    /// Closed and at rest.
    #[default]
    Idle,
    /// Moving toward the open position.
    Opening,
    /// Open after an automatic request, waiting out the hold time.
    OpenHolding,
    /// Open after a manual request; stays open until closed manually.
    ManualOpen,
    /// Moving toward the closed position.
    Closing,
    /// Faulted; no motion until the fault is cleared.
    Error,
}

impl DoorState {
    /// Status label reported by the web API.
    pub const fn as_str(&self) -> &'static str {
        match self {
            DoorState::Idle => "closed",
            DoorState::Opening => "opening",
            DoorState::OpenHolding => "open",
            DoorState::ManualOpen => "manual_open",
            DoorState::Closing => "closing",
            DoorState::Error => "error",
        }
    }

    /// True while a move is in progress.
    pub const fn is_moving(&self) -> bool {
        matches!(self, DoorState::Opening | DoorState::Closing)
    }
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the door entered the `Error` state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FaultKind {
    /// A move did not complete within the move timeout.
    MoveTimeout,
    /// Fault reported from outside the controller (driver alarm, operator).
    External,
}

/// Why a door command was not carried out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RejectReason {
    /// The door is in a state that does not accept the command.
    Busy(DoorState),
    /// The door is faulted.
    Faulted,
    /// Close requested while already closed.
    AlreadyClosed,
}

/// Result of a door command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DoorOutcome {
    /// Command accepted; a move was started.
    Accepted,
    /// Command ignored; state unchanged.
    Rejected(RejectReason),
}

impl DoorOutcome {
    /// True if the command was accepted.
    pub const fn is_accepted(&self) -> bool {
        matches!(self, DoorOutcome::Accepted)
    }
}

/// Move and failure counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DoorStats {
    /// Accepted open requests.
    pub moves: u32,
    /// Moves that ended off-target, timed out, or were faulted.
    pub failures: u32,
}

/// Door state snapshot for UI/API.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DoorStatus {
    /// Current state.
    pub state: DoorState,
    /// Status label (see [`DoorState::as_str`]).
    pub label: &'static str,
    /// Current stepper position.
    pub position: i32,
    /// Commanded stepper target.
    pub target: i32,
    /// Manual hold flag.
    pub manual: bool,
    /// Active fault, if any.
    pub fault: Option<FaultKind>,
    /// Counters.
    pub stats: DoorStats,
}

/// Door motor controller.
///
/// Owns the stepper driver and the single authoritative [`DoorState`].
///
/// # Type Parameter
///
/// - `S`: The stepper driver implementation ([`StepperDriver`] trait)
///
/// # Thread Safety
///
/// The controller itself is not thread-safe. The motor loop and the web
/// service share it through `SharedGate` in the services module.
pub struct DoorController<S: StepperDriver> {
    stepper: S,
    config: DoorConfig,
    state: DoorState,
    manual: bool,
    move_started_ms: u64,
    hold_started_ms: u64,
    stats: DoorStats,
    fault: Option<FaultKind>,
}

impl<S: StepperDriver> DoorController<S> {
    /// Create a controller and apply the configured speed and acceleration.
    pub fn new(mut stepper: S, config: DoorConfig) -> Result<Self, S::Error> {
        stepper.set_max_speed(config.max_speed)?;
        stepper.set_acceleration(config.acceleration)?;
        Ok(Self {
            stepper,
            config,
            state: DoorState::Idle,
            manual: false,
            move_started_ms: 0,
            hold_started_ms: 0,
            stats: DoorStats::default(),
            fault: None,
        })
    }

    /// Start opening the door.
    ///
    /// Accepted only when closed (`Idle`) or held open manually; otherwise the
    /// request is logged and rejected without touching the state.
    pub fn request_open(&mut self, manual: bool, now_ms: u64) -> Result<DoorOutcome, S::Error> {
        match self.state {
            DoorState::Idle | DoorState::ManualOpen => {}
            DoorState::Error => {
                warn!(manual, "open rejected, door faulted");
                return Ok(DoorOutcome::Rejected(RejectReason::Faulted));
            }
            busy => {
                warn!(manual, state = busy.as_str(), "open rejected, door busy");
                return Ok(DoorOutcome::Rejected(RejectReason::Busy(busy)));
            }
        }

        self.stepper.move_to(self.config.open_position)?;
        self.manual = manual;
        self.state = DoorState::Opening;
        self.move_started_ms = now_ms;
        self.stats.moves += 1;
        info!(manual, moves = self.stats.moves, "door opening");
        Ok(DoorOutcome::Accepted)
    }

    /// Start closing the door.
    ///
    /// Accepted in every state except closed and faulted. Clears the manual
    /// hold.
    pub fn request_close(&mut self, now_ms: u64) -> Result<DoorOutcome, S::Error> {
        match self.state {
            DoorState::Idle => {
                debug!("close ignored, door already closed");
                return Ok(DoorOutcome::Rejected(RejectReason::AlreadyClosed));
            }
            DoorState::Error => {
                warn!("close rejected, door faulted");
                return Ok(DoorOutcome::Rejected(RejectReason::Faulted));
            }
            _ => {}
        }

        self.begin_close(now_ms)?;
        Ok(DoorOutcome::Accepted)
    }

    /// Advance the motor and run time/position driven transitions.
    ///
    /// Must be called every tick; the stepper only moves inside this call.
    pub fn update(&mut self, now_ms: u64) -> Result<DoorState, S::Error> {
        let moving = self.stepper.run()?;

        match self.state {
            DoorState::Opening | DoorState::Closing if moving => {
                let elapsed = now_ms.saturating_sub(self.move_started_ms);
                if self.config.move_timeout_ms > 0 && elapsed >= self.config.move_timeout_ms {
                    error!(
                        state = self.state.as_str(),
                        elapsed_ms = elapsed,
                        position = self.stepper.current_position(),
                        "door move timed out"
                    );
                    self.enter_fault(FaultKind::MoveTimeout)?;
                }
            }
            DoorState::Opening => {
                self.check_arrival(self.config.open_position);
                if self.manual {
                    self.state = DoorState::ManualOpen;
                    info!("door open, manual hold");
                } else {
                    self.state = DoorState::OpenHolding;
                    self.hold_started_ms = now_ms;
                    info!(hold_ms = self.config.hold_ms, "door open, holding");
                }
            }
            DoorState::OpenHolding => {
                if now_ms.saturating_sub(self.hold_started_ms) >= self.config.hold_ms {
                    self.begin_close(now_ms)?;
                }
            }
            DoorState::Closing => {
                self.check_arrival(self.config.closed_position);
                self.state = DoorState::Idle;
                info!("door closed");
            }
            DoorState::Idle | DoorState::ManualOpen | DoorState::Error => {}
        }

        Ok(self.state)
    }

    /// Put the door in the `Error` state and stop the motor.
    pub fn inject_fault(&mut self, kind: FaultKind) -> Result<(), S::Error> {
        error!(?kind, state = self.state.as_str(), "door fault");
        self.enter_fault(kind)
    }

    /// Leave the `Error` state.
    ///
    /// The manual hold is cleared. A door stopped at the closed position
    /// returns to `Idle`; anywhere else it starts `Closing`, so `Idle` always
    /// means shut. No-op unless faulted.
    pub fn clear_fault(&mut self, now_ms: u64) -> Result<DoorState, S::Error> {
        if self.state != DoorState::Error {
            return Ok(self.state);
        }
        let position = self.stepper.current_position();
        info!(fault = ?self.fault, position, "door fault cleared");
        self.fault = None;
        self.manual = false;
        if position == self.config.closed_position {
            self.state = DoorState::Idle;
        } else {
            self.begin_close(now_ms)?;
        }
        Ok(self.state)
    }

    /// True when the door can accept an automatic open.
    ///
    /// Closed counts as idle, and so does a manual hold (callers check
    /// [`is_manual_hold`](Self::is_manual_hold) separately).
    pub fn is_idle(&self) -> bool {
        matches!(self.state, DoorState::Idle | DoorState::ManualOpen)
    }

    /// True while a manual open is latched.
    pub fn is_manual_hold(&self) -> bool {
        self.manual
    }

    /// Status label for the web API.
    pub fn status_label(&self) -> &'static str {
        self.state.as_str()
    }

    /// Current state.
    pub fn state(&self) -> DoorState {
        self.state
    }

    /// Current stepper position.
    pub fn position(&self) -> i32 {
        self.stepper.current_position()
    }

    /// Move and failure counters.
    pub fn stats(&self) -> DoorStats {
        self.stats
    }

    /// Active fault, if any.
    pub fn fault(&self) -> Option<FaultKind> {
        self.fault
    }

    /// Check if there's an active fault
    pub fn has_fault(&self) -> bool {
        self.fault.is_some()
    }

    /// Configuration in use.
    pub fn config(&self) -> &DoorConfig {
        &self.config
    }

    /// Borrow the stepper driver.
    pub fn stepper(&self) -> &S {
        &self.stepper
    }

    /// Full snapshot for UI/API.
    pub fn status(&self) -> DoorStatus {
        DoorStatus {
            state: self.state,
            label: self.state.as_str(),
            position: self.stepper.current_position(),
            target: self.stepper.target_position(),
            manual: self.manual,
            fault: self.fault,
            stats: self.stats,
        }
    }

    fn begin_close(&mut self, now_ms: u64) -> Result<(), S::Error> {
        self.stepper.move_to(self.config.closed_position)?;
        self.manual = false;
        self.state = DoorState::Closing;
        self.move_started_ms = now_ms;
        info!("door closing");
        Ok(())
    }

    fn check_arrival(&mut self, expected: i32) {
        let actual = self.stepper.current_position();
        if actual != expected {
            self.stats.failures += 1;
            warn!(
                expected,
                actual,
                failures = self.stats.failures,
                "door stopped off target"
            );
        }
    }

    fn enter_fault(&mut self, kind: FaultKind) -> Result<(), S::Error> {
        self.stepper.stop()?;
        self.state = DoorState::Error;
        self.fault = Some(kind);
        self.manual = false;
        self.stats.failures += 1;
        Ok(())
    }
}

impl<S: StepperDriver> fmt::Debug for DoorController<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DoorController")
            .field("state", &self.state)
            .field("manual", &self.manual)
            .field("position", &self.stepper.current_position())
            .field("stats", &self.stats)
            .field("fault", &self.fault)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CLOSED_POSITION, OPEN_POSITION};
    use crate::hal::MockStepper;

    fn door() -> DoorController<MockStepper> {
        DoorController::new(
            MockStepper::new().with_steps_per_run(1000),
            DoorConfig::default(),
        )
        .unwrap()
    }

    fn settle(door: &mut DoorController<MockStepper>, now_ms: u64) {
        for _ in 0..10 {
            door.update(now_ms).unwrap();
        }
    }

    #[test]
    fn new_applies_motion_limits() {
        let config = DoorConfig::default().with_motion(321.0, 12.0);
        let door = DoorController::new(MockStepper::new(), config).unwrap();
        assert_eq!(door.stepper().max_speed, 321.0);
        assert_eq!(door.stepper().acceleration, 12.0);
        assert_eq!(door.state(), DoorState::Idle);
        assert!(!door.is_manual_hold());
    }

    #[test]
    fn labels() {
        assert_eq!(DoorState::Idle.as_str(), "closed");
        assert_eq!(DoorState::Opening.as_str(), "opening");
        assert_eq!(DoorState::OpenHolding.as_str(), "open");
        assert_eq!(DoorState::ManualOpen.as_str(), "manual_open");
        assert_eq!(DoorState::Closing.as_str(), "closing");
        assert_eq!(DoorState::Error.as_str(), "error");
    }

    #[test]
    fn auto_open_holds_then_closes() {
        let mut door = door();
        door.request_open(false, 0).unwrap();
        settle(&mut door, 10);
        assert_eq!(door.state(), DoorState::OpenHolding);
        assert_eq!(door.position(), OPEN_POSITION);

        door.update(3_009).unwrap();
        assert_eq!(door.state(), DoorState::OpenHolding);
        door.update(3_010).unwrap();
        assert_eq!(door.state(), DoorState::Closing);

        settle(&mut door, 3_020);
        assert_eq!(door.state(), DoorState::Idle);
        assert_eq!(door.position(), CLOSED_POSITION);
        assert_eq!(door.stats(), DoorStats { moves: 1, failures: 0 });
    }

    #[test]
    fn manual_open_stays_open() {
        let mut door = door();
        door.request_open(true, 0).unwrap();
        assert!(door.is_manual_hold());
        settle(&mut door, 10);
        assert_eq!(door.state(), DoorState::ManualOpen);

        door.update(1_000_000).unwrap();
        assert_eq!(door.state(), DoorState::ManualOpen);
        assert!(door.is_idle());
    }

    #[test]
    fn open_rejected_while_moving_or_holding() {
        let mut door = door();
        door.request_open(false, 0).unwrap();
        assert_eq!(
            door.request_open(true, 1).unwrap(),
            DoorOutcome::Rejected(RejectReason::Busy(DoorState::Opening))
        );

        settle(&mut door, 10);
        assert_eq!(
            door.request_open(false, 20).unwrap(),
            DoorOutcome::Rejected(RejectReason::Busy(DoorState::OpenHolding))
        );
        assert!(!door.is_manual_hold());
        assert_eq!(door.stats().moves, 1);
    }

    #[test]
    fn close_rejected_when_closed() {
        let mut door = door();
        assert_eq!(
            door.request_close(0).unwrap(),
            DoorOutcome::Rejected(RejectReason::AlreadyClosed)
        );
        assert_eq!(door.state(), DoorState::Idle);
    }

    #[test]
    fn close_clears_manual_flag() {
        let mut door = door();
        door.request_open(true, 0).unwrap();
        settle(&mut door, 10);
        assert!(door.request_close(20).unwrap().is_accepted());
        assert!(!door.is_manual_hold());
        assert_eq!(door.state(), DoorState::Closing);
    }

    #[test]
    fn drift_counts_failure_but_proceeds() {
        let stepper = MockStepper::new().with_steps_per_run(1000).with_lost_steps(3);
        let mut door = DoorController::new(stepper, DoorConfig::default()).unwrap();
        door.request_open(false, 0).unwrap();
        settle(&mut door, 10);
        assert_eq!(door.state(), DoorState::OpenHolding);
        assert_eq!(door.position(), OPEN_POSITION - 3);
        assert_eq!(door.stats().failures, 1);
    }

    #[test]
    fn move_timeout_faults() {
        let stepper = MockStepper::new().stalled();
        let config = DoorConfig::default().with_move_timeout_ms(100);
        let mut door = DoorController::new(stepper, config).unwrap();
        door.request_open(false, 0).unwrap();
        door.update(99).unwrap();
        assert_eq!(door.state(), DoorState::Opening);
        door.update(100).unwrap();
        assert_eq!(door.state(), DoorState::Error);
        assert_eq!(door.fault(), Some(FaultKind::MoveTimeout));
        assert_eq!(door.stepper().stop_count, 1);
        assert_eq!(door.status_label(), "error");
    }

    #[test]
    fn zero_timeout_never_faults() {
        let stepper = MockStepper::new().stalled();
        let config = DoorConfig::default().with_move_timeout_ms(0);
        let mut door = DoorController::new(stepper, config).unwrap();
        door.request_open(false, 0).unwrap();
        door.update(u64::MAX / 2).unwrap();
        assert_eq!(door.state(), DoorState::Opening);
    }

    #[test]
    fn fault_blocks_commands_until_cleared() {
        let mut door = door();
        door.request_open(true, 0).unwrap();
        door.inject_fault(FaultKind::External).unwrap();
        assert!(door.has_fault());
        assert!(!door.is_manual_hold());
        assert_eq!(
            door.request_open(false, 1).unwrap(),
            DoorOutcome::Rejected(RejectReason::Faulted)
        );
        assert_eq!(
            door.request_close(1).unwrap(),
            DoorOutcome::Rejected(RejectReason::Faulted)
        );

        assert_eq!(door.clear_fault(2).unwrap(), DoorState::Idle);
        assert!(!door.has_fault());
        assert!(door.request_open(false, 2).unwrap().is_accepted());
    }

    #[test]
    fn clear_fault_is_noop_when_healthy() {
        let mut door = door();
        door.request_open(false, 0).unwrap();
        assert_eq!(door.clear_fault(1).unwrap(), DoorState::Opening);
    }

    #[test]
    fn clear_fault_away_from_closed_starts_closing() {
        let mut door = door();
        door.request_open(true, 0).unwrap();
        door.update(0).unwrap();
        door.update(1).unwrap();
        assert_ne!(door.position(), CLOSED_POSITION);

        door.inject_fault(FaultKind::External).unwrap();
        assert_eq!(door.clear_fault(5).unwrap(), DoorState::Closing);
        assert_eq!(door.stepper().target, CLOSED_POSITION);
        assert!(!door.is_manual_hold());
    }

    #[test]
    fn status_snapshot() {
        let mut door = door();
        door.request_open(true, 0).unwrap();
        let status = door.status();
        assert_eq!(status.state, DoorState::Opening);
        assert_eq!(status.label, "opening");
        assert_eq!(status.target, OPEN_POSITION);
        assert!(status.manual);
        assert_eq!(status.fault, None);
        assert_eq!(status.stats.moves, 1);
    }
}
