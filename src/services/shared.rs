//! Shared gate state for the motor loop and the web services.
//!
//! `SharedGate` owns the occupancy set and the door controller, each behind
//! its own lock, plus the time base every context uses.
//!
//! # Lock Discipline
//!
//! - Locks are held for a single read or mutation, never across reader I/O
//!   or `.await` points (the closure accessors enforce this).
//! - When both are needed they are taken in the fixed order
//!   occupancy → door.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use barn_gate::config::DoorConfig;
//! use barn_gate::door::DoorController;
//! use barn_gate::hal::MockStepper;
//! use barn_gate::services::SharedGate;
//!
//! let door = DoorController::new(MockStepper::new(), DoorConfig::default()).unwrap();
//! let gate = Arc::new(SharedGate::new(door));
//!
//! // Web service reads snapshots
//! let status = gate.status();
//! assert_eq!(status.count, 0);
//! assert_eq!(status.door_status, "closed");
//!
//! // Motor loop drives the door
//! let now_ms = gate.now_ms();
//! gate.update_door(now_ms).unwrap();
//! ```

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::warn;

use crate::dispatcher::{apply_access_event, AccessEvent, EventReport};
use crate::door::{DoorController, DoorOutcome, DoorState, DoorStatus};
use crate::occupancy::BarnOccupancy;
use crate::traits::StepperDriver;

use super::api::GateStatus;

// ============================================================================
// Gate Provider Trait
// ============================================================================

/// Access to gate state for the status service.
///
/// This abstraction lets the desktop and ESP32 HTTP servers share one
/// handler, and lets tests substitute a canned gate.
pub trait GateProvider: Send + Sync {
    /// Current occupancy and door label.
    fn status(&self) -> GateStatus;

    /// Current timestamp in milliseconds.
    fn now_ms(&self) -> u64;

    /// Ask the door to open.
    fn request_open(&self, manual: bool) -> Result<DoorOutcome, ()>;

    /// Ask the door to close.
    fn request_close(&self) -> Result<DoorOutcome, ()>;
}

// ============================================================================
// Shared Gate
// ============================================================================

/// Thread-safe owner of the occupancy set and the door controller.
///
/// # Thread Safety
///
/// - Occupancy and door have separate locks so a status read never waits on
///   a door update longer than one `update()` call.
/// - Uses `Mutex` (not `RwLock`) because the motor loop writes the door on
///   every tick.
/// - All timestamps derive from the same `start_time`.
pub struct SharedGate<S: StepperDriver> {
    occupancy: Mutex<BarnOccupancy>,
    door: Mutex<DoorController<S>>,
    start_time: Instant,
}

impl<S: StepperDriver> SharedGate<S> {
    /// Create shared state around a door controller with an empty barn.
    ///
    /// The `start_time` is set to `Instant::now()`, which becomes the time
    /// base for every `now_ms()` call.
    pub fn new(door: DoorController<S>) -> Self {
        Self {
            occupancy: Mutex::new(BarnOccupancy::new()),
            door: Mutex::new(door),
            start_time: Instant::now(),
        }
    }

    /// Milliseconds since creation.
    #[inline]
    pub fn now_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    /// Microseconds since creation.
    #[inline]
    pub fn now_us(&self) -> u64 {
        self.start_time.elapsed().as_micros() as u64
    }

    /// The time base instant.
    #[inline]
    pub fn start_time(&self) -> Instant {
        self.start_time
    }

    /// Access the door controller under its lock.
    pub fn with_door<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut DoorController<S>) -> R,
    {
        let mut guard = self.door.lock();
        f(&mut *guard)
    }

    /// Access the occupancy set under its lock.
    pub fn with_occupancy<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut BarnOccupancy) -> R,
    {
        let mut guard = self.occupancy.lock();
        f(&mut *guard)
    }

    /// Consistent snapshot of occupancy and door label.
    pub fn status(&self) -> GateStatus {
        let occupancy = self.occupancy.lock();
        let door = self.door.lock();
        GateStatus::new(occupancy.iter(), door.status_label())
    }

    /// Full door snapshot.
    pub fn door_status(&self) -> DoorStatus {
        self.door.lock().status()
    }

    /// Advance the door by one tick.
    pub fn update_door(&self, now_ms: u64) -> Result<DoorState, S::Error> {
        self.door.lock().update(now_ms)
    }

    /// True if the door reports idle (closed or manually held open).
    pub fn door_is_idle(&self) -> bool {
        self.door.lock().is_idle()
    }

    /// Apply an access event to occupancy and door under both locks.
    pub fn apply_event(&self, event: &AccessEvent, now_ms: u64) -> Result<EventReport, S::Error> {
        let mut occupancy = self.occupancy.lock();
        let mut door = self.door.lock();
        apply_access_event(event, &mut *occupancy, &mut *door, now_ms)
    }

    /// Manual or automatic open request.
    pub fn request_open(&self, manual: bool) -> Result<DoorOutcome, S::Error> {
        let now_ms = self.now_ms();
        self.door.lock().request_open(manual, now_ms)
    }

    /// Close request.
    pub fn request_close(&self) -> Result<DoorOutcome, S::Error> {
        let now_ms = self.now_ms();
        self.door.lock().request_close(now_ms)
    }
}

// ============================================================================
// GateProvider Implementation for Arc<SharedGate>
// ============================================================================

impl<S: StepperDriver + Send + 'static> GateProvider for Arc<SharedGate<S>> {
    fn status(&self) -> GateStatus {
        SharedGate::status(self)
    }

    fn now_ms(&self) -> u64 {
        SharedGate::now_ms(self)
    }

    fn request_open(&self, manual: bool) -> Result<DoorOutcome, ()> {
        SharedGate::request_open(self, manual).map_err(|_| {
            warn!("stepper error on open");
        })
    }

    fn request_close(&self) -> Result<DoorOutcome, ()> {
        SharedGate::request_close(self).map_err(|_| {
            warn!("stepper error on close");
        })
    }
}
