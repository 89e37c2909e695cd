//! # barn-gate
//!
//! An RFID livestock gate: a stepper-driven door, entry and exit tag
//! readers, barn occupancy tracking, and a small local web API.
//!
//! ## Features
//!
//! - **Door state machine**: open on an authorized tag, hold, close on its
//!   own; manual open and close from the web page
//! - **Occupancy**: who is inside, in order of entry, bounded capacity
//! - **Presence edges**: a tag resting on a reader fires once, not per poll
//! - **Non-blocking motor loop**: steps are never starved by reader I/O or
//!   HTTP traffic
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Stepper, step output, tag reader and clock abstractions
//! - `registry` - Known tags and their names
//! - `occupancy` - The set of animals inside
//! - `door` - Door controller state machine
//! - `dispatcher` - Reader polling and access event application
//! - `stepper` - Acceleration-ramped stepper over STEP/DIR pulses
//! - `scheduler` - The real-time motor loop
//! - `services` - Shared gate state and the HTTP status service
//! - `hal` - Concrete implementations (mock for testing, esp32 for hardware)
//!
//! ## Example
//!
//! ```rust
//! use barn_gate::{
//!     apply_access_event, AccessEvent, BarnOccupancy, ChannelRole, DoorConfig,
//!     DoorController, DoorState, hal::MockStepper, registry::HERD,
//! };
//!
//! let mut door = DoorController::new(MockStepper::new(), DoorConfig::default()).unwrap();
//! let mut barn = BarnOccupancy::new();
//!
//! let event = AccessEvent { role: ChannelRole::Entry, id: HERD[0].id, name: HERD[0].name };
//! apply_access_event(&event, &mut barn, &mut door, 0).unwrap();
//! assert_eq!(door.state(), DoorState::Opening);
//! assert!(barn.contains("Bron"));
//!
//! // Update in your motor loop
//! door.update(1).unwrap();
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Shared configuration system for desktop and ESP32.
pub mod config;
/// Reader polling, presence edges and access event application.
pub mod dispatcher;
/// Door controller state machine.
pub mod door;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Bounded set of animals inside the barn.
pub mod occupancy;
/// Static tag registry.
pub mod registry;
/// Core traits for hardware abstraction.
pub mod traits;

/// Acceleration-ramped stepper driver.
#[cfg(feature = "std")]
pub mod stepper;

/// Real-time motor loop.
#[cfg(feature = "std")]
pub mod scheduler;

/// Shared gate state and HTTP services.
#[cfg(feature = "std")]
pub mod services;

// Re-exports for convenience
pub use dispatcher::{
    apply_access_event, AccessDispatcher, AccessEvent, ChannelRole, EventReport, Presence,
    PresenceEdge, ReaderChannel,
};
pub use door::{
    DoorController, DoorOutcome, DoorState, DoorStats, DoorStatus, FaultKind, RejectReason,
};
pub use occupancy::{BarnOccupancy, OccupancyChange, OccupancySet, OccupancySnapshot};
pub use registry::{TagRecord, TagRegistry, HERD, UNKNOWN_NAME};
pub use traits::{Clock, StepDirection, StepOutput, StepperDriver, TagId, TagReader};

#[cfg(feature = "std")]
pub use scheduler::{spawn_motor_task, LoopStats, MotorLoop, MotorTask, TickReport};
#[cfg(feature = "std")]
pub use stepper::RampedStepper;

// Config re-exports
pub use config::{Config, DoorConfig, SchedulerConfig, WebConfig, WifiConfig};
