//! Real-time motor loop: door updates and RFID polling.
//!
//! The gate runs two execution contexts:
//!
//! | Context | Runs | Cadence |
//! |---------|------|---------|
//! | Motor loop (this module) | `door.update()`, RFID polling, event application | every `motor_tick_us` |
//! | Service | HTTP server | tens of milliseconds is fine |
//!
//! The stepper only moves inside `update()`, so the motor loop must never
//! block: readers are polled only while the door is idle, reader I/O happens
//! without any lock held, and events are applied under the gate locks
//! afterwards. Gaps between ticks longer than `max_tick_gap_us` are counted
//! as overruns, except after a tick that polled the readers: RFID I/O can
//! take tens of milliseconds while the door is at rest.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use barn_gate::config::{DoorConfig, SchedulerConfig};
//! use barn_gate::dispatcher::AccessDispatcher;
//! use barn_gate::door::{DoorController, DoorState};
//! use barn_gate::hal::{MockStepper, MockTagReader};
//! use barn_gate::registry::{TagRegistry, HERD};
//! use barn_gate::scheduler::MotorLoop;
//! use barn_gate::services::SharedGate;
//!
//! let door = DoorController::new(MockStepper::new(), DoorConfig::default()).unwrap();
//! let gate = Arc::new(SharedGate::new(door));
//! let mut dispatcher =
//!     AccessDispatcher::new(TagRegistry::herd(), MockTagReader::new(), MockTagReader::new());
//! dispatcher.entry_mut().reader_mut().set_present(HERD[0].id);
//!
//! let mut motor = MotorLoop::new(Arc::clone(&gate), dispatcher, SchedulerConfig::default());
//! let report = motor.tick(0);
//! assert_eq!(report.events, 1);
//! assert_eq!(gate.door_status().state, DoorState::Opening);
//! ```

use core::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use heapless::Vec;
use tracing::{debug, error, info, warn};

use crate::config::SchedulerConfig;
use crate::dispatcher::{AccessDispatcher, AccessEvent};
use crate::door::DoorState;
use crate::services::SharedGate;
use crate::traits::{StepperDriver, TagReader};

/// Events a single poll can produce (one per reader).
const MAX_EVENTS_PER_POLL: usize = 2;

/// Stack size of the desktop motor thread.
const MOTOR_STACK_BYTES: usize = 64 * 1024;

/// Counters kept by the motor loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Ticks executed.
    pub ticks: u64,
    /// Ticks whose gap exceeded the threshold.
    pub overruns: u64,
    /// Largest gap seen after a non-polling tick, in microseconds.
    pub max_gap_us: u64,
    /// Ticks on which the readers were polled.
    pub polls: u64,
    /// Access events applied.
    pub events: u64,
    /// Stepper driver errors.
    pub driver_errors: u64,
    /// Reader errors.
    pub reader_errors: u64,
}

/// What one tick did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickReport {
    /// Door state after `update()`, or `None` if the driver failed.
    pub door: Option<DoorState>,
    /// Whether the readers were polled.
    pub polled: bool,
    /// Events applied on this tick.
    pub events: usize,
    /// Time since the previous tick.
    pub gap_us: u64,
    /// Gap exceeded the threshold and the previous tick did not poll.
    pub overrun: bool,
}

/// The real-time loop driving the door and the readers.
pub struct MotorLoop<S: StepperDriver, R: TagReader> {
    gate: Arc<SharedGate<S>>,
    dispatcher: AccessDispatcher<R>,
    config: SchedulerConfig,
    stats: LoopStats,
    last_tick_us: Option<u64>,
    last_polled: bool,
}

impl<S, R> MotorLoop<S, R>
where
    S: StepperDriver,
    R: TagReader,
    S::Error: fmt::Debug,
    R::Error: fmt::Debug,
{
    /// Create a loop over a shared gate and a reader dispatcher.
    pub fn new(
        gate: Arc<SharedGate<S>>,
        dispatcher: AccessDispatcher<R>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            gate,
            dispatcher,
            config,
            stats: LoopStats::default(),
            last_tick_us: None,
            last_polled: false,
        }
    }

    /// Run one tick at `now_us` on the gate time base.
    pub fn tick(&mut self, now_us: u64) -> TickReport {
        let gap_us = self
            .last_tick_us
            .map_or(0, |last| now_us.saturating_sub(last));
        self.last_tick_us = Some(now_us);
        self.stats.ticks += 1;

        // A gap after a polling tick includes reader I/O, not motor latency
        let timed = !self.last_polled;
        if timed {
            self.stats.max_gap_us = self.stats.max_gap_us.max(gap_us);
        }
        let overrun = timed && gap_us > self.config.max_tick_gap_us;
        if overrun {
            self.stats.overruns += 1;
            warn!(
                gap_us,
                limit_us = self.config.max_tick_gap_us,
                overruns = self.stats.overruns,
                "motor tick overrun"
            );
        }

        let now_ms = now_us / 1000;
        let door = match self.gate.update_door(now_ms) {
            Ok(state) => Some(state),
            Err(e) => {
                self.stats.driver_errors += 1;
                error!(error = ?e, "stepper update failed");
                None
            }
        };

        let mut report = TickReport {
            door,
            polled: false,
            events: 0,
            gap_us,
            overrun,
        };

        if matches!(door, Some(DoorState::Idle | DoorState::ManualOpen)) {
            report.polled = true;
            report.events = self.poll_and_apply(now_ms);
        }
        self.last_polled = report.polled;

        report
    }

    /// Run until `stop` is set, sleeping `motor_tick_us` between ticks.
    pub fn run(mut self, stop: Arc<AtomicBool>) -> LoopStats {
        info!(
            tick_us = self.config.motor_tick_us,
            max_gap_us = self.config.max_tick_gap_us,
            "motor loop started"
        );
        let sleep = Duration::from_micros(self.config.motor_tick_us);
        while !stop.load(Ordering::Relaxed) {
            let now_us = self.gate.now_us();
            self.tick(now_us);
            thread::sleep(sleep);
        }
        info!(
            ticks = self.stats.ticks,
            overruns = self.stats.overruns,
            max_gap_us = self.stats.max_gap_us,
            "motor loop stopped"
        );
        self.stats
    }

    /// Counters so far.
    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    /// The shared gate.
    pub fn gate(&self) -> &Arc<SharedGate<S>> {
        &self.gate
    }

    /// Mutable access to the readers (simulation and tests).
    pub fn dispatcher_mut(&mut self) -> &mut AccessDispatcher<R> {
        &mut self.dispatcher
    }

    fn poll_and_apply(&mut self, now_ms: u64) -> usize {
        self.stats.polls += 1;

        // Reader I/O with no gate lock held
        let mut events: Vec<AccessEvent, MAX_EVENTS_PER_POLL> = Vec::new();
        if let Err(e) = self.dispatcher.poll(|event| {
            let _ = events.push(*event);
        }) {
            self.stats.reader_errors += 1;
            warn!(error = ?e, "reader poll failed");
        }

        let mut applied = 0;
        for event in &events {
            match self.gate.apply_event(event, now_ms) {
                Ok(report) => {
                    applied += 1;
                    debug!(
                        name = event.name,
                        role = event.role.as_str(),
                        occupancy = ?report.occupancy,
                        door = ?report.door,
                        "access event applied"
                    );
                }
                Err(e) => {
                    self.stats.driver_errors += 1;
                    error!(error = ?e, name = event.name, "stepper error applying event");
                }
            }
        }
        self.stats.events += applied as u64;
        applied
    }
}

/// Running motor thread.
pub struct MotorTask {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<LoopStats>,
}

impl MotorTask {
    pub(crate) fn new(stop: Arc<AtomicBool>, handle: JoinHandle<LoopStats>) -> Self {
        Self { stop, handle }
    }

    /// Ask the loop to stop and wait for it.
    pub fn shutdown(self) -> thread::Result<LoopStats> {
        self.stop.store(true, Ordering::Relaxed);
        self.handle.join()
    }

    /// True once the thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Spawn the motor loop on a dedicated OS thread.
///
/// On ESP32 use `hal::esp32::spawn_motor_task_pinned` instead, which pins the
/// loop to a core at high FreeRTOS priority.
pub fn spawn_motor_task<S, R>(motor: MotorLoop<S, R>) -> std::io::Result<MotorTask>
where
    S: StepperDriver + Send + 'static,
    R: TagReader + Send + 'static,
    S::Error: fmt::Debug,
    R::Error: fmt::Debug,
{
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    let handle = thread::Builder::new()
        .name("motor".into())
        .stack_size(MOTOR_STACK_BYTES)
        .spawn(move || motor.run(flag))?;
    Ok(MotorTask::new(stop, handle))
}
