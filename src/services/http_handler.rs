//! Shared HTTP handler logic for both desktop and ESP32.
//!
//! This module provides platform-agnostic request handling that is used by
//! both the axum server (desktop) and the esp-idf-svc server (ESP32).
//!
//! # Design
//!
//! [`StatusService`] contains the behaviour of every endpoint. Platform HTTP
//! servers call these methods and translate the results to their native
//! response types. Door commands are fire-and-forget: the response is `OK`
//! whatever the door did with the request, and the outcome only shows up in
//! the log and in the next status read.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use barn_gate::config::DoorConfig;
//! use barn_gate::door::DoorController;
//! use barn_gate::hal::MockStepper;
//! use barn_gate::services::{SharedGate, StatusService};
//!
//! let door = DoorController::new(MockStepper::new(), DoorConfig::default()).unwrap();
//! let service = StatusService::new(Arc::new(SharedGate::new(door)));
//!
//! assert_eq!(service.post_open(), "OK");
//! assert_eq!(
//!     service.get_status_json(),
//!     r#"{"count":0,"doorStatus":"opening","goats":[]}"#
//! );
//! ```

use tracing::{debug, warn};

use crate::door::DoorOutcome;

use super::api::GateStatus;
use super::shared::GateProvider;

/// Body returned by the door command endpoints.
pub const OK_BODY: &str = "OK";

/// Web UI page.
pub const INDEX_HTML: &str = include_str!("../../www/index.html");

/// Endpoint behaviour shared by the desktop and ESP32 servers.
pub struct StatusService<P: GateProvider> {
    gate: P,
}

impl<P: GateProvider> StatusService<P> {
    /// Create a service over the given gate.
    pub fn new(gate: P) -> Self {
        Self { gate }
    }

    /// The gate this service reads and commands.
    pub fn gate(&self) -> &P {
        &self.gate
    }

    /// GET /api/barn - occupancy and door label.
    pub fn get_status(&self) -> GateStatus {
        self.gate.status()
    }

    /// GET /api/barn as a JSON string.
    pub fn get_status_json(&self) -> String {
        status_to_json(&self.get_status())
    }

    /// POST /api/door/open - manual open.
    pub fn post_open(&self) -> &'static str {
        log_outcome("open", self.gate.request_open(true));
        OK_BODY
    }

    /// POST /api/door/close - manual close.
    pub fn post_close(&self) -> &'static str {
        log_outcome("close", self.gate.request_close());
        OK_BODY
    }

    /// GET / - web UI HTML.
    pub fn handle_index(&self) -> &'static str {
        INDEX_HTML
    }
}

/// Serialize a status body.
pub fn status_to_json(status: &GateStatus) -> String {
    // A struct of strings and integers always serializes.
    serde_json::to_string(status).unwrap_or_else(|_| String::from("{}"))
}

fn log_outcome(command: &'static str, outcome: Result<DoorOutcome, ()>) {
    match outcome {
        Ok(DoorOutcome::Accepted) => debug!(command, "manual door command accepted"),
        Ok(DoorOutcome::Rejected(reason)) => {
            debug!(command, ?reason, "manual door command ignored")
        }
        Err(()) => warn!(command, "manual door command failed"),
    }
}
