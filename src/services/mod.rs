//! Shared gate state and the status service.
//!
//! The motor loop and the HTTP servers share one gate through
//! `SharedGate<S>` wrapped in `Arc`:
//!
//! ```ignore
//! use std::sync::Arc;
//! use barn_gate::services::SharedGate;
//!
//! // Create single shared state
//! let gate = Arc::new(SharedGate::new(door));
//!
//! // Motor loop and web server both use the same state
//! spawn_motor_task(MotorLoop::new(Arc::clone(&gate), dispatcher, scheduler_config))?;
//! let web_router = build_router(Arc::clone(&gate), &web_config);
//! ```
//!
//! - `web` feature: axum server on tokio
//! - `esp32-http` feature: the same `StatusService` behind esp-idf-svc

// Shared state and response types (std only)
pub mod api;
pub mod shared;

// HTTP handler logic (shared between desktop and ESP32)
#[cfg(any(feature = "web", feature = "esp32-http"))]
pub mod http_handler;

#[cfg(feature = "web")]
pub mod web;

// Re-exports
pub use api::*;
pub use shared::*;

#[cfg(any(feature = "web", feature = "esp32-http"))]
pub use http_handler::*;

#[cfg(feature = "web")]
pub use web::*;
