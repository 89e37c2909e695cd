//! HTTP server for the gate web API on ESP32.
//!
//! Serves the same endpoints as the desktop axum server, with the behaviour
//! coming from the shared [`StatusService`]:
//!
//! - `GET /` - Web UI (embedded HTML)
//! - `GET /api/barn` - Occupancy and door status (JSON)
//! - `POST /api/door/open` - Manual open, always `OK`
//! - `POST /api/door/close` - Manual close, always `OK`
//!
//! Unregistered URIs get the ESP-IDF server's own 404.
//!
//! # Example
//!
//! ```ignore
//! use barn_gate::hal::esp32::Esp32HttpServer;
//! use barn_gate::config::WebConfig;
//!
//! let server = Esp32HttpServer::new(&WebConfig::default(), Arc::clone(&gate))?;
//! ```

use std::sync::Arc;

use esp_idf_hal::io::Write;
use esp_idf_svc::http::server::{Configuration, EspHttpServer};
use esp_idf_svc::http::Method;
use esp_idf_svc::io::EspIOError;
use tracing::info;

use crate::config::WebConfig;
use crate::services::{GateProvider, StatusService};

const JSON_HEADERS: &[(&str, &str)] = &[("Content-Type", "application/json")];
const TEXT_HEADERS: &[(&str, &str)] = &[("Content-Type", "text/plain")];
const HTML_HEADERS: &[(&str, &str)] = &[("Content-Type", "text/html")];

/// Running HTTP server. Dropping it stops the server.
pub struct Esp32HttpServer {
    _server: EspHttpServer<'static>,
}

impl Esp32HttpServer {
    /// Start the server on `config.port` over the given gate.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP server fails to start or a handler
    /// cannot be registered.
    pub fn new<P: GateProvider + 'static>(config: &WebConfig, gate: P) -> anyhow::Result<Self> {
        let server_config = Configuration {
            http_port: config.port,
            ..Default::default()
        };
        let mut server = EspHttpServer::new(&server_config)?;
        let service = Arc::new(StatusService::new(gate));

        let svc = Arc::clone(&service);
        server.fn_handler("/api/barn", Method::Get, move |req| {
            let json = svc.get_status_json();
            let mut resp = req.into_response(200, None, JSON_HEADERS)?;
            resp.write_all(json.as_bytes())?;
            Ok::<_, EspIOError>(())
        })?;

        let svc = Arc::clone(&service);
        server.fn_handler("/api/door/open", Method::Post, move |req| {
            let body = svc.post_open();
            let mut resp = req.into_response(200, None, TEXT_HEADERS)?;
            resp.write_all(body.as_bytes())?;
            Ok::<_, EspIOError>(())
        })?;

        let svc = Arc::clone(&service);
        server.fn_handler("/api/door/close", Method::Post, move |req| {
            let body = svc.post_close();
            let mut resp = req.into_response(200, None, TEXT_HEADERS)?;
            resp.write_all(body.as_bytes())?;
            Ok::<_, EspIOError>(())
        })?;

        let svc = service;
        server.fn_handler("/", Method::Get, move |req| {
            let mut resp = req.into_response(200, None, HTML_HEADERS)?;
            resp.write_all(svc.handle_index().as_bytes())?;
            Ok::<_, EspIOError>(())
        })?;

        info!(port = config.port, "HTTP server started");

        Ok(Self { _server: server })
    }
}
