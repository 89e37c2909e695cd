//! Axum-based HTTP server for the gate status API.
//!
//! Provides endpoints for:
//! - GET `/` - Web UI (serves index.html)
//! - GET `/api/barn` - Occupancy and door status
//! - POST `/api/door/open` - Manual open (always `OK`)
//! - POST `/api/door/close` - Manual close (always `OK`)
//!
//! Anything else is a 404.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::WebConfig;

use super::api::GateStatus;
use super::http_handler::StatusService;
use super::shared::GateProvider;

// ============================================================================
// Route Handlers
// ============================================================================

/// GET /api/barn - Returns occupancy and door label
async fn get_barn<P: GateProvider + 'static>(
    State(service): State<Arc<StatusService<P>>>,
) -> Json<GateStatus> {
    Json(service.get_status())
}

/// POST /api/door/open - Manual open
async fn open_door<P: GateProvider + 'static>(
    State(service): State<Arc<StatusService<P>>>,
) -> &'static str {
    service.post_open()
}

/// POST /api/door/close - Manual close
async fn close_door<P: GateProvider + 'static>(
    State(service): State<Arc<StatusService<P>>>,
) -> &'static str {
    service.post_close()
}

/// GET / - Serve the web UI
async fn index<P: GateProvider + 'static>(
    State(service): State<Arc<StatusService<P>>>,
) -> Html<&'static str> {
    Html(service.handle_index())
}

/// Fallback handler for 404
async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not found")
}

// ============================================================================
// Server Builder
// ============================================================================

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebServerConfig {
    /// Address to bind to
    pub addr: SocketAddr,
    /// Whether to enable CORS for all origins
    pub cors_permissive: bool,
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self::from_config(&WebConfig::default())
    }
}

impl WebServerConfig {
    /// Create a new config with the given address
    pub fn new(addr: impl Into<SocketAddr>) -> Self {
        Self {
            addr: addr.into(),
            ..Default::default()
        }
    }

    /// Set whether CORS should be permissive
    pub fn cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }

    /// Create from shared WebConfig
    pub fn from_config(config: &WebConfig) -> Self {
        Self {
            addr: ([0, 0, 0, 0], config.port).into(),
            cors_permissive: config.cors_permissive,
        }
    }
}

/// Build the Axum router with all routes
pub fn build_router<P: GateProvider + 'static>(gate: P, config: &WebServerConfig) -> Router {
    let service = Arc::new(StatusService::new(gate));

    let mut router = Router::new()
        // API routes
        .route("/api/barn", get(get_barn::<P>))
        .route("/api/door/open", post(open_door::<P>))
        .route("/api/door/close", post(close_door::<P>))
        // Web UI
        .route("/", get(index::<P>))
        // Fallback
        .fallback(not_found)
        .with_state(service);

    // Add CORS if requested
    if config.cors_permissive {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router
}

/// Start the web server over a shared gate
///
/// This function runs until the server is shut down. The motor loop keeps
/// running on its own thread and shares the same gate.
///
/// # Example
///
/// ```ignore
/// let gate = Arc::new(SharedGate::new(door));
/// spawn_motor_task(MotorLoop::new(Arc::clone(&gate), dispatcher, config.scheduler))?;
/// run_server_with_state(gate, WebServerConfig::from_config(&config.web)).await?;
/// ```
pub async fn run_server_with_state<P: GateProvider + 'static>(
    gate: P,
    config: WebServerConfig,
) -> Result<(), std::io::Error> {
    let router = build_router(gate, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!(addr = %config.addr, "web server listening");

    axum::serve(listener, router).await
}
