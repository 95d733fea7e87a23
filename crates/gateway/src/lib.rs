//! HTTP gateway for ZoneWatch.
//!
//! Serves the embedded chat page, a health check, and the v1 API for
//! uploads, initialization, chat, history and the operations flows.
//!
//! Built on Axum.

pub mod api_v1;
pub mod frontend;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

use axum::extract::DefaultBodyLimit;
use axum::{Router, extract::State, response::Json, routing::get};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use zonewatch_core::event::{DomainEvent, EventBus};

pub use api_v1::{ApiV1State, SharedApiState, SESSION_HEADER};
pub use session::{ChatSession, SessionStore};

/// Build the full router: health, v1 API and the embedded frontend.
pub fn build_router(state: SharedApiState) -> Router {
    let upload_limit = state.config.gateway.upload_limit_bytes;
    Router::new()
        .route("/health", get(health_handler))
        .with_state(state.clone())
        .nest("/v1", api_v1::v1_router(state))
        .merge(frontend::frontend_router())
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
///
/// Provider and reranker are built once and shared. With `init_on_start`
/// the build pipeline runs before the listener opens.
pub async fn start(
    config: zonewatch_config::AppConfig,
    init_on_start: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let provider = zonewatch_providers::build_provider(&config)?;
    let reranker = zonewatch_providers::build_reranker(&config)?;
    let event_bus = Arc::new(EventBus::default());
    spawn_event_logger(&event_bus);

    let state = Arc::new(ApiV1State::new(config, provider, reranker, event_bus));
    if init_on_start {
        let report = state.initialize().await?;
        info!(zones = report.zones.len(), failures = report.failures.len(), "Services ready");
    }

    let app = build_router(state);
    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Log every domain event at debug level, and failures at warn.
pub fn spawn_event_logger(bus: &EventBus) -> tokio::task::JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => match event.as_ref() {
                    DomainEvent::ZoneFailed { zone_id, error_message, .. } => {
                        warn!(zone = %zone_id, error = %error_message, "event: zone failed");
                    }
                    DomainEvent::ErrorOccurred { context, error_message, .. } => {
                        warn!(context = %context, error = %error_message, "event: error");
                    }
                    other => debug!(event = ?other, "event"),
                },
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event logger lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    initialized: bool,
}

async fn health_handler(State(state): State<SharedApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        initialized: state.services.read().await.is_some(),
    })
}
