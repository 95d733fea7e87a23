//! HTTP API v1.
//!
//! Endpoints:
//!
//! - `POST   /v1/upload`              — Upload zone reports (multipart `.txt` files)
//! - `POST   /v1/initialize`          — Build zone indexes, agents and the dispatcher
//! - `GET    /v1/zones`               — Built zones with summaries and failures
//! - `POST   /v1/chat`                — Ask the dispatch agent
//! - `GET    /v1/history`             — The session's chat history
//! - `DELETE /v1/history`             — Reset the session
//! - `POST   /v1/announcements`       — Generate a targeted announcement
//! - `POST   /v1/incidents/predict`   — Predict incidents from zone densities
//!
//! Sessions are keyed by the `x-session-id` header (default `default`).

use axum::{
    Router,
    extract::{Multipart, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info};
use zonewatch_agent::{
    initialize, Announcement, AnnouncementRequest, IncidentPrediction, IncidentPredictionRequest,
    InitReport, OperationsFlows, Services, ZoneFailure, ZoneReport,
};
use zonewatch_config::AppConfig;
use zonewatch_core::error::{FlowError, IndexError};
use zonewatch_core::event::{DomainEvent, EventBus};
use zonewatch_core::history::HistoryEntry;
use zonewatch_core::provider::Provider;
use zonewatch_core::rerank::Reranker;
use zonewatch_index::{save_upload, validate_upload_name};
use crate::session::{SessionStore, DEFAULT_SESSION_ID};

pub const SESSION_HEADER: &str = "x-session-id";

// ── State ─────────────────────────────────────────────────────────────────

/// Shared state for the v1 API.
pub struct ApiV1State {
    pub config: AppConfig,
    pub provider: Arc<dyn Provider>,
    pub reranker: Arc<dyn Reranker>,
    pub event_bus: Arc<EventBus>,
    /// Set once `/v1/initialize` succeeds; replaced on re-initialization
    pub services: RwLock<Option<Arc<Services>>>,
    /// Serializes initialization runs
    pub init_lock: Mutex<()>,
    pub sessions: SessionStore,
    pub flows: OperationsFlows,
}

pub type SharedApiState = Arc<ApiV1State>;

impl ApiV1State {
    pub fn new(
        config: AppConfig,
        provider: Arc<dyn Provider>,
        reranker: Arc<dyn Reranker>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let flows = OperationsFlows::new(zonewatch_index::EngineSettings::from_config(
            provider.clone(),
            &config,
        ));
        Self {
            config,
            provider,
            reranker,
            event_bus,
            services: RwLock::new(None),
            init_lock: Mutex::new(()),
            sessions: SessionStore::new(),
            flows,
        }
    }

    /// Run the build pipeline on a spawned task and install the result.
    pub async fn initialize(self: &Arc<Self>) -> zonewatch_core::Result<InitReport> {
        let _guard = self.init_lock.lock().await;
        let state = self.clone();
        let services = tokio::spawn(async move {
            initialize(
                &state.config,
                state.provider.clone(),
                state.reranker.clone(),
                Some(state.event_bus.clone()),
            )
            .await
        })
        .await
        .map_err(|e| zonewatch_core::Error::Internal(format!("initialization task failed: {e}")))??;

        let report = services.report.clone();
        *self.services.write().await = Some(Arc::new(services));
        Ok(report)
    }
}

// ── Router ────────────────────────────────────────────────────────────────

/// Build the v1 API router. Nest this under "/v1" in the main router.
pub fn v1_router(state: SharedApiState) -> Router {
    Router::new()
        .route("/upload", post(upload_handler))
        .route("/initialize", post(initialize_handler))
        .route("/zones", get(zones_handler))
        .route("/chat", post(chat_handler))
        .route("/history", get(history_handler).delete(reset_history_handler))
        .route("/announcements", post(announcement_handler))
        .route("/incidents/predict", post(predict_handler))
        .with_state(state)
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    pub tools: Vec<String>,
    pub iterations: u32,
}

#[derive(Serialize, Deserialize)]
pub struct UploadResponse {
    pub saved: Vec<String>,
}

#[derive(Serialize, Deserialize)]
pub struct ZoneListResponse {
    pub initialized: bool,
    pub zones: Vec<ZoneReport>,
    pub failures: Vec<ZoneFailure>,
}

#[derive(Serialize, Deserialize)]
pub struct HistoryResponse {
    pub session_id: String,
    pub entries: Vec<HistoryEntry>,
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse { error: message.into() }))
}

/// HTTP status for a failed operation: caller mistakes are 400, upstream
/// model failures 502, everything else 500.
fn status_for(e: &zonewatch_core::Error) -> StatusCode {
    use zonewatch_core::Error;
    match e {
        Error::Flow(FlowError::InvalidInput(_)) | Error::Index(IndexError::InvalidUpload { .. }) => {
            StatusCode::BAD_REQUEST
        }
        Error::Flow(FlowError::InvalidOutput(_)) | Error::Provider(_) | Error::Agent(_) => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn session_id(headers: &HeaderMap) -> String {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SESSION_ID)
        .to_string()
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn upload_handler(
    State(state): State<SharedApiState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let upload_error = |e: IndexError| {
        let e = zonewatch_core::Error::from(e);
        api_error(status_for(&e), e.to_string())
    };

    // Every name is checked before anything is written.
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, format!("Invalid multipart body: {e}")))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        validate_upload_name(&file_name).map_err(upload_error)?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, format!("Failed to read '{file_name}': {e}")))?;
        files.push((file_name, bytes));
    }

    if files.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "No files in upload"));
    }

    let mut saved = Vec::with_capacity(files.len());
    for (file_name, bytes) in files {
        save_upload(&state.config.paths.data_dir, &file_name, &bytes)
            .await
            .map_err(upload_error)?;
        saved.push(file_name);
    }
    info!(files = ?saved, "Zone reports uploaded");
    Ok((StatusCode::CREATED, Json(UploadResponse { saved })))
}

async fn initialize_handler(State(state): State<SharedApiState>) -> Result<Json<InitReport>, ApiError> {
    match state.initialize().await {
        Ok(report) => Ok(Json(report)),
        Err(e) => {
            error!(error = %e, "Initialization failed");
            state.event_bus.publish(DomainEvent::ErrorOccurred {
                context: "initialize".into(),
                error_message: e.to_string(),
                timestamp: chrono::Utc::now(),
            });
            Err(api_error(status_for(&e), e.to_string()))
        }
    }
}

async fn zones_handler(State(state): State<SharedApiState>) -> Json<ZoneListResponse> {
    match state.services.read().await.as_ref() {
        Some(services) => Json(ZoneListResponse {
            initialized: true,
            zones: services.report.zones.clone(),
            failures: services.report.failures.clone(),
        }),
        None => Json(ZoneListResponse {
            initialized: false,
            zones: Vec::new(),
            failures: Vec::new(),
        }),
    }
}

async fn chat_handler(
    State(state): State<SharedApiState>,
    headers: HeaderMap,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = payload.message.trim().to_string();
    if message.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Message must not be empty"));
    }

    let Some(services) = state.services.read().await.clone() else {
        return Err(api_error(
            StatusCode::CONFLICT,
            "Services are not initialized. Upload zone reports and call /v1/initialize first.",
        ));
    };

    let session_id = session_id(&headers);
    info!(session = %session_id, message_len = message.len(), "v1/chat request");
    let session = state.sessions.get_or_create(&session_id);

    let turn = tokio::spawn(async move {
        let mut session = session.lock().await;
        session.ask(&services.dispatcher, &message).await
    })
    .await
    .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("Chat task failed: {e}")))?;

    match turn {
        Ok(outcome) => {
            state.event_bus.publish(DomainEvent::ResponseGenerated {
                session_id,
                iterations: outcome.iterations,
                tools_used: outcome.tools.clone(),
                timestamp: chrono::Utc::now(),
            });
            Ok(Json(ChatResponse {
                answer: outcome.answer,
                tools: outcome.tools,
                iterations: outcome.iterations,
            }))
        }
        Err(e) => {
            state.event_bus.publish(DomainEvent::ErrorOccurred {
                context: format!("chat:{session_id}"),
                error_message: e.to_string(),
                timestamp: chrono::Utc::now(),
            });
            Err(api_error(StatusCode::BAD_GATEWAY, e.to_string()))
        }
    }
}

async fn history_handler(State(state): State<SharedApiState>, headers: HeaderMap) -> Json<HistoryResponse> {
    let session_id = session_id(&headers);
    let session = state.sessions.get_or_create(&session_id);
    let session = session.lock().await;
    Json(HistoryResponse {
        session_id,
        entries: session.history().entries().to_vec(),
    })
}

async fn reset_history_handler(State(state): State<SharedApiState>, headers: HeaderMap) -> StatusCode {
    let session_id = session_id(&headers);
    let session = state.sessions.get_or_create(&session_id);
    session.lock().await.reset();
    info!(session = %session_id, "Session reset");
    StatusCode::NO_CONTENT
}

async fn announcement_handler(
    State(state): State<SharedApiState>,
    Json(payload): Json<AnnouncementRequest>,
) -> Result<Json<Announcement>, ApiError> {
    state
        .flows
        .targeted_announcement(&payload)
        .await
        .map(Json)
        .map_err(|e| api_error(status_for(&e), e.to_string()))
}

async fn predict_handler(
    State(state): State<SharedApiState>,
    Json(payload): Json<IncidentPredictionRequest>,
) -> Result<Json<IncidentPrediction>, ApiError> {
    state
        .flows
        .predict_incidents(&payload)
        .await
        .map(Json)
        .map_err(|e| api_error(status_for(&e), e.to_string()))
}
