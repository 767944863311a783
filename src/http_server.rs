//! Frontend-facing HTTP API. Thin glue: every state change goes through the
//! session service, every search through the pipeline in `api`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};

use crate::api::{run_search, SearchClient};
use crate::color::{group_color, GROUP_PALETTE, UNGROUPED_COLOR};
use crate::models::{Tab, TabAttachment, TabId};
use crate::session::{SessionService, TabPatch};

#[derive(Clone)]
pub struct ServerState {
    pub sessions: SessionService,
    pub client: SearchClient,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no such tab: {0}")]
    TabNotFound(TabId),
    #[error("no active tab")]
    NoActiveTab,
    #[error("invalid attachment payload: {0}")]
    BadAttachment(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::TabNotFound(_) | ApiError::NoActiveTab => StatusCode::NOT_FOUND,
            ApiError::BadAttachment(_) => StatusCode::BAD_REQUEST,
        };
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabsResponse {
    pub tabs: Vec<Tab>,
    pub active_tab_id: Option<TabId>,
}

/// Attachment upload body; `data` is the base64-encoded file content.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: String,
}

pub fn router(state: ServerState) -> Router {
    // Permissive CORS: the UI may be served from anywhere during development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/tabs", get(list_tabs).post(create_tab))
        .route("/api/tabs/active", get(active_tab))
        .route("/api/tabs/:id", delete(close_tab).patch(update_tab))
        .route("/api/tabs/:id/select", post(select_tab))
        .route(
            "/api/tabs/:id/attachment",
            axum::routing::put(set_attachment).delete(clear_attachment),
        )
        .route("/api/tabs/:id/search", post(search_tab))
        .route("/api/color-scale", get(color_scale))
        .route("/api/color-scale/:source_video_id", get(source_color))
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Binds the API server and serves until shutdown.
pub async fn start_server(state: ServerState, port: u16) -> anyhow::Result<()> {
    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    log::info!("HTTP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ColorScaleResponse {
    palette: Vec<&'static str>,
    ungrouped: &'static str,
}

#[derive(Debug, Serialize)]
struct SourceColorResponse {
    color: &'static str,
}

/// The grouping palette, so the UI can render legends without hardcoding it.
async fn color_scale() -> impl IntoResponse {
    Json(ColorScaleResponse {
        palette: GROUP_PALETTE.to_vec(),
        ungrouped: UNGROUPED_COLOR,
    })
}

/// Deterministic grouping color for one source video id.
async fn source_color(Path(source_video_id): Path<String>) -> impl IntoResponse {
    Json(SourceColorResponse {
        color: group_color(Some(&source_video_id)),
    })
}

async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn list_tabs(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(TabsResponse {
        tabs: state.sessions.tabs(),
        active_tab_id: state.sessions.active_id(),
    })
}

async fn create_tab(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let tab = state.sessions.create_tab();
    (StatusCode::CREATED, Json(tab))
}

async fn active_tab(State(state): State<Arc<ServerState>>) -> Result<Json<Tab>, ApiError> {
    state
        .sessions
        .active_tab()
        .map(Json)
        .ok_or(ApiError::NoActiveTab)
}

async fn select_tab(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<TabId>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.select_tab(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::TabNotFound(id))
    }
}

async fn close_tab(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<TabId>,
) -> impl IntoResponse {
    // Closing an unknown tab is a no-op by design; report the outcome either way
    state.sessions.close_tab(id);
    Json(TabsResponse {
        tabs: state.sessions.tabs(),
        active_tab_id: state.sessions.active_id(),
    })
}

async fn update_tab(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<TabId>,
    Json(patch): Json<TabPatch>,
) -> Result<Json<Tab>, ApiError> {
    if !state.sessions.update_tab(id, patch) {
        return Err(ApiError::TabNotFound(id));
    }
    state
        .sessions
        .tab(id)
        .map(Json)
        .ok_or(ApiError::TabNotFound(id))
}

async fn set_attachment(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<TabId>,
    Json(upload): Json<AttachmentUpload>,
) -> Result<Json<Tab>, ApiError> {
    let bytes = BASE64
        .decode(upload.data.as_bytes())
        .map_err(|e| ApiError::BadAttachment(e.to_string()))?;
    let attachment = TabAttachment::new(upload.file_name, upload.content_type, bytes);

    let patch = TabPatch {
        attachment: Some(Some(attachment)),
        ..Default::default()
    };
    if !state.sessions.update_tab(id, patch) {
        return Err(ApiError::TabNotFound(id));
    }
    state
        .sessions
        .tab(id)
        .map(Json)
        .ok_or(ApiError::TabNotFound(id))
}

async fn clear_attachment(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<TabId>,
) -> Result<Json<Tab>, ApiError> {
    let patch = TabPatch {
        attachment: Some(None),
        ..Default::default()
    };
    if !state.sessions.update_tab(id, patch) {
        return Err(ApiError::TabNotFound(id));
    }
    state
        .sessions
        .tab(id)
        .map(Json)
        .ok_or(ApiError::TabNotFound(id))
}

async fn search_tab(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<TabId>,
) -> Result<Json<Tab>, ApiError> {
    run_search(&state.sessions, &state.client, id)
        .await
        .map(Json)
        .ok_or(ApiError::TabNotFound(id))
}
