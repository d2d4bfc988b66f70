use crate::models::{PostRequest, PostResponse, PublisherManager, ValidationError};
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};

pub struct AppState {
    pub publishers: PublisherManager,
}

/// Request-level failures. Per-platform failures never end up here; they
/// are reported inside a successful `PostResponse`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing required fields")]
    Validation(#[from] ValidationError),
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(json!({ "success": false, "message": self.to_string() })),
        )
            .into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/platforms", get(list_platforms))
        .route("/api/post", post(submit_post))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// The body is parsed as JSON regardless of `Content-Type`. A body that
/// cannot be read (e.g. over the default size limit) is a server error too.
pub async fn submit_post(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<PostResponse>, ApiError> {
    let body = body.map_err(|e| {
        log::error!("Error reading post body: {} ({})", e.body_text(), e.status());
        anyhow::anyhow!("Unreadable post request body: {}", e.body_text())
    })?;

    let request: PostRequest = serde_json::from_slice(&body).map_err(|e| {
        log::error!("Error posting: {}", e);
        anyhow::Error::new(e).context("Malformed post request body")
    })?;

    let submission = request.validate().map_err(|e| {
        log::warn!("Rejected post request: {}", e);
        e
    })?;

    Ok(Json(state.publishers.dispatch(submission).await))
}

pub async fn list_platforms(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "platforms": state.publishers.list_publishers() }))
}
