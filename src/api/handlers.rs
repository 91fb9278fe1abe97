//! HTTP request handlers

use super::types::{
    CategoriesResponse, ErrorResponse, MessageRequest, MessageResponse, RESPONDENT_HEADER,
};
use super::AppState;
use crate::runtime::ExportError;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Inbound respondent messages
        .route("/api/respondents/:id/messages", post(post_message))
        // Category menu
        .route("/api/categories", get(list_categories))
        // Admin export
        .route("/api/export", get(export_reports))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Messages
// ============================================================

async fn post_message(
    State(state): State<AppState>,
    Path(respondent_id): Path<String>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if respondent_id.trim().is_empty() {
        return Err(AppError::BadRequest("Respondent id is required".to_string()));
    }

    let turn = state
        .sessions
        .handle_message(&respondent_id, &req.text)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(MessageResponse {
        prompts: turn.prompts,
        terminated: turn.terminated,
    }))
}

async fn list_categories(State(state): State<AppState>) -> Json<CategoriesResponse> {
    let categories = state
        .sessions
        .catalog()
        .list_categories()
        .into_iter()
        .map(String::from)
        .collect();
    Json(CategoriesResponse { categories })
}

// ============================================================
// Export
// ============================================================

async fn export_reports(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let requester = headers
        .get(RESPONDENT_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Forbidden("Missing respondent id".to_string()))?;

    let artifact = state.sessions.export(requester).await.map_err(|e| match e {
        ExportError::Forbidden(_) => AppError::Forbidden(e.to_string()),
        ExportError::Sink(_) => AppError::Internal(e.to_string()),
    })?;

    if artifact.record_count == 0 {
        return Err(AppError::NotFound("No data to export yet".to_string()));
    }

    let disposition = format!("attachment; filename=\"{}\"", artifact.filename);
    Ok((
        [
            (header::CONTENT_TYPE, artifact.content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    )
        .into_response())
}

async fn get_version() -> &'static str {
    concat!("symptom-survey ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    Forbidden(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
