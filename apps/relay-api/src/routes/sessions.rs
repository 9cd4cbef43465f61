//! Session CRUD endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{ApiError, ApiErrorBody, FieldError};
use crate::relay::registry::SessionInfo;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(create_session).get(list_sessions))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListSessionsResponse {
    pub sessions: Vec<SessionInfo>,
}

#[utoipa::path(
    post,
    path = "/api/sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Session created", body = SessionInfo),
        (status = 400, description = "Missing or empty name", body = ApiErrorBody),
    ),
    tag = "Sessions"
)]
pub async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionInfo>), ApiError> {
    let name = body.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::validation(vec![FieldError {
            field: "name".to_string(),
            message: "Session name is required".to_string(),
        }]));
    }

    let session = state.registry.create_session(name);
    tracing::info!(session_id = %session.id, "session created");
    Ok((StatusCode::CREATED, Json(session)))
}

#[utoipa::path(
    get,
    path = "/api/sessions",
    responses((status = 200, description = "All sessions", body = ListSessionsResponse)),
    tag = "Sessions"
)]
pub async fn list_sessions(State(state): State<AppState>) -> Json<ListSessionsResponse> {
    Json(ListSessionsResponse {
        sessions: state.registry.list_sessions(),
    })
}

#[utoipa::path(
    get,
    path = "/api/sessions/{id}",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "The session", body = SessionInfo),
        (status = 404, description = "Unknown session", body = ApiErrorBody),
    ),
    tag = "Sessions"
)]
pub async fn get_session(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<SessionInfo>, ApiError> {
    state
        .registry
        .get_session(&id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Session not found"))
}

#[utoipa::path(
    delete,
    path = "/api/sessions/{id}",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 204, description = "Session deleted"),
        (status = 404, description = "Unknown session", body = ApiErrorBody),
    ),
    tag = "Sessions"
)]
pub async fn delete_session(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    if state.registry.delete_session(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Session not found"))
    }
}
