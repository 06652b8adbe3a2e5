use super::state::AppState;
use crate::error::{ErrorKind, SessionError};
use crate::presentation::{PresentationAdapter, UiIntent, ViewState};
use crate::session::{ErrorSlot, SessionConfig, SessionController, SessionStats};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub session_id: String,
    pub view: ViewState,
}

#[derive(Debug, Serialize)]
pub struct StopSessionResponse {
    pub session_id: String,
    pub view: ViewState,
    pub stats: SessionStats,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

fn error_response(status: StatusCode, error: String, kind: Option<ErrorKind>) -> Response {
    (status, Json(ErrorResponse { error, kind })).into_response()
}

fn not_found(session_id: &str) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        format!("Session {} not found", session_id),
        None,
    )
}

fn session_error_status(err: &SessionError) -> StatusCode {
    match err {
        SessionError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
        SessionError::AlreadyStarted { .. } => StatusCode::CONFLICT,
        SessionError::RemoteRejected { .. }
        | SessionError::Transport(_)
        | SessionError::MalformedResponse(_)
        | SessionError::Collaborator(_) => StatusCode::BAD_GATEWAY,
        SessionError::NoRuntime => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /sessions/start
/// Create a fresh controller for the given config and start it
pub async fn start_session(
    State(state): State<AppState>,
    Json(config): Json<SessionConfig>,
) -> Response {
    let session_id = config.session_id.clone();
    info!("Starting session: {}", session_id);

    // A finished session keeps its slot only until the id is reused
    let mut sessions = state.sessions.write().await;
    if let Some(existing) = sessions.get(&session_id) {
        let status = existing.view().status;
        if !status.is_terminal() {
            return error_response(
                StatusCode::CONFLICT,
                format!("Session {} is already live ({})", session_id, status),
                None,
            );
        }
        info!("Replacing {} session {}", status, session_id);
        sessions.remove(&session_id);
    }

    let controller = match SessionController::new(
        config,
        Arc::clone(&state.credentials),
        Arc::clone(&state.media),
        state.options.clone(),
    ) {
        Ok(controller) => Arc::new(controller),
        Err(e) => {
            error!("Failed to create session {}: {}", session_id, e);
            return error_response(session_error_status(&e), e.to_string(), Some(e.kind()));
        }
    };

    let adapter = Arc::new(PresentationAdapter::new(controller));
    if let Err(e) = adapter.dispatch(UiIntent::Start).await {
        error!("Failed to start session {}: {}", session_id, e);
        return error_response(session_error_status(&e), e.to_string(), Some(e.kind()));
    }

    let view = adapter.view();
    sessions.insert(session_id.clone(), adapter);

    (
        StatusCode::OK,
        Json(StartSessionResponse { session_id, view }),
    )
        .into_response()
}

/// POST /sessions/:session_id/stop
/// Stop a session and forget it; a new conversation needs a new session
pub async fn stop_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    info!("Stopping session: {}", session_id);

    let adapter = {
        let mut sessions = state.sessions.write().await;
        sessions.remove(&session_id)
    };

    match adapter {
        Some(adapter) => {
            if let Err(e) = adapter.dispatch(UiIntent::Stop).await {
                error!("Failed to stop session {}: {}", session_id, e);
                return error_response(session_error_status(&e), e.to_string(), Some(e.kind()));
            }

            (
                StatusCode::OK,
                Json(StopSessionResponse {
                    session_id,
                    view: adapter.view(),
                    stats: adapter.stats(),
                }),
            )
                .into_response()
        }
        None => not_found(&session_id),
    }
}

/// GET /sessions/:session_id/status
pub async fn get_session_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    let sessions = state.sessions.read().await;

    match sessions.get(&session_id) {
        Some(adapter) => (StatusCode::OK, Json(adapter.view())).into_response(),
        None => not_found(&session_id),
    }
}

/// DELETE /sessions/:session_id/errors/:slot
/// Dismiss one error slot, leaving the others in place
pub async fn dismiss_error(
    State(state): State<AppState>,
    Path((session_id, slot)): Path<(String, ErrorSlot)>,
) -> Response {
    let adapter = {
        let sessions = state.sessions.read().await;
        sessions.get(&session_id).cloned()
    };

    match adapter {
        Some(adapter) => match adapter.dispatch(UiIntent::DismissError(slot)).await {
            Ok(()) => (StatusCode::OK, Json(adapter.view())).into_response(),
            Err(e) => error_response(session_error_status(&e), e.to_string(), Some(e.kind())),
        },
        None => not_found(&session_id),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
