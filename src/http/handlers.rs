use super::cookie;
use super::state::AppState;
use crate::error::{AudioInputError, SessionError};
use crate::pipeline::{ChatForm, InboundEvent, RenderModel};
use axum::{
    extract::{rejection::FormRejection, Form, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub username: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

fn unauthorized() -> Response {
    error_response(StatusCode::UNAUTHORIZED, "Not logged in")
}

fn render(result: Result<RenderModel, SessionError>) -> Response {
    match result {
        Ok(model) => (StatusCode::OK, Json(model)).into_response(),
        Err(SessionError::NotFound(id)) => {
            warn!("Unauthorized access with unknown session {}", id);
            unauthorized()
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /login
/// Verify credentials and start a session
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Response {
    let username = form.username.trim();

    if !state.identity.verify(username, &form.password).await {
        return error_response(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }

    // A re-login replaces whatever session the browser still holds
    if let Some(previous) = cookie::session_id(&headers) {
        if state.controller.end_session(&previous).await.is_ok() {
            info!("Replaced previous session for {}", username);
        }
    }

    let session = state.sessions.create(username).await;
    info!("User {} logged in", username);

    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie::session_cookie(&session.id))],
        Json(LoginResponse {
            username: session.identity,
            message: "Logged in".to_string(),
        }),
    )
        .into_response()
}

/// GET /chat
/// Current conversation and offered options
pub async fn get_chat(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(session_id) = cookie::session_id(&headers) else {
        warn!("Unauthorized access to /chat");
        return unauthorized();
    };

    render(state.controller.view(&session_id).await)
}

/// POST /chat
/// Process one turn: option selection, recorded audio, or typed text
pub async fn post_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<ChatForm>, FormRejection>,
) -> Response {
    let Some(session_id) = cookie::session_id(&headers) else {
        warn!("Unauthorized access to /chat");
        return unauthorized();
    };

    let result = match form {
        Ok(Form(form)) => state.controller.handle(&session_id, InboundEvent::from(form)).await,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            let reason = AudioInputError::RequestTooLarge {
                limit: state.body_limit,
            };
            state.controller.reject_upload(&session_id, reason).await
        }
        Err(rejection) => {
            warn!("Unreadable chat form: {}", rejection.body_text());
            state
                .controller
                .handle(&session_id, InboundEvent::Text(String::new()))
                .await
        }
    };

    render(result)
}

/// GET /logout
/// Destroy the session and expire the cookie
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(session_id) = cookie::session_id(&headers) {
        if let Err(e) = state.controller.end_session(&session_id).await {
            error!("Failed to clear session: {}", e);
        }
    }

    info!("User logged out");

    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie::expired_session_cookie())],
        Json(LogoutResponse {
            message: "Logged out".to_string(),
        }),
    )
        .into_response()
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
