//! HTTP API server for the chat client
//!
//! This module provides a form-based API around the turn pipeline:
//! - POST /login - Verify credentials, start a session (sets cookie)
//! - GET /chat - Current conversation and options
//! - POST /chat - Submit a selection, recording, or typed question
//! - GET /logout - End the session
//! - GET /audio/* - Synthesized replies
//! - GET /health - Health check

mod cookie;
mod handlers;
mod routes;
mod state;

pub use cookie::SESSION_COOKIE;
pub use routes::create_router;
pub use state::AppState;
