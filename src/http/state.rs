use crate::pipeline::TurnController;
use crate::session::{IdentityVerifier, SessionStore};
use std::path::PathBuf;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Active sessions (session id → conversation and options)
    pub sessions: Arc<dyn SessionStore>,

    /// Login credential check
    pub identity: Arc<dyn IdentityVerifier>,

    /// Turn pipeline; shares `sessions`
    pub controller: Arc<TurnController>,

    /// Synthesized replies, served under /audio
    pub artifacts_dir: PathBuf,

    /// Largest accepted request body, in bytes
    pub body_limit: usize,
}

/// Room for a 10 MiB recording after base64 and form encoding
pub const DEFAULT_BODY_LIMIT: usize = 20 * 1024 * 1024;

impl AppState {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        identity: Arc<dyn IdentityVerifier>,
        controller: Arc<TurnController>,
        artifacts_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            sessions,
            identity,
            controller,
            artifacts_dir: artifacts_dir.into(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    pub fn with_body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }
}
