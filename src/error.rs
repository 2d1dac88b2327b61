//! Typed errors at module boundaries.
//!
//! Plumbing uses `anyhow`; these enums exist where callers branch on the
//! failure kind or show it to a user.

use thiserror::Error;

/// Rejections of an uploaded utterance before any processing happens.
///
/// The `Display` text is shown to the doctor as part of the diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioInputError {
    #[error("Audio payload is not a data URI")]
    MalformedDataUri,

    #[error("Audio payload is not valid base64: {0}")]
    InvalidBase64(String),

    #[error("Audio file is too small, likely empty or invalid")]
    TooSmall { size: usize, min: usize },

    #[error("Audio file is too large ({size} bytes, limit {max})")]
    TooLarge { size: usize, max: usize },

    #[error("Upload exceeds the {limit}-byte request limit")]
    RequestTooLarge { limit: usize },
}

/// A candidate option list that breaks the seven-and-sentinel contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionSetError {
    #[error("expected {expected} options, got {actual}")]
    WrongLength { expected: usize, actual: usize },

    #[error("last option must be the sentinel, got {0:?}")]
    MissingSentinel(String),

    #[error("option {0} is empty")]
    EmptyOption(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Session {0} not found")]
    NotFound(String),
}
