//! Session state
//!
//! This module provides:
//! - `Turn` / `ConversationState`: the append-only conversation log
//! - `SessionStore`: load/append/replace/clear over session storage
//! - `IdentityVerifier`: login credential checks

mod identity;
mod store;
mod turn;

pub use identity::{CredentialFile, IdentityVerifier};
pub use store::{InMemorySessionStore, Session, SessionStore};
pub use turn::{ConversationState, Role, Turn};
