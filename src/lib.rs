pub mod audio;
pub mod config;
pub mod error;
pub mod http;
pub mod options;
pub mod pipeline;
pub mod session;
pub mod speech;

pub use audio::{AudioClip, AudioEncoding, AudioNormalizer, FilterChain};
pub use config::Config;
pub use error::{AudioInputError, OptionSetError, SessionError};
pub use http::{create_router, AppState};
pub use options::{OptionSet, OptionSynthesizer, TextGenerator};
pub use pipeline::{ChatForm, InboundEvent, RenderModel, TurnController, TurnSettings};
pub use session::{
    ConversationState, CredentialFile, IdentityVerifier, InMemorySessionStore, Role, Session,
    SessionStore, Turn,
};
pub use speech::{Speaker, SpeechRecognizer, SpeechSynthesizer, Transcriber};
