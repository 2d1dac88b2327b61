//! Turn processing
//!
//! Classifies a chat request (selection, recorded audio, typed text), runs
//! normalize → transcribe → generate options or synthesize the reply, and
//! records the resulting turns in the session.

mod controller;
mod event;

pub use controller::{
    TurnController, TurnSettings, GENERIC_RETRY_MESSAGE, NORMALIZATION_NOTICE, NO_SPEECH_MESSAGE,
    SELECT_PROMPT,
};
pub use event::{ChatForm, InboundEvent, RenderModel};
