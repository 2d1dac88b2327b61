//! Speech in and out
//!
//! Collaborator traits (`SpeechRecognizer`, `SpeechSynthesizer`) with Google
//! Cloud REST implementations, and the never-failing components built on
//! them: `Transcriber` and `Speaker`.

mod recognizer;
mod speaker;
mod synthesizer;
mod transcriber;

pub use recognizer::{
    GoogleSpeechRecognizer, RecognitionAlternative, RecognitionOptions, RecognitionResult,
    SpeechRecognizer,
};
pub use speaker::{AudioArtifact, Speaker};
pub use synthesizer::{GoogleTextToSpeech, SpeechSynthesizer, VoiceOptions};
pub use transcriber::{join_top_alternatives, Transcriber};
