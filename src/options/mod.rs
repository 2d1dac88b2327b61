//! Reply options for the patient
//!
//! - `OptionSet`: the validated seven-item, sentinel-terminated list
//! - `TextGenerator`: generative-text collaborator (Gemini over REST)
//! - `OptionSynthesizer`: prompt, parse, validate, fall back

mod generator;
mod option_set;
mod synthesizer;

pub use generator::{GeminiTextGenerator, TextGenerator};
pub use option_set::{
    is_sentinel, OptionSet, FALLBACK_OPTIONS, OPTION_COUNT, RETRY_OPTIONS, SENTINEL,
};
pub use synthesizer::{build_prompt, parse_options, OptionSynthesizer};
