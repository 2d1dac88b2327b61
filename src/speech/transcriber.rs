use std::sync::Arc;
use tracing::{error, info};

use super::recognizer::{RecognitionOptions, RecognitionResult, SpeechRecognizer};
use crate::audio::AudioClip;

/// Turns an utterance into text, never failing.
///
/// An empty transcript means "nothing understood", whether the recognizer
/// heard silence or errored.
pub struct Transcriber {
    recognizer: Arc<dyn SpeechRecognizer>,
    options: RecognitionOptions,
}

impl Transcriber {
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>, options: RecognitionOptions) -> Self {
        Self {
            recognizer,
            options,
        }
    }

    pub async fn transcribe(&self, clip: &AudioClip) -> String {
        match self.recognizer.recognize(clip, &self.options).await {
            Ok(results) => {
                let transcript = join_top_alternatives(&results);
                info!("Speech-to-Text transcript: {:?}", transcript);
                transcript
            }
            Err(e) => {
                error!("Speech-to-Text error: {:#}", e);
                String::new()
            }
        }
    }
}

/// Concatenate the best alternative of every result, trimmed
pub fn join_top_alternatives(results: &[RecognitionResult]) -> String {
    results
        .iter()
        .filter_map(|r| r.alternatives.first())
        .map(|a| a.transcript.as_str())
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::RecognitionAlternative;

    fn result(alternatives: &[&str]) -> RecognitionResult {
        RecognitionResult {
            alternatives: alternatives
                .iter()
                .map(|t| RecognitionAlternative {
                    transcript: t.to_string(),
                    confidence: None,
                })
                .collect(),
        }
    }

    #[test]
    fn test_joins_first_alternative_only() {
        let results = vec![
            result(&["Are you", "Our you"]),
            result(&[]),
            result(&[" in pain? ", "in plain"]),
        ];
        assert_eq!(join_top_alternatives(&results), "Are you in pain?");
    }

    #[test]
    fn test_no_results_is_empty() {
        assert_eq!(join_top_alternatives(&[]), "");
    }
}
