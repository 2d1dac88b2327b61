use anyhow::{bail, Context, Result};
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::audio::{AudioClip, AudioEncoding};
use crate::config::SpeechConfig;

const RECOGNIZE_URL: &str = "https://speech.googleapis.com/v1p1beta1/speech:recognize";

/// Everything the recognizer needs besides the audio itself
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionOptions {
    pub language_code: String,
    pub model: String,
    pub use_enhanced: bool,
    pub enable_automatic_punctuation: bool,
    pub phrase_hints: Vec<String>,
}

impl From<&SpeechConfig> for RecognitionOptions {
    fn from(config: &SpeechConfig) -> Self {
        Self {
            language_code: config.language_code.clone(),
            model: config.model.clone(),
            use_enhanced: config.use_enhanced,
            enable_automatic_punctuation: config.enable_automatic_punctuation,
            phrase_hints: config.phrase_hints.clone(),
        }
    }
}

/// One recognized segment, alternatives ordered most likely first
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RecognitionResult {
    #[serde(default)]
    pub alternatives: Vec<RecognitionAlternative>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RecognitionAlternative {
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub confidence: Option<f32>,
}

/// Speech-recognition collaborator
#[async_trait::async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn recognize(
        &self,
        clip: &AudioClip,
        options: &RecognitionOptions,
    ) -> Result<Vec<RecognitionResult>>;
}

/// Google Cloud Speech-to-Text over REST
pub struct GoogleSpeechRecognizer {
    client: Client,
    api_key: String,
    url: String,
}

impl GoogleSpeechRecognizer {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build speech HTTP client")?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            url: RECOGNIZE_URL.to_string(),
        })
    }

    /// Point at a different endpoint (emulators, proxies)
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognizeRequest<'a> {
    config: RecognitionConfigPayload<'a>,
    audio: RecognitionAudioPayload,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfigPayload<'a> {
    encoding: AudioEncoding,
    sample_rate_hertz: u32,
    language_code: &'a str,
    model: &'a str,
    use_enhanced: bool,
    enable_automatic_punctuation: bool,
    speech_contexts: Vec<SpeechContextPayload<'a>>,
}

#[derive(Serialize)]
struct SpeechContextPayload<'a> {
    phrases: &'a [String],
}

#[derive(Serialize)]
struct RecognitionAudioPayload {
    content: String,
}

#[derive(Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[async_trait::async_trait]
impl SpeechRecognizer for GoogleSpeechRecognizer {
    async fn recognize(
        &self,
        clip: &AudioClip,
        options: &RecognitionOptions,
    ) -> Result<Vec<RecognitionResult>> {
        if self.api_key.is_empty() {
            bail!("Speech API key not configured");
        }

        let body = RecognizeRequest {
            config: RecognitionConfigPayload {
                encoding: clip.encoding,
                sample_rate_hertz: clip.sample_rate_hz,
                language_code: &options.language_code,
                model: &options.model,
                use_enhanced: options.use_enhanced,
                enable_automatic_punctuation: options.enable_automatic_punctuation,
                speech_contexts: vec![SpeechContextPayload {
                    phrases: &options.phrase_hints,
                }],
            },
            audio: RecognitionAudioPayload {
                content: base64::engine::general_purpose::STANDARD.encode(&clip.bytes),
            },
        };

        let response = self
            .client
            .post(&self.url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .context("Speech-to-Text request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            bail!("Speech-to-Text failed (HTTP {}): {}", status, text);
        }

        let parsed: RecognizeResponse = response
            .json()
            .await
            .context("Failed to parse Speech-to-Text response")?;

        debug!("Speech-to-Text returned {} results", parsed.results.len());

        Ok(parsed.results)
    }
}
