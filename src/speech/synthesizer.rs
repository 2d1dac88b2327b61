use anyhow::{bail, Context, Result};
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::SpeechConfig;

const SYNTHESIZE_URL: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";

/// Voice settings for synthesized replies
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceOptions {
    pub language_code: String,
    pub voice_name: String,
    /// 1.0 is normal speed; replies are slowed for clarity
    pub speaking_rate: f32,
}

impl From<&SpeechConfig> for VoiceOptions {
    fn from(config: &SpeechConfig) -> Self {
        Self {
            language_code: config.language_code.clone(),
            voice_name: config.voice_name.clone(),
            speaking_rate: config.speaking_rate,
        }
    }
}

/// Speech-synthesis collaborator; returns MP3 bytes
#[async_trait::async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, voice: &VoiceOptions) -> Result<Vec<u8>>;
}

/// Google Cloud Text-to-Speech over REST
pub struct GoogleTextToSpeech {
    client: Client,
    api_key: String,
    url: String,
}

impl GoogleTextToSpeech {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build text-to-speech HTTP client")?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            url: SYNTHESIZE_URL.to_string(),
        })
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfigPayload,
}

#[derive(Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfigPayload {
    audio_encoding: &'static str,
    speaking_rate: f32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

#[async_trait::async_trait]
impl SpeechSynthesizer for GoogleTextToSpeech {
    async fn synthesize(&self, text: &str, voice: &VoiceOptions) -> Result<Vec<u8>> {
        if self.api_key.is_empty() {
            bail!("Text-to-Speech API key not configured");
        }

        let body = SynthesizeRequest {
            input: SynthesisInput { text },
            voice: VoiceSelection {
                language_code: &voice.language_code,
                name: &voice.voice_name,
            },
            audio_config: AudioConfigPayload {
                audio_encoding: "MP3",
                speaking_rate: voice.speaking_rate,
            },
        };

        let response = self
            .client
            .post(&self.url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .context("Text-to-Speech request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            bail!("Text-to-Speech failed (HTTP {}): {}", status, text);
        }

        let parsed: SynthesizeResponse = response
            .json()
            .await
            .context("Failed to parse Text-to-Speech response")?;

        let audio = base64::engine::general_purpose::STANDARD
            .decode(parsed.audio_content)
            .context("Text-to-Speech returned invalid base64 audio")?;

        debug!("Text-to-Speech returned {} bytes", audio.len());

        Ok(audio)
    }
}
