use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

/// Which normalizer conditions uploads before transcription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizerKind {
    /// Shell out to ffmpeg, keeping the upload's container
    Ffmpeg,
    /// Decode with symphonia and filter in-process, emitting WAV
    Native,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Uploads smaller than this are rejected as empty or invalid
    pub min_upload_bytes: usize,
    /// Decoded uploads larger than this are rejected
    pub max_upload_bytes: usize,
    pub gain_db: f32,
    pub low_pass_hz: f32,
    pub high_pass_hz: f32,
    pub normalizer: NormalizerKind,
    pub ffmpeg_path: String,
    /// Directory synthesized replies are written to (served under /audio)
    pub artifacts_path: String,
    /// Keep a copy of every accepted upload for debugging
    pub retain_uploads: bool,
    pub uploads_path: String,
}

impl AudioConfig {
    /// Request body cap for `/chat`, leaving room for base64 and form encoding
    pub fn request_body_limit(&self) -> usize {
        self.max_upload_bytes.saturating_mul(2)
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            min_upload_bytes: 1000,
            max_upload_bytes: 10 * 1024 * 1024,
            gain_db: 15.0,
            low_pass_hz: 2000.0,
            high_pass_hz: 150.0,
            normalizer: NormalizerKind::Ffmpeg,
            ffmpeg_path: "ffmpeg".to_string(),
            artifacts_path: "static/audio".to_string(),
            retain_uploads: false,
            uploads_path: "static/uploads".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub api_key: String,
    pub language_code: String,
    pub sample_rate_hz: u32,
    pub model: String,
    pub use_enhanced: bool,
    pub enable_automatic_punctuation: bool,
    /// Recognition hints biasing results toward clinical dialogue
    pub phrase_hints: Vec<String>,
    pub voice_name: String,
    pub speaking_rate: f32,
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            language_code: "en-US".to_string(),
            sample_rate_hz: 48000,
            model: "latest_short".to_string(),
            use_enhanced: true,
            enable_automatic_punctuation: true,
            phrase_hints: [
                "how are you feeling",
                "are you in pain",
                "what symptoms",
                "need help",
                "hard to talk",
                "doctor",
                "patient",
            ]
            .iter()
            .map(|p| p.to_string())
            .collect(),
            voice_name: "en-US-Wavenet-D".to_string(),
            speaking_rate: 0.8,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub api_key: String,
    pub model: String,
    /// How many times the model is asked before the fallback options are used
    pub max_attempts: u32,
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-1.5-flash".to_string(),
            max_attempts: 1,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub credentials_file: String,
    /// Sessions untouched for this long are expired; 0 disables expiry
    pub session_idle_secs: u64,
    /// How often expired sessions are swept
    pub session_sweep_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            credentials_file: "config/credentials.toml".to_string(),
            session_idle_secs: 3600,
            session_sweep_secs: 60,
        }
    }
}

impl Config {
    /// Load from a TOML file, with `DYSPHASIA_<SECTION>__<KEY>` environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("DYSPHASIA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read config from {}", path))?;

        Ok(settings.try_deserialize()?)
    }
}
