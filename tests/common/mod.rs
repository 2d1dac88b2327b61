// Collaborator doubles and a controller harness shared by integration tests
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use base64::Engine;
use dysphasia_assist::audio::{AudioClip, AudioNormalizer};
use dysphasia_assist::options::TextGenerator;
use dysphasia_assist::speech::{
    RecognitionAlternative, RecognitionOptions, RecognitionResult, SpeechRecognizer,
    SpeechSynthesizer, VoiceOptions,
};
use dysphasia_assist::{
    InMemorySessionStore, OptionSynthesizer, SessionStore, Speaker, Transcriber, TurnController,
    TurnSettings,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const SEVEN_OPTIONS: &str = r#"["Yes", "No", "A little", "Only when moving", "It comes and goes", "I don't know", "NONE of the ABOVE"]"#;

/// Recognizer returning a fixed transcript (or failing), remembering what it heard
pub struct FakeRecognizer {
    transcript: Option<String>,
    pub heard: Mutex<Vec<AudioClip>>,
}

impl FakeRecognizer {
    pub fn hearing(transcript: &str) -> Arc<Self> {
        Arc::new(Self {
            transcript: Some(transcript.to_string()),
            heard: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            transcript: None,
            heard: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.heard.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl SpeechRecognizer for FakeRecognizer {
    async fn recognize(
        &self,
        clip: &AudioClip,
        _options: &RecognitionOptions,
    ) -> Result<Vec<RecognitionResult>> {
        self.heard.lock().unwrap().push(clip.clone());
        let transcript = self
            .transcript
            .clone()
            .ok_or_else(|| anyhow!("recognizer unavailable"))?;

        Ok(vec![RecognitionResult {
            alternatives: vec![RecognitionAlternative {
                transcript,
                confidence: Some(0.9),
            }],
        }])
    }
}

pub struct FakeSynthesizer {
    fail: bool,
}

impl FakeSynthesizer {
    pub fn working() -> Arc<Self> {
        Arc::new(Self { fail: false })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self { fail: true })
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for FakeSynthesizer {
    async fn synthesize(&self, text: &str, _voice: &VoiceOptions) -> Result<Vec<u8>> {
        if self.fail {
            return Err(anyhow!("synthesizer unavailable"));
        }
        Ok(format!("mp3:{}", text).into_bytes())
    }
}

/// Generator replaying canned replies in order (the last one repeats)
pub struct FakeGenerator {
    replies: Vec<Result<String, String>>,
    calls: AtomicUsize,
}

impl FakeGenerator {
    pub fn replying(text: &str) -> Arc<Self> {
        Self::sequence(vec![Ok(text.to_string())])
    }

    pub fn failing() -> Arc<Self> {
        Self::sequence(vec![Err("quota exceeded".to_string())])
    }

    pub fn sequence(replies: Vec<Result<String, String>>) -> Arc<Self> {
        Arc::new(Self {
            replies,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = &self.replies[n.min(self.replies.len() - 1)];
        reply.clone().map_err(|e| anyhow!(e))
    }
}

/// Normalizer that marks its output so tests can tell which clip was transcribed
pub struct TaggingNormalizer;

pub const NORMALIZED_TAG: &[u8] = b"normalized:";

#[async_trait::async_trait]
impl AudioNormalizer for TaggingNormalizer {
    async fn normalize(&self, clip: &AudioClip) -> Result<AudioClip> {
        let mut bytes = NORMALIZED_TAG.to_vec();
        bytes.extend_from_slice(&clip.bytes);
        Ok(AudioClip::new(bytes, clip.encoding, clip.sample_rate_hz))
    }

    fn name(&self) -> &str {
        "tagging"
    }
}

pub struct FailingNormalizer;

#[async_trait::async_trait]
impl AudioNormalizer for FailingNormalizer {
    async fn normalize(&self, _clip: &AudioClip) -> Result<AudioClip> {
        Err(anyhow!("decoder exploded"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

pub fn webm_data_uri(len: usize) -> String {
    format!(
        "data:audio/webm;codecs=opus;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(vec![7u8; len])
    )
}

pub struct Harness {
    pub controller: TurnController,
    pub store: Arc<InMemorySessionStore>,
    pub session_id: String,
    pub artifacts: TempDir,
}

pub struct HarnessBuilder {
    recognizer: Arc<dyn SpeechRecognizer>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    generator: Arc<dyn TextGenerator>,
    normalizer: Arc<dyn AudioNormalizer>,
    settings: TurnSettings,
    store: InMemorySessionStore,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            recognizer: FakeRecognizer::hearing("Are you in pain?"),
            synthesizer: FakeSynthesizer::working(),
            generator: FakeGenerator::replying(SEVEN_OPTIONS),
            normalizer: Arc::new(TaggingNormalizer),
            settings: TurnSettings::default(),
            store: InMemorySessionStore::new(),
        }
    }

    pub fn recognizer(mut self, recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        self.recognizer = recognizer;
        self
    }

    pub fn synthesizer(mut self, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub fn generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn normalizer(mut self, normalizer: Arc<dyn AudioNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn settings(mut self, settings: TurnSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn store(mut self, store: InMemorySessionStore) -> Self {
        self.store = store;
        self
    }

    pub async fn build(self) -> Harness {
        let artifacts = tempfile::tempdir().unwrap();
        let store = Arc::new(self.store);
        let session = store.create("client1").await;

        let sessions: Arc<dyn SessionStore> = store.clone();
        let controller = TurnController::new(
            sessions,
            self.normalizer,
            Transcriber::new(self.recognizer, test_recognition_options()),
            OptionSynthesizer::new(self.generator),
            Speaker::new(self.synthesizer, test_voice(), artifacts.path()),
            self.settings,
        );

        Harness {
            controller,
            store,
            session_id: session.id,
            artifacts,
        }
    }
}

pub fn test_recognition_options() -> RecognitionOptions {
    RecognitionOptions {
        language_code: "en-US".to_string(),
        model: "latest_short".to_string(),
        use_enhanced: true,
        enable_automatic_punctuation: true,
        phrase_hints: vec!["are you in pain".to_string()],
    }
}

pub fn test_voice() -> VoiceOptions {
    VoiceOptions {
        language_code: "en-US".to_string(),
        voice_name: "en-US-Wavenet-D".to_string(),
        speaking_rate: 0.8,
    }
}
