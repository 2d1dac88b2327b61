use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::event::{InboundEvent, RenderModel};
use crate::audio::{AudioClip, AudioNormalizer};
use crate::config::{AudioConfig, SpeechConfig};
use crate::error::{AudioInputError, SessionError};
use crate::options::{OptionSet, OptionSynthesizer};
use crate::session::{Session, SessionStore, Turn};
use crate::speech::{Speaker, Transcriber};

pub const SELECT_PROMPT: &str = "Please select an option.";
pub const NO_SPEECH_MESSAGE: &str = "No speech detected. Please speak louder or check microphone.";
pub const GENERIC_RETRY_MESSAGE: &str =
    "Sorry, I didn't catch that. Please try again or type something.";
pub const NORMALIZATION_NOTICE: &str = "Audio processing issue, using original audio.";

/// Knobs for audio intake
#[derive(Debug, Clone)]
pub struct TurnSettings {
    /// Uploads below this size are rejected before any processing
    pub min_upload_bytes: usize,

    /// Decoded uploads above this size are rejected
    pub max_upload_bytes: usize,

    /// Rate assumed for Opus uploads
    pub default_sample_rate_hz: u32,

    /// Where accepted uploads are copied, if anywhere
    pub retain_uploads_dir: Option<PathBuf>,
}

impl TurnSettings {
    pub fn from_config(audio: &AudioConfig, speech: &SpeechConfig) -> Self {
        Self {
            min_upload_bytes: audio.min_upload_bytes,
            max_upload_bytes: audio.max_upload_bytes,
            default_sample_rate_hz: speech.sample_rate_hz,
            retain_uploads_dir: audio
                .retain_uploads
                .then(|| PathBuf::from(&audio.uploads_path)),
        }
    }
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self {
            min_upload_bytes: 1000,
            max_upload_bytes: 10 * 1024 * 1024,
            default_sample_rate_hz: 48000,
            retain_uploads_dir: None,
        }
    }
}

fn audio_diagnostic(error: &AudioInputError) -> String {
    format!("Failed to process audio: {}. Please try again.", error)
}

/// Result of handling a doctor's input, before rendering
#[derive(Debug, Default)]
struct DoctorOutcome {
    /// New options, present only when an utterance was accepted
    options: Option<OptionSet>,

    /// Why nothing was accepted, shown instead of the generic retry text
    diagnostic: Option<String>,

    notice: Option<String>,
}

/// Drives one chat request from classified input to render model.
///
/// Precedence when a doctor turn fails: an input-validation diagnostic beats
/// "no speech detected", which beats the generic retry message. The
/// normalization advisory is reported separately in `notice`.
///
/// Collaborator failures never surface as errors; the only error is a
/// session that disappeared from the store.
pub struct TurnController {
    sessions: Arc<dyn SessionStore>,
    normalizer: Arc<dyn AudioNormalizer>,
    transcriber: Transcriber,
    options: OptionSynthesizer,
    speaker: Speaker,
    settings: TurnSettings,
}

impl TurnController {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        normalizer: Arc<dyn AudioNormalizer>,
        transcriber: Transcriber,
        options: OptionSynthesizer,
        speaker: Speaker,
        settings: TurnSettings,
    ) -> Self {
        Self {
            sessions,
            normalizer,
            transcriber,
            options,
            speaker,
            settings,
        }
    }

    /// Current state without processing any input
    pub async fn view(&self, session_id: &str) -> Result<RenderModel, SessionError> {
        let session = self.load(session_id).await?;

        Ok(RenderModel {
            message: String::new(),
            audio_artifact: None,
            options: session.options.map(OptionSet::into_vec).unwrap_or_default(),
            conversation: session.conversation.turns().to_vec(),
            notice: None,
        })
    }

    pub async fn handle(
        &self,
        session_id: &str,
        event: InboundEvent,
    ) -> Result<RenderModel, SessionError> {
        let session = self.load(session_id).await?;

        let outcome = match event {
            InboundEvent::Selection(choice) => return self.handle_selection(&session, choice).await,
            InboundEvent::Audio(data_uri) => self.handle_audio(&session, &data_uri).await?,
            InboundEvent::Text(text) => self.handle_text(&session, &text).await?,
        };

        self.render_doctor_outcome(&session, outcome).await
    }

    /// Answer an upload rejected before it reached the pipeline
    pub async fn reject_upload(
        &self,
        session_id: &str,
        reason: AudioInputError,
    ) -> Result<RenderModel, SessionError> {
        let session = self.load(session_id).await?;
        error!("Audio processing error: {}", reason);

        let outcome = DoctorOutcome {
            diagnostic: Some(audio_diagnostic(&reason)),
            ..Default::default()
        };
        self.render_doctor_outcome(&session, outcome).await
    }

    /// Destroy a session and the reply audio made for it
    pub async fn end_session(&self, session_id: &str) -> Result<(), SessionError> {
        let session = self.sessions.clear(session_id).await?;
        self.speaker.discard(&session.artifacts).await;
        Ok(())
    }

    /// Sweep idle sessions; returns how many were removed
    pub async fn expire_idle_sessions(&self) -> usize {
        let expired = self.sessions.expire_idle().await;
        for session in &expired {
            self.speaker.discard(&session.artifacts).await;
        }
        expired.len()
    }

    async fn render_doctor_outcome(
        &self,
        session: &Session,
        outcome: DoctorOutcome,
    ) -> Result<RenderModel, SessionError> {
        let (message, options) = match outcome.options {
            Some(options) => (SELECT_PROMPT.to_string(), options),
            None => {
                let message = outcome
                    .diagnostic
                    .unwrap_or_else(|| GENERIC_RETRY_MESSAGE.to_string());
                info!("Session {}: nothing accepted, offering retry options", session.id);
                (message, OptionSet::retry())
            }
        };

        let conversation = self.load(&session.id).await?.conversation.turns().to_vec();

        Ok(RenderModel {
            message,
            audio_artifact: None,
            options: options.into_vec(),
            conversation,
            notice: outcome.notice,
        })
    }

    async fn load(&self, session_id: &str) -> Result<Session, SessionError> {
        self.sessions
            .load(session_id)
            .await
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))
    }

    async fn handle_selection(
        &self,
        session: &Session,
        choice: String,
    ) -> Result<RenderModel, SessionError> {
        info!("Patient selected option: {}", choice);

        if !session.options.as_ref().is_some_and(|o| o.contains(&choice)) {
            warn!("Selection {:?} was not among the offered options", choice);
        }

        let turn_index = self
            .sessions
            .append_turn(&session.id, Turn::patient(choice.clone()))
            .await?;
        self.sessions.replace_options(&session.id, None).await?;

        let artifact = self
            .speaker
            .speak(&choice, &format!("reply-{}", turn_index))
            .await;
        if let Some(artifact) = &artifact {
            self.sessions
                .record_artifact(&session.id, &artifact.file_name)
                .await?;
        }

        let conversation = self.load(&session.id).await?.conversation.turns().to_vec();

        Ok(RenderModel {
            message: choice,
            audio_artifact: artifact.map(|a| a.url),
            options: Vec::new(),
            conversation,
            notice: None,
        })
    }

    async fn handle_audio(
        &self,
        session: &Session,
        data_uri: &str,
    ) -> Result<DoctorOutcome, SessionError> {
        let clip = match AudioClip::from_data_uri(data_uri, self.settings.default_sample_rate_hz)
            .and_then(|clip| {
                clip.ensure_min_size(self.settings.min_upload_bytes)?;
                clip.ensure_max_size(self.settings.max_upload_bytes)?;
                Ok(clip)
            }) {
            Ok(clip) => clip,
            Err(e) => {
                error!("Audio processing error: {}", e);
                return Ok(DoctorOutcome {
                    diagnostic: Some(audio_diagnostic(&e)),
                    ..Default::default()
                });
            }
        };

        info!("Audio received: {} bytes ({:?})", clip.len(), clip.encoding);
        self.retain_upload(session, &clip).await;

        let (transcript, notice) = match self.normalizer.normalize(&clip).await {
            Ok(normalized) => (self.transcriber.transcribe(&normalized).await, None),
            Err(e) => {
                warn!("Audio normalization ({}) failed: {:#}", self.normalizer.name(), e);
                info!("Falling back to original audio");
                (
                    self.transcriber.transcribe(&clip).await,
                    Some(NORMALIZATION_NOTICE.to_string()),
                )
            }
        };

        if transcript.is_empty() {
            return Ok(DoctorOutcome {
                diagnostic: Some(NO_SPEECH_MESSAGE.to_string()),
                notice,
                ..Default::default()
            });
        }

        let mut outcome = self.accept_question(session, transcript).await?;
        outcome.notice = notice;
        Ok(outcome)
    }

    async fn handle_text(&self, session: &Session, text: &str) -> Result<DoctorOutcome, SessionError> {
        let text = text.trim();
        info!("Text input received: {:?}", text);

        if text.is_empty() {
            return Ok(DoctorOutcome::default());
        }

        self.accept_question(session, text.to_string()).await
    }

    /// Record the doctor's question and offer fresh options for it
    async fn accept_question(
        &self,
        session: &Session,
        question: String,
    ) -> Result<DoctorOutcome, SessionError> {
        self.sessions
            .append_turn(&session.id, Turn::doctor(question.clone()))
            .await?;

        let options = self.options.synthesize(&question).await;
        self.sessions
            .replace_options(&session.id, Some(options.clone()))
            .await?;

        Ok(DoctorOutcome {
            options: Some(options),
            ..Default::default()
        })
    }

    async fn retain_upload(&self, session: &Session, clip: &AudioClip) {
        let Some(dir) = &self.settings.retain_uploads_dir else {
            return;
        };

        let file_name = format!(
            "upload-{}-{}.{}",
            session.conversation.len(),
            uuid::Uuid::new_v4(),
            clip.encoding.extension()
        );
        let path = dir.join(file_name);

        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            warn!("Failed to create uploads directory {}: {}", dir.display(), e);
            return;
        }

        match tokio::fs::write(&path, &clip.bytes).await {
            Ok(()) => info!("Audio saved to {}, size: {} bytes", path.display(), clip.len()),
            Err(e) => warn!("Failed to retain upload at {}: {}", path.display(), e),
        }
    }
}
