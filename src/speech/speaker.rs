use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::synthesizer::{SpeechSynthesizer, VoiceOptions};

/// A synthesized reply stored on disk and served under `/audio`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioArtifact {
    pub file_name: String,
    pub url: String,
}

/// Voices the patient's chosen reply.
///
/// Each artifact gets its own file so concurrent sessions never overwrite
/// each other's audio.
pub struct Speaker {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    voice: VoiceOptions,
    artifacts_dir: PathBuf,
}

impl Speaker {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        voice: VoiceOptions,
        artifacts_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            synthesizer,
            voice,
            artifacts_dir: artifacts_dir.into(),
        }
    }

    /// Synthesize `text` and store it; `None` if anything fails.
    ///
    /// `key` identifies the turn and prefixes the file name.
    pub async fn speak(&self, text: &str, key: &str) -> Option<AudioArtifact> {
        let audio = match self.synthesizer.synthesize(text, &self.voice).await {
            Ok(audio) => audio,
            Err(e) => {
                error!("Text-to-Speech error: {:#}", e);
                return None;
            }
        };

        let file_name = format!("{}-{}.mp3", key, uuid::Uuid::new_v4());
        let path = self.artifacts_dir.join(&file_name);

        if let Err(e) = tokio::fs::create_dir_all(&self.artifacts_dir).await {
            error!(
                "Failed to create artifacts directory {}: {}",
                self.artifacts_dir.display(),
                e
            );
            return None;
        }

        if let Err(e) = tokio::fs::write(&path, &audio).await {
            error!("Failed to write audio artifact {}: {}", path.display(), e);
            return None;
        }

        info!("Audio response saved to {} ({} bytes)", path.display(), audio.len());

        Some(AudioArtifact {
            url: format!("/audio/{}", file_name),
            file_name,
        })
    }

    /// Delete reply files that are no longer needed
    pub async fn discard(&self, file_names: &[String]) {
        for file_name in file_names {
            let path = self.artifacts_dir.join(file_name);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => info!("Removed audio artifact {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove audio artifact {}: {}", path.display(), e),
            }
        }
    }
}
