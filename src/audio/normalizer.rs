use anyhow::{bail, Context, Result};
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, info};

use super::clip::{AudioClip, AudioEncoding};
use super::file::AudioFile;
use super::filter::{downmix_to_mono, FilterChain};
use crate::config::{AudioConfig, NormalizerKind};

/// Conditions an utterance before transcription.
///
/// Normalization is an enhancement only: callers treat any error as a cue to
/// transcribe the original clip instead.
///
/// Implementations:
/// - `FfmpegNormalizer`: ffmpeg filter graph, same container out as in
/// - `NativeNormalizer`: symphonia decode + in-process DSP, WAV out
#[async_trait::async_trait]
pub trait AudioNormalizer: Send + Sync {
    async fn normalize(&self, clip: &AudioClip) -> Result<AudioClip>;

    /// Name for logging
    fn name(&self) -> &str;
}

/// Build the normalizer selected in config
pub fn normalizer_from_config(config: &AudioConfig) -> Arc<dyn AudioNormalizer> {
    let chain = FilterChain {
        gain_db: config.gain_db,
        low_pass_hz: config.low_pass_hz,
        high_pass_hz: config.high_pass_hz,
    };

    match config.normalizer {
        NormalizerKind::Ffmpeg => Arc::new(FfmpegNormalizer::new(config.ffmpeg_path.clone(), chain)),
        NormalizerKind::Native => Arc::new(NativeNormalizer::new(chain)),
    }
}

/// In-process normalizer for containers symphonia can decode
pub struct NativeNormalizer {
    chain: FilterChain,
}

impl NativeNormalizer {
    pub fn new(chain: FilterChain) -> Self {
        Self { chain }
    }
}

#[async_trait::async_trait]
impl AudioNormalizer for NativeNormalizer {
    async fn normalize(&self, clip: &AudioClip) -> Result<AudioClip> {
        let bytes = clip.bytes.clone();
        let extension = clip.encoding.extension();
        let chain = self.chain;

        // Decoding and filtering are CPU-bound
        let normalized = tokio::task::spawn_blocking(move || -> Result<AudioFile> {
            let decoded = AudioFile::decode(&bytes, extension)?;
            let mut samples = downmix_to_mono(&decoded.samples, decoded.channels);
            chain.apply(&mut samples, decoded.sample_rate);

            Ok(AudioFile {
                duration_seconds: decoded.duration_seconds,
                sample_rate: decoded.sample_rate,
                channels: 1,
                samples,
            })
        })
        .await
        .context("Normalization task panicked")??;

        let wav = normalized.to_wav_bytes()?;

        info!(
            "Normalized {} bytes of {:?} into {} bytes of WAV ({}Hz)",
            clip.len(),
            clip.encoding,
            wav.len(),
            normalized.sample_rate
        );

        Ok(AudioClip::new(wav, AudioEncoding::Linear16, normalized.sample_rate))
    }

    fn name(&self) -> &str {
        "native"
    }
}

/// Normalizer that runs the filter chain through ffmpeg
pub struct FfmpegNormalizer {
    ffmpeg_path: String,
    chain: FilterChain,
}

impl FfmpegNormalizer {
    pub fn new(ffmpeg_path: impl Into<String>, chain: FilterChain) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            chain,
        }
    }

    fn output_codec(encoding: AudioEncoding) -> &'static str {
        match encoding {
            AudioEncoding::WebmOpus | AudioEncoding::OggOpus => "libopus",
            AudioEncoding::Linear16 => "pcm_s16le",
        }
    }
}

#[async_trait::async_trait]
impl AudioNormalizer for FfmpegNormalizer {
    async fn normalize(&self, clip: &AudioClip) -> Result<AudioClip> {
        let scratch = tempfile::tempdir().context("Failed to create scratch directory")?;
        let extension = clip.encoding.extension();
        let input = scratch.path().join(format!("input.{}", extension));
        let output = scratch.path().join(format!("normalized.{}", extension));

        tokio::fs::write(&input, &clip.bytes)
            .await
            .context("Failed to write upload to scratch file")?;

        let filter = self.chain.ffmpeg_filter();
        debug!("Running {} with filter {}", self.ffmpeg_path, filter);

        let result = Command::new(&self.ffmpeg_path)
            .arg("-y")
            .arg("-nostdin")
            .arg("-loglevel")
            .arg("error")
            .arg("-i")
            .arg(&input)
            .arg("-vn")
            .arg("-af")
            .arg(&filter)
            .arg("-c:a")
            .arg(Self::output_codec(clip.encoding))
            .arg("-ar")
            .arg(clip.sample_rate_hz.to_string())
            .arg(&output)
            .output()
            .await
            .with_context(|| format!("Failed to execute {}", self.ffmpeg_path))?;

        if !result.status.success() {
            bail!(
                "ffmpeg normalization failed: {}",
                String::from_utf8_lossy(&result.stderr).trim()
            );
        }

        let bytes = tokio::fs::read(&output)
            .await
            .context("Failed to read normalized audio")?;

        info!(
            "Normalized {} bytes into {} bytes ({:?})",
            clip.len(),
            bytes.len(),
            clip.encoding
        );

        Ok(AudioClip::new(bytes, clip.encoding, clip.sample_rate_hz))
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}
