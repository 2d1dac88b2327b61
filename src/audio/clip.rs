use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::AudioInputError;

/// Wire encodings understood by the speech-recognition collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudioEncoding {
    /// Opus in a WebM container (browser MediaRecorder default)
    WebmOpus,
    /// Opus in an Ogg container
    OggOpus,
    /// 16-bit little-endian PCM in a WAV container
    Linear16,
}

impl AudioEncoding {
    /// Map a data-URI MIME type (parameters ignored) to an encoding.
    ///
    /// Unknown types are assumed to be WebM/Opus.
    pub fn from_mime(mime: &str) -> Self {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "audio/ogg" => Self::OggOpus,
            "audio/wav" | "audio/x-wav" | "audio/wave" => Self::Linear16,
            _ => Self::WebmOpus,
        }
    }

    /// File extension used for scratch files and retained uploads
    pub fn extension(&self) -> &'static str {
        match self {
            Self::WebmOpus => "webm",
            Self::OggOpus => "ogg",
            Self::Linear16 => "wav",
        }
    }
}

/// Encoded audio plus what the recognizer needs to know about it
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub encoding: AudioEncoding,
    /// Sample rate in Hz
    pub sample_rate_hz: u32,
}

impl AudioClip {
    pub fn new(bytes: Vec<u8>, encoding: AudioEncoding, sample_rate_hz: u32) -> Self {
        Self {
            bytes,
            encoding,
            sample_rate_hz,
        }
    }

    /// Decode a `data:<mime>;base64,<payload>` upload.
    ///
    /// Opus uploads are tagged with `default_rate_hz`; WAV uploads read their
    /// rate from the header, falling back to `default_rate_hz` if it is short.
    pub fn from_data_uri(data_uri: &str, default_rate_hz: u32) -> Result<Self, AudioInputError> {
        let (header, payload) = data_uri
            .split_once(',')
            .ok_or(AudioInputError::MalformedDataUri)?;

        let mime = header.strip_prefix("data:").unwrap_or(header);
        let encoding = AudioEncoding::from_mime(mime);

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| AudioInputError::InvalidBase64(e.to_string()))?;

        let sample_rate_hz = match encoding {
            AudioEncoding::Linear16 => wav_sample_rate(&bytes).unwrap_or(default_rate_hz),
            _ => default_rate_hz,
        };

        Ok(Self::new(bytes, encoding, sample_rate_hz))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Reject uploads too small to hold any speech
    pub fn ensure_min_size(&self, min: usize) -> Result<(), AudioInputError> {
        if self.bytes.len() < min {
            return Err(AudioInputError::TooSmall {
                size: self.bytes.len(),
                min,
            });
        }
        Ok(())
    }

    pub fn ensure_max_size(&self, max: usize) -> Result<(), AudioInputError> {
        if self.bytes.len() > max {
            return Err(AudioInputError::TooLarge {
                size: self.bytes.len(),
                max,
            });
        }
        Ok(())
    }
}

/// Sample rate field of a canonical RIFF/WAVE header
fn wav_sample_rate(bytes: &[u8]) -> Option<u32> {
    if bytes.len() < 28 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return None;
    }
    let raw: [u8; 4] = bytes[24..28].try_into().ok()?;
    Some(u32::from_le_bytes(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(bytes: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    #[test]
    fn test_mime_mapping() {
        assert_eq!(
            AudioEncoding::from_mime("audio/webm;codecs=opus"),
            AudioEncoding::WebmOpus
        );
        assert_eq!(AudioEncoding::from_mime("audio/ogg"), AudioEncoding::OggOpus);
        assert_eq!(AudioEncoding::from_mime("AUDIO/WAV"), AudioEncoding::Linear16);
        assert_eq!(AudioEncoding::from_mime("video/mp4"), AudioEncoding::WebmOpus);
    }

    #[test]
    fn test_from_data_uri_webm() {
        let uri = format!("data:audio/webm;codecs=opus;base64,{}", encode(&[1, 2, 3]));
        let clip = AudioClip::from_data_uri(&uri, 48000).unwrap();

        assert_eq!(clip.bytes, vec![1, 2, 3]);
        assert_eq!(clip.encoding, AudioEncoding::WebmOpus);
        assert_eq!(clip.sample_rate_hz, 48000);
    }

    #[test]
    fn test_from_data_uri_reads_wav_rate() {
        let mut header = Vec::new();
        header.extend_from_slice(b"RIFF");
        header.extend_from_slice(&36u32.to_le_bytes());
        header.extend_from_slice(b"WAVEfmt ");
        header.extend_from_slice(&16u32.to_le_bytes());
        header.extend_from_slice(&1u16.to_le_bytes());
        header.extend_from_slice(&1u16.to_le_bytes());
        header.extend_from_slice(&16000u32.to_le_bytes());

        let uri = format!("data:audio/wav;base64,{}", encode(&header));
        let clip = AudioClip::from_data_uri(&uri, 48000).unwrap();

        assert_eq!(clip.encoding, AudioEncoding::Linear16);
        assert_eq!(clip.sample_rate_hz, 16000);
    }

    #[test]
    fn test_from_data_uri_without_comma() {
        let result = AudioClip::from_data_uri("data:audio/webm;base64", 48000);
        assert_eq!(result, Err(AudioInputError::MalformedDataUri));
    }

    #[test]
    fn test_from_data_uri_bad_base64() {
        let result = AudioClip::from_data_uri("data:audio/webm;base64,@@@", 48000);
        assert!(matches!(result, Err(AudioInputError::InvalidBase64(_))));
    }

    #[test]
    fn test_min_size() {
        let clip = AudioClip::new(vec![0; 15], AudioEncoding::WebmOpus, 48000);
        assert_eq!(
            clip.ensure_min_size(1000),
            Err(AudioInputError::TooSmall { size: 15, min: 1000 })
        );

        let clip = AudioClip::new(vec![0; 1000], AudioEncoding::WebmOpus, 48000);
        assert!(clip.ensure_min_size(1000).is_ok());
    }

    #[test]
    fn test_max_size() {
        let clip = AudioClip::new(vec![0; 2048], AudioEncoding::Linear16, 16000);
        assert_eq!(
            clip.ensure_max_size(1024),
            Err(AudioInputError::TooLarge { size: 2048, max: 1024 })
        );
        assert!(clip.ensure_max_size(2048).is_ok());
    }
}
