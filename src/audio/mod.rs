pub mod clip;
pub mod file;
pub mod filter;
pub mod normalizer;

pub use clip::{AudioClip, AudioEncoding};
pub use file::AudioFile;
pub use filter::FilterChain;
pub use normalizer::{normalizer_from_config, AudioNormalizer, FfmpegNormalizer, NativeNormalizer};
