//! Audio module.
//!
//! Decoded audio buffers, the 16-bit PCM WAV encoder and the decoder
//! collaborator that turns container bytes into buffers.

pub mod buffer;
pub mod decode;
pub mod wav;

// Re-export commonly used items
pub use buffer::AudioBuffer;
pub use decode::decode_audio;
pub use wav::{encode, samples_to_duration, sample_to_i16, WavBytes, HEADER_LEN, WAV_MIME_TYPE};
