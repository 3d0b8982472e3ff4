//! WAV encoder for converted audio.
//!
//! Produces canonical 44-byte-header, 16-bit PCM WAV streams. The layout is
//! fixed so that output is byte-identical for identical input.

use byteorder::{ByteOrder, LittleEndian};

use super::AudioBuffer;

/// Length of the canonical RIFF/WAVE header.
pub const HEADER_LEN: usize = 44;

/// MIME type attached to every encoded stream.
pub const WAV_MIME_TYPE: &str = "audio/wav";

/// Bits per sample in the output stream.
pub const BITS_PER_SAMPLE: u16 = 16;

/// `fmt ` format tag for uncompressed PCM.
const FORMAT_PCM: u16 = 1;

/// Size of the PCM `fmt ` chunk body.
const FMT_CHUNK_LEN: u32 = 16;

/// An encoded WAV byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavBytes {
    bytes: Vec<u8>,
}

impl WavBytes {
    /// MIME type of the stream, always `audio/wav`.
    pub fn mime_type(&self) -> &'static str {
        WAV_MIME_TYPE
    }

    /// Raw bytes, header included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the stream, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Total length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True only for a stream without a header, which `encode` never produces.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Encodes a decoded buffer as a 16-bit PCM WAV stream.
///
/// Samples are written frame by frame, channels interleaved in order.
/// Each sample is clamped to [-1.0, 1.0] and scaled by 32768 when negative
/// or 32767 otherwise, then truncated toward zero.
///
/// # Example
///
/// ```ignore
/// use holodesk::audio::{encode, AudioBuffer};
///
/// let buffer = AudioBuffer::new(44100, vec![vec![1.0, -1.0]])?;
/// let wav = encode(&buffer);
/// assert_eq!(wav.len(), 48);
/// ```
pub fn encode(buffer: &AudioBuffer) -> WavBytes {
    let channel_count = buffer.channel_count();
    let frame_count = buffer.frame_count();
    let data_len = frame_count * channel_count * 2;
    let byte_len = HEADER_LEN + data_len;

    let mut bytes = vec![0u8; byte_len];

    // AudioBuffer::new guarantees these narrowings are lossless.
    write_header(
        &mut bytes[..HEADER_LEN],
        channel_count as u16,
        buffer.sample_rate(),
        data_len as u32,
    );

    let channels = buffer.channels();
    let mut pos = HEADER_LEN;
    for frame in 0..frame_count {
        for channel in channels {
            LittleEndian::write_i16(&mut bytes[pos..pos + 2], sample_to_i16(channel[frame]));
            pos += 2;
        }
    }

    WavBytes { bytes }
}

/// Writes the 44-byte header into `header`.
fn write_header(header: &mut [u8], channels: u16, sample_rate: u32, data_len: u32) {
    let block_align = channels * (BITS_PER_SAMPLE / 8);
    let byte_rate = sample_rate * u32::from(block_align);

    header[0..4].copy_from_slice(b"RIFF");
    LittleEndian::write_u32(&mut header[4..8], HEADER_LEN as u32 - 8 + data_len);
    header[8..12].copy_from_slice(b"WAVE");
    header[12..16].copy_from_slice(b"fmt ");
    LittleEndian::write_u32(&mut header[16..20], FMT_CHUNK_LEN);
    LittleEndian::write_u16(&mut header[20..22], FORMAT_PCM);
    LittleEndian::write_u16(&mut header[22..24], channels);
    LittleEndian::write_u32(&mut header[24..28], sample_rate);
    LittleEndian::write_u32(&mut header[28..32], byte_rate);
    LittleEndian::write_u16(&mut header[32..34], block_align);
    LittleEndian::write_u16(&mut header[34..36], BITS_PER_SAMPLE);
    header[36..40].copy_from_slice(b"data");
    LittleEndian::write_u32(&mut header[40..44], data_len);
}

/// Converts one float sample to a signed 16-bit PCM value.
///
/// Out-of-range input saturates at the bounds; NaN maps to 0.
pub fn sample_to_i16(sample: f32) -> i16 {
    // f64 keeps the products exact before truncation.
    let clamped = f64::from(sample).clamp(-1.0, 1.0);
    let scaled = if clamped < 0.0 {
        clamped * 32768.0
    } else {
        clamped * 32767.0
    };
    scaled as i16
}

/// Calculates the duration of audio in seconds from frame count.
pub fn samples_to_duration(sample_count: usize, sample_rate: u32) -> f32 {
    sample_count as f32 / sample_rate as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read_u16(bytes: &[u8], at: usize) -> u16 {
        LittleEndian::read_u16(&bytes[at..at + 2])
    }

    fn read_u32(bytes: &[u8], at: usize) -> u32 {
        LittleEndian::read_u32(&bytes[at..at + 4])
    }

    #[test]
    fn mono_full_scale_pair() {
        let buffer = AudioBuffer::new(44100, vec![vec![1.0, -1.0]]).unwrap();
        let wav = encode(&buffer);

        assert_eq!(wav.len(), 48);
        assert_eq!(wav.mime_type(), "audio/wav");
        assert_eq!(&wav.as_bytes()[44..], &[0xFF, 0x7F, 0x00, 0x80]);
    }

    #[test]
    fn header_fields() {
        let buffer = AudioBuffer::new(22050, vec![vec![0.0; 10], vec![0.0; 10], vec![0.0; 10]]).unwrap();
        let wav = encode(&buffer);
        let bytes = wav.as_bytes();

        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(read_u32(bytes, 4), (bytes.len() - 8) as u32);
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(read_u32(bytes, 16), 16);
        assert_eq!(read_u16(bytes, 20), 1);
        assert_eq!(read_u16(bytes, 22), 3);
        assert_eq!(read_u32(bytes, 24), 22050);
        assert_eq!(read_u32(bytes, 28), 22050 * 3 * 2);
        assert_eq!(read_u16(bytes, 32), 6);
        assert_eq!(read_u16(bytes, 34), 16);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(read_u32(bytes, 40), 10 * 3 * 2);
    }

    #[test]
    fn length_matches_frames_and_channels() {
        for (channels, frames) in [(1usize, 0usize), (1, 7), (2, 5), (6, 3)] {
            let buffer = AudioBuffer::new(8000, vec![vec![0.25; frames]; channels]).unwrap();
            assert_eq!(encode(&buffer).len(), 44 + frames * channels * 2);
        }
    }

    #[test]
    fn zero_frames_is_header_only() {
        let buffer = AudioBuffer::new(48000, vec![vec![], vec![]]).unwrap();
        let wav = encode(&buffer);
        assert_eq!(wav.len(), HEADER_LEN);
        assert_eq!(read_u32(wav.as_bytes(), 40), 0);
        assert_eq!(read_u32(wav.as_bytes(), 4), 36);
    }

    #[test]
    fn out_of_range_samples_saturate() {
        assert_eq!(sample_to_i16(1.5), sample_to_i16(1.0));
        assert_eq!(sample_to_i16(-1.5), sample_to_i16(-1.0));
        assert_eq!(sample_to_i16(f32::INFINITY), 32767);
        assert_eq!(sample_to_i16(f32::NEG_INFINITY), -32768);
        assert_eq!(sample_to_i16(f32::NAN), 0);
    }

    #[test]
    fn scaling_is_asymmetric_and_truncates() {
        assert_eq!(sample_to_i16(0.0), 0);
        assert_eq!(sample_to_i16(0.5), 16383);
        assert_eq!(sample_to_i16(-0.5), -16384);
        // 0.1 * 32767 = 3276.7 truncates toward zero
        assert_eq!(sample_to_i16(0.1), 3276);
        assert_eq!(sample_to_i16(-0.1), -3276);
    }

    #[test]
    fn interleaves_sample_major() {
        let buffer = AudioBuffer::new(8000, vec![vec![1.0, 0.0], vec![-1.0, 0.5]]).unwrap();
        let wav = encode(&buffer);
        let data = &wav.as_bytes()[44..];
        let samples: Vec<i16> = data.chunks_exact(2).map(LittleEndian::read_i16).collect();
        assert_eq!(samples, vec![32767, -32768, 0, 16383]);
    }

    #[test]
    fn round_trip_through_pcm_reader() {
        let left: Vec<f32> = (0..64).map(|i| ((i as f32) / 10.0).sin() * 0.8).collect();
        let right: Vec<f32> = left.iter().map(|s| -s).collect();
        let buffer = AudioBuffer::new(32000, vec![left.clone(), right.clone()]).unwrap();
        let wav = encode(&buffer);

        let mut reader = hound::WavReader::new(Cursor::new(wav.into_bytes())).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 32000);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);

        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded.len(), 128);
        for (frame, pair) in decoded.chunks_exact(2).enumerate() {
            for (channel, original) in [left[frame], right[frame]].into_iter().enumerate() {
                let scale = if pair[channel] < 0 { 32768.0 } else { 32767.0 };
                let restored = pair[channel] as f32 / scale;
                assert!((restored - original).abs() <= 1.0 / 32767.0);
            }
        }
    }

    #[test]
    fn encoding_is_deterministic() {
        let buffer = AudioBuffer::new(44100, vec![vec![0.3, -0.7, 0.9]]).unwrap();
        assert_eq!(encode(&buffer), encode(&buffer));
    }

    #[test]
    fn samples_to_duration_calculation() {
        assert_eq!(samples_to_duration(32000, 32000), 1.0);
        assert_eq!(samples_to_duration(88200, 44100), 2.0);
        assert_eq!(samples_to_duration(24000, 48000), 0.5);
    }
}
