//! Audio decoding using Symphonia.
//!
//! Turns the bytes of a supported container (wav, mp3, ogg/vorbis, flac,
//! aac/m4a) into an [`AudioBuffer`]. Decoding is CPU-bound and runs on the
//! blocking pool.

use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::AudioBuffer;
use crate::error::{HoloError, Result};
use crate::types::extension_for_mime;

/// Decodes an audio file held in memory.
///
/// `mime_type` is used as a probing hint only; the container is detected
/// from the bytes.
pub async fn decode_audio(bytes: Vec<u8>, mime_type: &str) -> Result<AudioBuffer> {
    let mime_type = mime_type.to_string();
    tokio::task::spawn_blocking(move || decode_blocking(bytes, &mime_type))
        .await
        .map_err(|e| HoloError::decode_failed(format!("decoder task failed: {}", e)))?
}

fn decode_blocking(bytes: Vec<u8>, mime_type: &str) -> Result<AudioBuffer> {
    let input_len = bytes.len();
    let source = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    hint.mime_type(mime_type);
    if let Some(ext) = extension_for_mime(mime_type) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            source,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| HoloError::decode_failed(format!("unrecognized container: {}", e)))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| HoloError::decode_failed("no decodable audio track"))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut channel_count = track.codec_params.channels.map(|c| c.count());

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| HoloError::decode_failed(format!("unsupported codec: {}", e)))?;

    let mut interleaved: Vec<f32> = Vec::new();
    let mut skipped_packets = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(HoloError::decode_failed(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate = Some(spec.rate);
                channel_count = Some(spec.channels.count());

                let mut samples = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                samples.copy_interleaved_ref(decoded);
                interleaved.extend_from_slice(samples.samples());
            }
            Err(SymphoniaError::DecodeError(reason)) => {
                // Corrupt packets are dropped; the rest of the stream is still usable.
                skipped_packets += 1;
                tracing::warn!(reason, "Skipping undecodable packet");
            }
            Err(e) => return Err(HoloError::decode_failed(e.to_string())),
        }
    }

    let (Some(sample_rate), Some(channel_count)) = (sample_rate, channel_count) else {
        return Err(HoloError::decode_failed("stream has no sample rate or channel layout"));
    };

    tracing::debug!(
        input_bytes = input_len,
        sample_rate,
        channel_count,
        samples = interleaved.len(),
        skipped_packets,
        "Decoded audio"
    );

    AudioBuffer::from_interleaved(&interleaved, channel_count, sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::encode;
    use crate::error::ErrorCode;

    #[tokio::test]
    async fn decodes_encoded_wav() {
        let original = AudioBuffer::new(
            22050,
            vec![vec![0.5, -0.5, 0.0, 0.25], vec![-0.25, 0.75, -1.0, 1.0]],
        )
        .unwrap();
        let wav = encode(&original).into_bytes();

        let decoded = decode_audio(wav, "audio/wav").await.unwrap();
        assert_eq!(decoded.sample_rate(), 22050);
        assert_eq!(decoded.channel_count(), 2);
        assert_eq!(decoded.frame_count(), 4);

        for (a, b) in original.channels().iter().zip(decoded.channels()) {
            for (x, y) in a.iter().zip(b) {
                assert!((x - y).abs() < 1e-3, "{} vs {}", x, y);
            }
        }
    }

    #[tokio::test]
    async fn rejects_garbage() {
        let err = decode_audio(b"definitely not audio".to_vec(), "audio/mpeg")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DecodeFailed);
    }
}
