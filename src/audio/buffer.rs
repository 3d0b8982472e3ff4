//! Decoded multi-channel audio.

use crate::error::{HoloError, Result};

/// Largest payload a RIFF chunk can describe, minus the canonical header.
const MAX_DATA_LEN: u64 = u32::MAX as u64 - 44;

/// An immutable decoded audio buffer, stored planar (one `Vec` per channel).
///
/// Construction enforces every precondition of the WAV encoder, so any
/// `AudioBuffer` that exists can be encoded without failure.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    /// Creates a buffer from planar channel data.
    ///
    /// Fails with `PRECONDITION_VIOLATION` when there are no channels, the
    /// sample rate is zero, channel lengths differ, or the encoded stream
    /// would not fit the 32-bit RIFF size fields.
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self> {
        if channels.is_empty() {
            return Err(HoloError::precondition("Audio buffer must have at least one channel"));
        }
        if sample_rate == 0 {
            return Err(HoloError::precondition("Sample rate must be greater than zero"));
        }

        let frames = channels[0].len();
        if let Some((index, channel)) = channels
            .iter()
            .enumerate()
            .find(|(_, c)| c.len() != frames)
        {
            return Err(HoloError::precondition(format!(
                "Channel {} has {} samples, expected {}",
                index,
                channel.len(),
                frames
            )));
        }

        // Block align is a u16 holding channels * 2.
        if channels.len() > (u16::MAX / 2) as usize {
            return Err(HoloError::precondition(format!(
                "Too many channels: {}",
                channels.len()
            )));
        }

        let byte_rate = u64::from(sample_rate) * channels.len() as u64 * 2;
        if byte_rate > u64::from(u32::MAX) {
            return Err(HoloError::precondition(format!(
                "Byte rate overflows WAV header: {} Hz x {} channels",
                sample_rate,
                channels.len()
            )));
        }

        let data_len = frames as u64 * channels.len() as u64 * 2;
        if data_len > MAX_DATA_LEN {
            return Err(HoloError::precondition(format!(
                "Audio too long for a WAV file: {} bytes of sample data",
                data_len
            )));
        }

        Ok(Self {
            sample_rate,
            channels,
        })
    }

    /// Creates a buffer from frame-interleaved samples.
    pub fn from_interleaved(samples: &[f32], channel_count: usize, sample_rate: u32) -> Result<Self> {
        if channel_count == 0 {
            return Err(HoloError::precondition("Audio buffer must have at least one channel"));
        }
        if samples.len() % channel_count != 0 {
            return Err(HoloError::precondition(format!(
                "{} interleaved samples cannot be split into {} channels",
                samples.len(),
                channel_count
            )));
        }

        let frames = samples.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in samples.chunks_exact(channel_count) {
            for (channel, sample) in channels.iter_mut().zip(frame) {
                channel.push(*sample);
            }
        }

        Self::new(sample_rate, channels)
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of channels (always at least one).
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of samples per channel.
    pub fn frame_count(&self) -> usize {
        self.channels[0].len()
    }

    /// Samples of a single channel, or `None` if out of range.
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// All channels in order.
    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Playback duration in seconds.
    pub fn duration_sec(&self) -> f32 {
        super::samples_to_duration(self.frame_count(), self.sample_rate)
    }
}
