//! Conversion pipeline.
//!
//! Orchestrates the decoder, the WAV encoder and the blob store. A
//! conversion runs to completion or failure; there is no cancellation.

use serde::Serialize;

use crate::audio::{decode_audio, encode};
use crate::error::Result;
use crate::store::BlobStore;
use crate::types::{output_name, with_wav_extension, OutputFormat, StoredFile};

/// Reply given to any request to cancel a running conversion.
pub const CANCEL_UNSUPPORTED_MESSAGE: &str =
    "Process cannot be cancelled. Please wait for completion.";

/// An input file and what to turn it into.
#[derive(Debug, Clone)]
pub struct ConvertRequest {
    /// Original file name.
    pub name: String,
    /// MIME type reported for the input.
    pub mime_type: String,
    /// Raw input bytes.
    pub data: Vec<u8>,
    /// Requested output format.
    pub format: OutputFormat,
    /// Store the input verbatim if it cannot be decoded.
    pub fallback_to_original: bool,
}

impl ConvertRequest {
    /// Creates a request with fallback disabled.
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        data: Vec<u8>,
        format: OutputFormat,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data,
            format,
            fallback_to_original: false,
        }
    }

    /// Enables or disables the verbatim fallback on decode failure.
    pub fn with_fallback(mut self, fallback_to_original: bool) -> Self {
        self.fallback_to_original = fallback_to_original;
        self
    }

    /// True when the input goes through the decoder and WAV encoder.
    pub fn is_audio_conversion(&self) -> bool {
        self.format.is_audio() && self.mime_type.starts_with("audio")
    }
}

/// Progress milestones reported during a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionStage {
    Started,
    Decoding,
    Encoding,
    Storing,
    Complete,
}

impl ConversionStage {
    /// Progress bar position for this stage.
    pub fn percent(&self) -> u8 {
        match self {
            ConversionStage::Started => 10,
            ConversionStage::Decoding => 30,
            ConversionStage::Encoding => 60,
            ConversionStage::Storing | ConversionStage::Complete => 100,
        }
    }

    /// Log line shown for this stage.
    pub fn message(&self) -> &'static str {
        match self {
            ConversionStage::Started => "Starting conversion...",
            ConversionStage::Decoding => "Decoding audio...",
            ConversionStage::Encoding => "Converting format...",
            ConversionStage::Storing => "Storing file...",
            ConversionStage::Complete => "Conversion complete!",
        }
    }
}

/// How the stored record was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionKind {
    /// Decoded and re-encoded as WAV.
    Converted,
    /// Stored with original bytes, name and MIME type.
    StoredOriginal,
}

/// Result of a successful conversion.
#[derive(Debug, Clone)]
pub struct ConversionOutcome {
    pub file: StoredFile,
    pub kind: ConversionKind,
}

/// Converts and stores a file.
pub async fn convert(store: &dyn BlobStore, request: ConvertRequest) -> Result<ConversionOutcome> {
    convert_with_progress(store, request, |_| {}).await
}

/// Converts and stores a file, reporting each stage to `on_progress`.
///
/// Audio inputs with an audio target are decoded and re-encoded as 16-bit
/// PCM WAV named `converted_<millis>.wav`. Other inputs are stored as-is.
/// Decode failures are returned unless `fallback_to_original` is set.
pub async fn convert_with_progress<F>(
    store: &dyn BlobStore,
    request: ConvertRequest,
    mut on_progress: F,
) -> Result<ConversionOutcome>
where
    F: FnMut(ConversionStage) + Send,
{
    on_progress(ConversionStage::Started);

    let audio = request.is_audio_conversion();
    let ConvertRequest {
        name,
        mime_type,
        data,
        format,
        fallback_to_original,
    } = request;

    tracing::info!(
        input = %name,
        mime_type = %mime_type,
        bytes = data.len(),
        format = %format,
        audio,
        "Conversion started"
    );

    let original = if audio {
        on_progress(ConversionStage::Decoding);

        let (decode_input, original) = if fallback_to_original {
            (data.clone(), data)
        } else {
            (data, Vec::new())
        };

        match decode_audio(decode_input, &mime_type).await {
            Ok(buffer) => {
                on_progress(ConversionStage::Encoding);
                let wav = encode(&buffer);

                let output = output_name(format, chrono::Utc::now().timestamp_millis());
                let file = StoredFile::new(with_wav_extension(&output), wav.mime_type(), wav.into_bytes());

                on_progress(ConversionStage::Storing);
                store.put(&file).await?;
                on_progress(ConversionStage::Complete);

                tracing::info!(
                    id = %file.id,
                    name = %file.name,
                    size = file.size,
                    duration_sec = buffer.duration_sec(),
                    "Converted to WAV"
                );
                return Ok(ConversionOutcome {
                    file,
                    kind: ConversionKind::Converted,
                });
            }
            Err(e) if fallback_to_original => {
                tracing::warn!(error = %e, input = %name, "Decode failed, storing original");
                original
            }
            Err(e) => {
                tracing::error!(error = %e, input = %name, "Conversion failed");
                return Err(e);
            }
        }
    } else {
        data
    };

    let file = StoredFile::new(name, mime_type, original);
    on_progress(ConversionStage::Storing);
    store.put(&file).await?;
    on_progress(ConversionStage::Complete);

    tracing::info!(id = %file.id, name = %file.name, size = file.size, "Stored original file");
    Ok(ConversionOutcome {
        file,
        kind: ConversionKind::StoredOriginal,
    })
}
