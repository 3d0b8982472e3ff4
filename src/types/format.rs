//! Conversion targets and MIME type helpers.

use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Output format selected for a conversion.
///
/// Audio targets are all rendered as WAV, the one format produced
/// locally. Video targets store the input verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Audio target, rendered as WAV
    Mp3,
    /// 16-bit PCM WAV
    #[default]
    Wav,
    /// Audio target, rendered as WAV
    Ogg,
    /// Audio target, rendered as WAV
    Aac,
    /// Audio target, rendered as WAV
    Flac,
    /// Video target, input stored unchanged
    Mp4,
    /// Video target, input stored unchanged
    Webm,
}

impl OutputFormat {
    /// Returns the string representation (also the file extension).
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Wav => "wav",
            OutputFormat::Ogg => "ogg",
            OutputFormat::Aac => "aac",
            OutputFormat::Flac => "flac",
            OutputFormat::Mp4 => "mp4",
            OutputFormat::Webm => "webm",
        }
    }

    /// Parses a format from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mp3" => Some(OutputFormat::Mp3),
            "wav" | "wave" => Some(OutputFormat::Wav),
            "ogg" => Some(OutputFormat::Ogg),
            "aac" => Some(OutputFormat::Aac),
            "flac" => Some(OutputFormat::Flac),
            "mp4" => Some(OutputFormat::Mp4),
            "webm" => Some(OutputFormat::Webm),
            _ => None,
        }
    }

    /// True for targets that go through the audio decoder and WAV encoder.
    pub fn is_audio(&self) -> bool {
        matches!(
            self,
            OutputFormat::Mp3
                | OutputFormat::Wav
                | OutputFormat::Ogg
                | OutputFormat::Aac
                | OutputFormat::Flac
        )
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Name given to a conversion result before any extension rewrite.
pub fn output_name(format: OutputFormat, unix_millis: i64) -> String {
    format!("converted_{}.{}", unix_millis, format.as_str())
}

/// Replaces a trailing `.<word>` extension with `.wav`.
///
/// Names without such an extension are returned unchanged.
pub fn with_wav_extension(name: &str) -> String {
    match name.rfind('.') {
        Some(dot)
            if dot + 1 < name.len()
                && name[dot + 1..]
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_') =>
        {
            format!("{}.wav", &name[..dot])
        }
        _ => name.to_string(),
    }
}

/// File extension Symphonia expects for a MIME type.
pub fn extension_for_mime(mime_type: &str) -> Option<&'static str> {
    let essence = mime_type.split(';').next().unwrap_or("").trim().to_lowercase();
    match essence.as_str() {
        "audio/wav" | "audio/x-wav" | "audio/wave" | "audio/vnd.wave" => Some("wav"),
        "audio/mpeg" | "audio/mp3" => Some("mp3"),
        "audio/ogg" | "audio/vorbis" => Some("ogg"),
        "audio/flac" | "audio/x-flac" => Some("flac"),
        "audio/aac" | "audio/x-aac" => Some("aac"),
        "audio/mp4" | "audio/x-m4a" | "audio/m4a" => Some("m4a"),
        "video/mp4" => Some("mp4"),
        "video/webm" | "audio/webm" => Some("webm"),
        _ => None,
    }
}

/// MIME type for a file path, from its extension.
///
/// Unknown extensions map to `application/octet-stream`.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "wav" | "wave" => "audio/wav",
        "mp3" => "audio/mpeg",
        "ogg" | "oga" => "audio/ogg",
        "flac" => "audio/flac",
        "aac" => "audio/aac",
        "m4a" => "audio/mp4",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "json" => "application/json",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parsing() {
        assert_eq!(OutputFormat::parse("MP3"), Some(OutputFormat::Mp3));
        assert_eq!(OutputFormat::parse("wave"), Some(OutputFormat::Wav));
        assert_eq!(OutputFormat::parse("webm"), Some(OutputFormat::Webm));
        assert_eq!(OutputFormat::parse("avi"), None);
    }

    #[test]
    fn audio_targets() {
        assert!(OutputFormat::Flac.is_audio());
        assert!(OutputFormat::Wav.is_audio());
        assert!(!OutputFormat::Mp4.is_audio());
        assert!(!OutputFormat::Webm.is_audio());
    }

    #[test]
    fn output_names() {
        let name = output_name(OutputFormat::Mp3, 1_700_000_000_123);
        assert_eq!(name, "converted_1700000000123.mp3");
        assert_eq!(with_wav_extension(&name), "converted_1700000000123.wav");
    }

    #[test]
    fn wav_extension_rewrite_edge_cases() {
        assert_eq!(with_wav_extension("song.flac"), "song.wav");
        assert_eq!(with_wav_extension("archive.tar.gz"), "archive.tar.wav");
        assert_eq!(with_wav_extension("no_extension"), "no_extension");
        assert_eq!(with_wav_extension("trailing."), "trailing.");
        assert_eq!(with_wav_extension("odd.ext-1"), "odd.ext-1");
    }

    #[test]
    fn mime_lookup() {
        assert_eq!(extension_for_mime("audio/mpeg"), Some("mp3"));
        assert_eq!(extension_for_mime("audio/ogg; codecs=vorbis"), Some("ogg"));
        assert_eq!(extension_for_mime("application/pdf"), None);
        assert_eq!(mime_for_path(Path::new("/tmp/a.FLAC")), "audio/flac");
        assert_eq!(mime_for_path(Path::new("clip.mp4")), "video/mp4");
        assert_eq!(mime_for_path(Path::new("README")), "application/octet-stream");
    }
}
