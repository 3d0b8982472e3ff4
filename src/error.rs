//! Error types for HoloDesk.
//!
//! Defines all error codes and types used by the encoder, the blob store,
//! the settings surface and the daemon for consistent error reporting.

use std::fmt;

/// Error codes carried by every [`HoloError`].
///
/// These codes are also surfaced in JSON-RPC error responses so that a
/// panel UI can react to specific failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Input audio could not be decoded.
    /// Trigger: unsupported container or codec, corrupt data.
    DecodeFailed,

    /// The durable store could not be opened or is not open yet.
    /// Trigger: missing permissions, unknown storage version, store never opened.
    StorageUnavailable,

    /// A single store operation failed.
    /// Trigger: disk full, corrupt record file, rename failure.
    StorageIo,

    /// A caller handed the encoder an invalid buffer.
    /// Trigger: zero channels, zero sample rate, channels of unequal length.
    PreconditionViolation,

    /// A CLI input file could not be read.
    InputUnreadable,

    /// A settings document could not be parsed or persisted.
    InvalidSettings,
}

impl ErrorCode {
    /// Returns the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::DecodeFailed => "DECODE_FAILED",
            ErrorCode::StorageUnavailable => "STORAGE_UNAVAILABLE",
            ErrorCode::StorageIo => "STORAGE_IO",
            ErrorCode::PreconditionViolation => "PRECONDITION_VIOLATION",
            ErrorCode::InputUnreadable => "INPUT_UNREADABLE",
            ErrorCode::InvalidSettings => "INVALID_SETTINGS",
        }
    }

    /// Returns a human-readable description of the error.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::DecodeFailed => "Audio input could not be decoded",
            ErrorCode::StorageUnavailable => "Durable file store is not available",
            ErrorCode::StorageIo => "A file store operation failed",
            ErrorCode::PreconditionViolation => "Audio buffer does not satisfy encoder preconditions",
            ErrorCode::InputUnreadable => "Input file could not be read",
            ErrorCode::InvalidSettings => "Settings document is invalid",
        }
    }

    /// Returns a recovery hint suggesting how to resolve this error.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCode::DecodeFailed => {
                "Use a wav, mp3, ogg, flac or aac input, or enable the verbatim fallback \
                 to store the original file unchanged"
            }
            ErrorCode::StorageUnavailable => {
                "Check that the store directory exists and is writable, \
                 or point HOLODESK_STORE_PATH at a fresh directory"
            }
            ErrorCode::StorageIo => "Check free disk space and retry the operation",
            ErrorCode::PreconditionViolation => {
                "Provide at least one channel, a non-zero sample rate and channels of equal length"
            }
            ErrorCode::InputUnreadable => "Check the input path and file permissions",
            ErrorCode::InvalidSettings => {
                "Provide a JSON document of the form {\"localStorage\": {\"key\": \"value\"}}"
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for HoloDesk operations.
#[derive(Debug)]
pub struct HoloError {
    /// The error code identifying the type of error.
    pub code: ErrorCode,
    /// Human-readable error message with context.
    pub message: String,
    /// Optional underlying cause of the error.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl HoloError {
    /// Creates a new HoloError with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new HoloError with an underlying cause.
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a DECODE_FAILED error.
    pub fn decode_failed(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::DecodeFailed,
            format!("Failed to decode audio: {}", reason.into()),
        )
    }

    /// Creates a STORAGE_UNAVAILABLE error.
    pub fn storage_unavailable(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::StorageUnavailable,
            format!("File store unavailable: {}", reason.into()),
        )
    }

    /// Creates a STORAGE_IO error wrapping an I/O failure.
    pub fn storage_io(context: impl Into<String>, source: std::io::Error) -> Self {
        let context = context.into();
        Self::with_source(
            ErrorCode::StorageIo,
            format!("{}: {}", context, source),
            source,
        )
    }

    /// Creates a STORAGE_IO error for a record that could not be (de)serialized.
    pub fn corrupt_record(context: impl Into<String>, source: serde_json::Error) -> Self {
        let context = context.into();
        Self::with_source(
            ErrorCode::StorageIo,
            format!("{}: {}", context, source),
            source,
        )
    }

    /// Creates a PRECONDITION_VIOLATION error.
    pub fn precondition(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::PreconditionViolation, reason)
    }

    /// Creates an INPUT_UNREADABLE error.
    pub fn input_unreadable(path: impl Into<String>, source: std::io::Error) -> Self {
        let path = path.into();
        Self::with_source(
            ErrorCode::InputUnreadable,
            format!("Cannot read {}: {}", path, source),
            source,
        )
    }

    /// Creates an INVALID_SETTINGS error.
    pub fn invalid_settings(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidSettings, reason)
    }
}

impl fmt::Display for HoloError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}. Recovery: {}",
            self.code,
            self.message,
            self.code.recovery_hint()
        )
    }
}

impl std::error::Error for HoloError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Result type alias using HoloError.
pub type Result<T> = std::result::Result<T, HoloError>;
