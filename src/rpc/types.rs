//! JSON-RPC types for the HoloDesk protocol.
//!
//! Envelope types follow JSON-RPC 2.0; parameter and result types describe
//! the file and settings methods. Binary payloads travel as base64.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::conversion::{ConversionKind, ConversionStage};
use crate::error::{ErrorCode, HoloError};
use crate::types::{OutputFormat, StoredFile, StoredFileInfo};

/// JSON-RPC version constant.
pub const JSONRPC_VERSION: &str = "2.0";

/// A JSON-RPC request ID.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RequestId {
    Integer(i64),
    String(String),
}

impl From<i64> for RequestId {
    fn from(id: i64) -> Self {
        RequestId::Integer(id)
    }
}

impl From<String> for RequestId {
    fn from(id: String) -> Self {
        RequestId::String(id)
    }
}

/// A JSON-RPC request wrapper. Without an `id` it is a notification.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub id: Option<RequestId>,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// A JSON-RPC response wrapper.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse<T: Serialize> {
    pub jsonrpc: &'static str,
    pub id: RequestId,
    pub result: T,
}

impl<T: Serialize> JsonRpcResponse<T> {
    pub fn new(id: RequestId, result: T) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result,
        }
    }
}

/// A JSON-RPC error response.
#[derive(Debug, Serialize)]
pub struct JsonRpcErrorResponse {
    pub jsonrpc: &'static str,
    pub id: Option<RequestId>,
    pub error: JsonRpcError,
}

impl JsonRpcErrorResponse {
    pub fn new(id: Option<RequestId>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            error,
        }
    }
}

/// A JSON-RPC error object.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonRpcErrorData>,
}

/// Extended error data for application-specific errors.
#[derive(Debug, Serialize)]
pub struct JsonRpcErrorData {
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery: Option<String>,
}

impl JsonRpcError {
    /// Creates a parse error (-32700).
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self {
            code: -32700,
            message: message.into(),
            data: None,
        }
    }

    /// Creates an invalid request error (-32600).
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            code: -32600,
            message: message.into(),
            data: None,
        }
    }

    /// Creates a method not found error (-32601).
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: format!("Method not found: {}", method),
            data: None,
        }
    }

    /// Creates an invalid params error (-32602).
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: -32602,
            message: message.into(),
            data: None,
        }
    }

    /// Creates an internal error (-32603).
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self {
            code: -32603,
            message: message.into(),
            data: None,
        }
    }

    /// Creates a file not found error (-32010).
    pub fn file_not_found(id: &str) -> Self {
        Self {
            code: -32010,
            message: "File not found".to_string(),
            data: Some(JsonRpcErrorData {
                error_code: "FILE_NOT_FOUND".to_string(),
                details: Some(format!("No stored file with id {}", id)),
                recovery: None,
            }),
        }
    }

    /// Application error code (-32000 to -32005) for an [`ErrorCode`].
    pub fn code_for(code: ErrorCode) -> i32 {
        match code {
            ErrorCode::DecodeFailed => -32000,
            ErrorCode::StorageUnavailable => -32001,
            ErrorCode::StorageIo => -32002,
            ErrorCode::PreconditionViolation => -32003,
            ErrorCode::InputUnreadable => -32004,
            ErrorCode::InvalidSettings => -32005,
        }
    }
}

impl From<HoloError> for JsonRpcError {
    fn from(error: HoloError) -> Self {
        Self {
            code: JsonRpcError::code_for(error.code),
            message: error.code.description().to_string(),
            data: Some(JsonRpcErrorData {
                error_code: error.code.as_str().to_string(),
                details: Some(error.message),
                recovery: Some(error.code.recovery_hint().to_string()),
            }),
        }
    }
}

// ============================================================================
// File methods
// ============================================================================

/// Parameters for `convert_file`.
#[derive(Debug, Deserialize)]
pub struct ConvertFileParams {
    /// Original file name.
    pub name: String,

    /// MIME type of the input.
    #[serde(default)]
    pub mime_type: String,

    /// Base64-encoded file contents.
    pub data: String,

    /// Target format; the configured default when absent.
    pub format: Option<OutputFormat>,

    /// Store the original if decoding fails; the configured default when absent.
    pub fallback: Option<bool>,
}

impl ConvertFileParams {
    /// Decodes the base64 payload.
    pub fn decode_data(&self) -> Result<Vec<u8>, JsonRpcError> {
        STANDARD
            .decode(&self.data)
            .map_err(|e| JsonRpcError::invalid_params(format!("data is not valid base64: {}", e)))
    }
}

/// Response for `convert_file`.
#[derive(Debug, Serialize)]
pub struct ConvertFileResult {
    pub file: StoredFileInfo,
    pub kind: ConversionKind,
}

/// Parameters naming a stored file.
#[derive(Debug, Deserialize)]
pub struct FileIdParams {
    pub id: String,
}

/// Response for `list_files`.
#[derive(Debug, Serialize)]
pub struct ListFilesResult {
    pub files: Vec<StoredFileInfo>,
}

/// Response for `get_file`.
#[derive(Debug, Serialize)]
pub struct GetFileResult {
    pub file: StoredFileInfo,

    /// Base64-encoded file contents.
    pub data: String,
}

impl From<StoredFile> for GetFileResult {
    fn from(file: StoredFile) -> Self {
        Self {
            data: STANDARD.encode(&file.blob),
            file: file.info(),
        }
    }
}

// ============================================================================
// Settings methods
// ============================================================================

/// Parameters naming a settings key.
#[derive(Debug, Deserialize)]
pub struct SettingsKeyParams {
    pub key: String,
}

/// Parameters for `settings_set`.
#[derive(Debug, Deserialize)]
pub struct SettingsSetParams {
    pub key: String,
    pub value: String,
}

/// Parameters for `settings_import`: the export document itself.
#[derive(Debug, Deserialize)]
pub struct SettingsImportParams {
    pub document: serde_json::Value,
}

// ============================================================================
// Notifications
// ============================================================================

/// A JSON-RPC notification (no id field).
#[derive(Debug, Serialize)]
pub struct JsonRpcNotification<T: Serialize> {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: T,
}

impl<T: Serialize> JsonRpcNotification<T> {
    pub fn new(method: &'static str, params: T) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method,
            params,
        }
    }
}

/// Progress notification sent at each conversion stage.
#[derive(Debug, Serialize)]
pub struct ConversionProgressParams {
    /// Input file name.
    pub name: String,

    /// Stage just entered.
    pub stage: ConversionStage,

    /// Progress bar position.
    pub percent: u8,

    /// Log line for the stage.
    pub message: &'static str,
}

impl ConversionProgressParams {
    pub fn new(name: impl Into<String>, stage: ConversionStage) -> Self {
        Self {
            name: name.into(),
            stage,
            percent: stage.percent(),
            message: stage.message(),
        }
    }
}
