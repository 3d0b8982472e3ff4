//! JSON-RPC module for daemon communication.
//!
//! Provides the JSON-RPC 2.0 server implementation for:
//! - `convert_file`, `list_files`, `get_file`, `delete_file`: converted files
//! - `open_store`: retry opening the file store
//! - `cancel`: reports that conversions cannot be cancelled
//! - `settings_*`: flat key/value settings
//! - `ping`: Health check
//! - `shutdown`: Graceful shutdown
//!
//! Notifications:
//! - `conversion_progress`: one per conversion stage

pub mod methods;
pub mod server;
pub mod types;

// Re-export commonly used types
pub use server::{run_server, send_notification, ServerState};
pub use types::{
    ConversionProgressParams, ConvertFileParams, ConvertFileResult, GetFileResult, JsonRpcError,
    JsonRpcErrorResponse, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, ListFilesResult,
    RequestId,
};
