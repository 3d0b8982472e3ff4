//! JSON-RPC server over stdin/stdout.
//!
//! Requests are handled one at a time in arrival order.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::DeskConfig;
use crate::error::{HoloError, Result};
use crate::settings::SettingsStore;
use crate::store::{FsBlobStore, StoreSlot};

use super::methods::handle_request;
use super::types::{
    JsonRpcError, JsonRpcErrorResponse, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
};

/// State shared across all request handlers.
pub struct ServerState {
    /// Converted-files store, once opened.
    pub store: StoreSlot,
    /// Flat key/value settings.
    pub settings: SettingsStore,
    /// Desk configuration.
    pub config: DeskConfig,
    /// Flag to signal server shutdown.
    shutdown: Arc<AtomicBool>,
}

impl ServerState {
    /// Creates server state with an unopened store.
    pub fn new(config: DeskConfig, settings: SettingsStore) -> Self {
        Self {
            store: StoreSlot::uninitialized(),
            settings,
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Opens the file store at the configured path.
    ///
    /// On failure the store stays uninitialized and the error is returned;
    /// file methods keep failing fast until a later attempt succeeds.
    pub async fn open_store(&mut self) -> Result<()> {
        let path = self.config.effective_store_path();
        match FsBlobStore::open(&path).await {
            Ok(store) => {
                self.store.install(store);
                Ok(())
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to open file store");
                self.store.record_failure(e.message.clone());
                Err(e)
            }
        }
    }

    /// Signals the server to shut down.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Returns true if shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

/// Runs the JSON-RPC server, reading from stdin and writing to stdout.
pub async fn run_server(mut state: ServerState) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    tracing::info!("JSON-RPC server started, waiting for requests");

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                return Err(HoloError::input_unreadable("stdin", e));
            }
        };

        // Skip empty lines
        if line.trim().is_empty() {
            continue;
        }

        if let Some(response) = process_request(&line, &mut state).await {
            write_line(&response);
        }

        if state.is_shutdown() {
            tracing::info!("Server shutdown requested");
            break;
        }
    }

    tracing::info!("JSON-RPC server stopped");
    Ok(())
}

/// Processes a single JSON-RPC request line.
///
/// Notifications (no `id`) are handled but never answered.
async fn process_request(line: &str, state: &mut ServerState) -> Option<String> {
    let request: JsonRpcRequest = match serde_json::from_str(line) {
        Ok(r) => r,
        Err(e) => {
            let error = JsonRpcErrorResponse::new(
                None,
                JsonRpcError::parse_error(format!("Invalid JSON: {}", e)),
            );
            return serde_json::to_string(&error).ok();
        }
    };

    if request.jsonrpc != "2.0" {
        let Some(id) = request.id else {
            tracing::warn!(method = %request.method, "Dropping notification with invalid JSON-RPC version");
            return None;
        };
        let error = JsonRpcErrorResponse::new(
            Some(id),
            JsonRpcError::invalid_request("Invalid JSON-RPC version (expected 2.0)"),
        );
        return serde_json::to_string(&error).ok();
    }

    tracing::debug!(method = %request.method, notification = request.id.is_none(), "Handling request");

    let outcome = handle_request(&request.method, request.params, state).await;
    let Some(id) = request.id else {
        if let Err(error) = outcome {
            tracing::warn!(method = %request.method, code = error.code, message = %error.message, "Notification failed");
        }
        return None;
    };

    match outcome {
        Ok(result) => serde_json::to_string(&JsonRpcResponse::new(id, result)).ok(),
        Err(error) => {
            tracing::warn!(method = %request.method, code = error.code, message = %error.message, "Request failed");
            serde_json::to_string(&JsonRpcErrorResponse::new(Some(id), error)).ok()
        }
    }
}

/// Sends a JSON-RPC notification to stdout.
pub fn send_notification<T: serde::Serialize>(method: &'static str, params: T) {
    let notification = JsonRpcNotification::new(method, params);
    if let Ok(json) = serde_json::to_string(&notification) {
        write_line(&json);
    }
}

fn write_line(line: &str) {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", line).ok();
    stdout.flush().ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryBlobStore, StoreState};
    use tempfile::tempdir;

    fn test_state() -> ServerState {
        ServerState::new(DeskConfig::default(), SettingsStore::in_memory())
    }

    #[test]
    fn server_state_new() {
        let state = test_state();
        assert_eq!(state.store.state(), StoreState::Uninitialized);
        assert!(!state.is_shutdown());
    }

    #[test]
    fn server_state_shutdown() {
        let state = test_state();
        state.shutdown();
        assert!(state.is_shutdown());
    }

    #[tokio::test]
    async fn open_store_transitions_to_ready() {
        let dir = tempdir().unwrap();
        let mut state = ServerState::new(
            DeskConfig {
                store_path: Some(dir.path().join("files")),
                ..Default::default()
            },
            SettingsStore::in_memory(),
        );
        state.open_store().await.unwrap();
        assert_eq!(state.store.state(), StoreState::Ready);
    }

    #[tokio::test]
    async fn failed_open_stays_uninitialized() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let mut state = ServerState::new(
            DeskConfig {
                store_path: Some(blocker),
                ..Default::default()
            },
            SettingsStore::in_memory(),
        );
        assert!(state.open_store().await.is_err());
        assert_eq!(state.store.state(), StoreState::Uninitialized);
    }

    #[tokio::test]
    async fn process_invalid_json() {
        let mut state = test_state();
        let response = process_request("not json", &mut state).await.unwrap();
        assert!(response.contains("-32700"));
    }

    #[tokio::test]
    async fn process_invalid_version() {
        let mut state = test_state();
        let request = r#"{"jsonrpc":"1.0","method":"ping","id":1}"#;
        let response = process_request(request, &mut state).await.unwrap();
        assert!(response.contains("-32600"));
    }

    #[tokio::test]
    async fn process_unknown_method() {
        let mut state = test_state();
        let request = r#"{"jsonrpc":"2.0","method":"unknown","id":1}"#;
        let response = process_request(request, &mut state).await.unwrap();
        assert!(response.contains("-32601"));
    }

    #[tokio::test]
    async fn process_ping_returns_result() {
        let mut state = test_state();
        state.store.install(MemoryBlobStore::new());
        let request = r#"{"jsonrpc":"2.0","method":"ping","id":"a"}"#;
        let response = process_request(request, &mut state).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&response).unwrap();
        assert_eq!(value["id"], "a");
        assert_eq!(value["result"]["status"], "ok");
        assert_eq!(value["result"]["store"], "ready");
    }

    #[tokio::test]
    async fn notification_gets_no_response() {
        let mut state = test_state();
        let request = r#"{"jsonrpc":"2.0","method":"settings_set","params":{"key":"holodesk-notes","value":"[]"}}"#;
        assert!(process_request(request, &mut state).await.is_none());
        assert_eq!(state.settings.get("holodesk-notes"), Some("[]"));
    }

    #[tokio::test]
    async fn failing_notification_gets_no_response() {
        let mut state = test_state();
        let request = r#"{"jsonrpc":"2.0","method":"unknown"}"#;
        assert!(process_request(request, &mut state).await.is_none());

        let request = r#"{"jsonrpc":"1.0","method":"ping"}"#;
        assert!(process_request(request, &mut state).await.is_none());
    }

    #[tokio::test]
    async fn shutdown_notification_stops_server() {
        let mut state = test_state();
        let request = r#"{"jsonrpc":"2.0","method":"shutdown"}"#;
        assert!(process_request(request, &mut state).await.is_none());
        assert!(state.is_shutdown());
    }
}
