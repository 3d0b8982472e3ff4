//! JSON-RPC method handlers.
//!
//! Implements the handlers for all supported JSON-RPC methods.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::conversion::{convert_with_progress, ConvertRequest, CANCEL_UNSUPPORTED_MESSAGE};

use super::server::{send_notification, ServerState};
use super::types::{
    ConversionProgressParams, ConvertFileParams, ConvertFileResult, FileIdParams, GetFileResult,
    JsonRpcError, ListFilesResult, SettingsImportParams, SettingsKeyParams, SettingsSetParams,
};

/// Handles a JSON-RPC method call.
pub async fn handle_request(
    method: &str,
    params: Value,
    state: &mut ServerState,
) -> Result<Value, JsonRpcError> {
    match method {
        "ping" => handle_ping(state),
        "shutdown" => handle_shutdown(state),
        "open_store" => handle_open_store(state).await,
        "convert_file" => handle_convert_file(params, state).await,
        "cancel" => handle_cancel(),
        "list_files" => handle_list_files(state).await,
        "get_file" => handle_get_file(params, state).await,
        "delete_file" => handle_delete_file(params, state).await,
        "settings_keys" => handle_settings_keys(state),
        "settings_get" => handle_settings_get(params, state),
        "settings_set" => handle_settings_set(params, state).await,
        "settings_delete" => handle_settings_delete(params, state).await,
        "settings_export" => handle_settings_export(state),
        "settings_import" => handle_settings_import(params, state).await,
        _ => Err(JsonRpcError::method_not_found(method)),
    }
}

fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, JsonRpcError> {
    serde_json::from_value(params)
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {}", e)))
}

fn to_value<T: Serialize>(result: T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(result)
        .map_err(|e| JsonRpcError::internal_error(format!("Failed to serialize result: {}", e)))
}

/// Handles the ping method for health checks.
fn handle_ping(state: &ServerState) -> Result<Value, JsonRpcError> {
    Ok(serde_json::json!({
        "status": "ok",
        "store": state.store.state().as_str(),
    }))
}

/// Handles the shutdown method.
fn handle_shutdown(state: &mut ServerState) -> Result<Value, JsonRpcError> {
    state.shutdown();
    Ok(serde_json::json!({ "status": "shutting_down" }))
}

/// Retries opening the file store.
async fn handle_open_store(state: &mut ServerState) -> Result<Value, JsonRpcError> {
    state.open_store().await?;
    Ok(serde_json::json!({ "status": state.store.state().as_str() }))
}

/// Handles the convert_file method.
async fn handle_convert_file(params: Value, state: &mut ServerState) -> Result<Value, JsonRpcError> {
    let params: ConvertFileParams = parse_params(params)?;
    let data = params.decode_data()?;
    let store = state.store.store()?;

    let request = ConvertRequest::new(
        params.name.clone(),
        params.mime_type,
        data,
        params.format.unwrap_or(state.config.default_format),
    )
    .with_fallback(params.fallback.unwrap_or(state.config.fallback_to_original));

    let name = params.name;
    let outcome = convert_with_progress(store, request, |stage| {
        send_notification(
            "conversion_progress",
            ConversionProgressParams::new(name.as_str(), stage),
        );
    })
    .await?;

    to_value(ConvertFileResult {
        file: outcome.file.info(),
        kind: outcome.kind,
    })
}

/// Conversions cannot be cancelled; this only reports that.
fn handle_cancel() -> Result<Value, JsonRpcError> {
    Ok(serde_json::json!({
        "cancelled": false,
        "message": CANCEL_UNSUPPORTED_MESSAGE,
    }))
}

/// Handles the list_files method. Payloads are omitted.
async fn handle_list_files(state: &ServerState) -> Result<Value, JsonRpcError> {
    let files = state.store.store()?.list_all().await?;
    to_value(ListFilesResult {
        files: files.iter().map(|f| f.info()).collect(),
    })
}

/// Handles the get_file method used for downloads.
async fn handle_get_file(params: Value, state: &ServerState) -> Result<Value, JsonRpcError> {
    let params: FileIdParams = parse_params(params)?;
    match state.store.store()?.get(&params.id).await? {
        Some(file) => to_value(GetFileResult::from(file)),
        None => Err(JsonRpcError::file_not_found(&params.id)),
    }
}

/// Handles the delete_file method. Unknown ids succeed.
async fn handle_delete_file(params: Value, state: &ServerState) -> Result<Value, JsonRpcError> {
    let params: FileIdParams = parse_params(params)?;
    state.store.store()?.delete(&params.id).await?;
    Ok(serde_json::json!({ "status": "deleted", "id": params.id }))
}

fn handle_settings_keys(state: &ServerState) -> Result<Value, JsonRpcError> {
    Ok(serde_json::json!({ "keys": state.settings.keys() }))
}

fn handle_settings_get(params: Value, state: &ServerState) -> Result<Value, JsonRpcError> {
    let params: SettingsKeyParams = parse_params(params)?;
    Ok(serde_json::json!({
        "key": params.key,
        "value": state.settings.get(&params.key),
    }))
}

async fn handle_settings_set(params: Value, state: &mut ServerState) -> Result<Value, JsonRpcError> {
    let params: SettingsSetParams = parse_params(params)?;
    state.settings.set(params.key.clone(), params.value).await?;
    Ok(serde_json::json!({ "status": "saved", "key": params.key }))
}

async fn handle_settings_delete(params: Value, state: &mut ServerState) -> Result<Value, JsonRpcError> {
    let params: SettingsKeyParams = parse_params(params)?;
    let deleted = state.settings.remove(&params.key).await?;
    Ok(serde_json::json!({ "deleted": deleted, "key": params.key }))
}

fn handle_settings_export(state: &ServerState) -> Result<Value, JsonRpcError> {
    to_value(state.settings.export())
}

async fn handle_settings_import(params: Value, state: &mut ServerState) -> Result<Value, JsonRpcError> {
    let params: SettingsImportParams = parse_params(params)?;
    let imported = state.settings.import(&params.document.to_string()).await?;
    Ok(serde_json::json!({ "imported": imported }))
}
