//! holodesk: audio-to-WAV converter and durable file store.
//!
//! This binary can run in two modes:
//! - CLI mode: one-shot convert / list / export / delete against the store
//! - Daemon mode: JSON-RPC server over stdio for the panel UI

use std::path::Path;

use holodesk::cli::{Cli, Mode};
use holodesk::config::DeskConfig;
use holodesk::conversion::{convert_with_progress, ConversionKind, ConvertRequest};
use holodesk::error::{HoloError, Result};
use holodesk::logging::init_logging;
use holodesk::rpc::{run_server, ServerState};
use holodesk::settings::SettingsStore;
use holodesk::store::{BlobStore, FsBlobStore};
use holodesk::types::mime_for_path;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let mut config = DeskConfig::from_env();
    cli.apply_to(&mut config);
    if let Some(problem) = config.validate() {
        eprintln!("Invalid configuration: {}", problem);
        std::process::exit(2);
    }

    init_logging(&config.log_level);

    match cli.mode() {
        Mode::Daemon => run_daemon_mode(config).await,
        Mode::Convert(path) => run_convert(&config, &path).await,
        Mode::List => run_list(&config).await,
        Mode::Export(id) => run_export(&cli, &config, &id).await,
        Mode::Delete(id) => run_delete(&config, &id).await,
        Mode::Usage => {
            print_usage();
            Ok(())
        }
    }
}

/// Converts one file and stores the result.
async fn run_convert(config: &DeskConfig, path: &Path) -> Result<()> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| HoloError::input_unreadable(path.display().to_string(), e))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "input".to_string());

    let store = FsBlobStore::open(config.effective_store_path()).await?;

    eprintln!("=== holodesk convert ===");
    eprintln!("Input: {} ({} bytes)", path.display(), data.len());
    eprintln!("Format: {}", config.default_format);
    eprintln!("Store: {}", store.root().display());
    eprintln!();

    let request = ConvertRequest::new(name, mime_for_path(path), data, config.default_format)
        .with_fallback(config.fallback_to_original);

    let outcome = convert_with_progress(&store, request, |stage| {
        eprintln!("[{:>3}%] {}", stage.percent(), stage.message());
    })
    .await?;

    eprintln!();
    match outcome.kind {
        ConversionKind::Converted => eprintln!("Complete! (converted to WAV format)"),
        ConversionKind::StoredOriginal => eprintln!("File stored without conversion"),
    }
    println!("{}\t{}\t{}", outcome.file.id, outcome.file.name, outcome.file.size_mb());
    Ok(())
}

/// Lists stored files, oldest first.
async fn run_list(config: &DeskConfig) -> Result<()> {
    let store = FsBlobStore::open(config.effective_store_path()).await?;
    let mut files = store.list_all().await?;

    if files.is_empty() {
        eprintln!("No files converted yet.");
        return Ok(());
    }

    files.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    for file in &files {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            file.id,
            file.name,
            file.mime_type,
            file.size_mb(),
            file.timestamp
        );
    }
    Ok(())
}

/// Writes a stored file to disk.
async fn run_export(cli: &Cli, config: &DeskConfig, id: &str) -> Result<()> {
    let store = FsBlobStore::open(config.effective_store_path()).await?;
    let Some(file) = store.get(id).await? else {
        eprintln!("No stored file with id {}", id);
        std::process::exit(1);
    };

    let destination = cli.export_path(&file.name);
    tokio::fs::write(&destination, &file.blob)
        .await
        .map_err(|e| HoloError::storage_io(format!("Failed to write {}", destination.display()), e))?;

    eprintln!("Saved to: {}", destination.display());
    Ok(())
}

/// Deletes a stored file.
async fn run_delete(config: &DeskConfig, id: &str) -> Result<()> {
    let store = FsBlobStore::open(config.effective_store_path()).await?;
    store.delete(id).await?;
    eprintln!("Deleted {}", id);
    Ok(())
}

/// Runs the daemon mode (JSON-RPC server).
async fn run_daemon_mode(config: DeskConfig) -> Result<()> {
    let settings = SettingsStore::open(config.effective_settings_path()).await?;
    let mut state = ServerState::new(config, settings);

    // A failed open is reported to clients on every file method; they may retry with open_store.
    if state.open_store().await.is_err() {
        tracing::warn!("Starting with the file store unavailable");
    }

    run_server(state).await
}

/// Prints usage information.
fn print_usage() {
    eprintln!("holodesk: audio-to-WAV converter and file store");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  Convert (audio becomes 16-bit PCM WAV, anything else is stored as-is):");
    eprintln!("    holodesk --convert song.mp3");
    eprintln!();
    eprintln!("  Manage stored files:");
    eprintln!("    holodesk --list");
    eprintln!("    holodesk --export <ID> --output song.wav");
    eprintln!("    holodesk --delete <ID>");
    eprintln!();
    eprintln!("  Daemon mode (JSON-RPC server):");
    eprintln!("    holodesk --daemon");
    eprintln!();
    eprintln!("Run 'holodesk --help' for full options.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_usage_doesnt_panic() {
        print_usage();
    }
}
