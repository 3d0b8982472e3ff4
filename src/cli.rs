//! CLI argument parser.
//!
//! Provides one-shot commands against the file store (convert, list,
//! export, delete) and the switch into daemon mode.

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::config::DeskConfig;
use crate::types::OutputFormat;

/// Export file name used when the stored name has no usable final component.
pub const DEFAULT_EXPORT_NAME: &str = "holodesk-export";

/// What the binary was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Daemon,
    Convert(PathBuf),
    List,
    Export(String),
    Delete(String),
    Usage,
}

/// holodesk: audio-to-WAV converter and file store
#[derive(Parser, Debug)]
#[command(name = "holodesk")]
#[command(about = "Convert audio to WAV and manage the HoloDesk file store")]
#[command(version)]
pub struct Cli {
    /// Input file to convert and store
    #[arg(short, long)]
    pub convert: Option<PathBuf>,

    /// Output format for --convert
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Store the input unchanged if it cannot be decoded
    #[arg(long)]
    pub fallback: bool,

    /// List stored files
    #[arg(short, long)]
    pub list: bool,

    /// Write the stored file with this id to disk
    #[arg(short, long)]
    pub export: Option<String>,

    /// Destination for --export (defaults to the stored file name)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Delete the stored file with this id
    #[arg(long)]
    pub delete: Option<String>,

    /// Directory of the file store
    #[arg(long)]
    pub store_dir: Option<PathBuf>,

    /// Settings file
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Run in daemon mode (JSON-RPC over stdio)
    #[arg(long)]
    pub daemon: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Resolves the requested mode. Daemon mode wins over one-shot commands.
    pub fn mode(&self) -> Mode {
        if self.daemon {
            Mode::Daemon
        } else if let Some(ref path) = self.convert {
            Mode::Convert(path.clone())
        } else if self.list {
            Mode::List
        } else if let Some(ref id) = self.export {
            Mode::Export(id.clone())
        } else if let Some(ref id) = self.delete {
            Mode::Delete(id.clone())
        } else {
            Mode::Usage
        }
    }

    /// Applies command-line overrides to the configuration.
    pub fn apply_to(&self, config: &mut DeskConfig) {
        if let Some(ref dir) = self.store_dir {
            config.store_path = Some(dir.clone());
        }
        if let Some(ref path) = self.settings {
            config.settings_path = Some(path.clone());
        }
        if let Some(ref level) = self.log_level {
            config.log_level = level.to_lowercase();
        }
        if let Some(format) = self.format {
            config.default_format = format;
        }
        if self.fallback {
            config.fallback_to_original = true;
        }
    }

    /// Returns the export destination.
    ///
    /// Defaults to the final component of the stored name, placed in the
    /// current directory. Stored names are caller-supplied and never used
    /// as a path.
    pub fn export_path(&self, stored_name: &str) -> PathBuf {
        if let Some(ref output) = self.output {
            return output.clone();
        }
        Path::new(stored_name)
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_NAME))
    }
}
