//! Desk configuration module.
//!
//! Contains the runtime configuration for HoloDesk: where converted files
//! and settings live, logging verbosity, and conversion defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::types::OutputFormat;

/// Log levels accepted by `HOLODESK_LOG`.
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Runtime configuration.
///
/// Loaded from environment variables at startup; CLI flags override
/// individual fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeskConfig {
    /// Directory of the converted-files store.
    /// If None, uses the platform-specific default data location.
    pub store_path: Option<PathBuf>,

    /// Path of the settings JSON file.
    /// If None, uses the platform-specific default config location.
    pub settings_path: Option<PathBuf>,

    /// Default log level for the `holodesk` target.
    pub log_level: String,

    /// Output format used when a request does not name one.
    pub default_format: OutputFormat,

    /// Store inputs verbatim when decoding fails.
    pub fallback_to_original: bool,
}

impl DeskConfig {
    /// Creates a DeskConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a DeskConfig from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `HOLODESK_STORE_PATH` - Directory of the converted-files store
    /// - `HOLODESK_SETTINGS_PATH` - Settings JSON file
    /// - `HOLODESK_LOG` - Log level (trace, debug, info, warn, error)
    /// - `HOLODESK_FORMAT` - Default output format (wav, mp3, ogg, aac, flac, mp4, webm)
    /// - `HOLODESK_FALLBACK` - Store originals on decode failure (1/true)
    ///
    /// Falls back to defaults for unset or unparsable variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("HOLODESK_STORE_PATH") {
            config.store_path = Some(PathBuf::from(path));
        }

        if let Ok(path) = std::env::var("HOLODESK_SETTINGS_PATH") {
            config.settings_path = Some(PathBuf::from(path));
        }

        if let Ok(level) = std::env::var("HOLODESK_LOG") {
            let level = level.to_lowercase();
            if LOG_LEVELS.contains(&level.as_str()) {
                config.log_level = level;
            }
        }

        if let Ok(format) = std::env::var("HOLODESK_FORMAT") {
            if let Some(format) = OutputFormat::parse(&format) {
                config.default_format = format;
            }
        }

        if let Ok(flag) = std::env::var("HOLODESK_FALLBACK") {
            config.fallback_to_original = matches!(flag.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        config
    }

    /// Returns the effective store directory, using platform defaults if not specified.
    pub fn effective_store_path(&self) -> PathBuf {
        if let Some(ref path) = self.store_path {
            path.clone()
        } else {
            default_store_path()
        }
    }

    /// Returns the effective settings file, using platform defaults if not specified.
    pub fn effective_settings_path(&self) -> PathBuf {
        if let Some(ref path) = self.settings_path {
            path.clone()
        } else {
            default_settings_path()
        }
    }

    /// Validates the configuration.
    ///
    /// Returns an error message if validation fails, None otherwise.
    pub fn validate(&self) -> Option<String> {
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Some(format!(
                "log level must be one of {}, got {:?}",
                LOG_LEVELS.join(", "),
                self.log_level
            ));
        }

        if let (Some(store), Some(settings)) = (&self.store_path, &self.settings_path) {
            if settings.starts_with(store) {
                return Some(format!(
                    "settings file {} must not live inside the file store {}",
                    settings.display(),
                    store.display()
                ));
            }
        }

        None
    }
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            store_path: None,
            settings_path: None,
            log_level: "info".to_string(),
            default_format: OutputFormat::default(),
            fallback_to_original: false,
        }
    }
}

/// Returns the platform-specific default store directory.
///
/// Uses the `directories` crate to find appropriate locations:
/// - macOS: ~/Library/Application Support/holodesk/files
/// - Linux: ~/.local/share/holodesk/files
/// - Windows: C:\Users\<user>\AppData\Roaming\holodesk\data\files
fn default_store_path() -> PathBuf {
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "holodesk") {
        proj_dirs.data_dir().join("files")
    } else {
        // Fallback to current directory
        PathBuf::from("./holodesk-files")
    }
}

/// Returns the platform-specific default settings file.
fn default_settings_path() -> PathBuf {
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "holodesk") {
        proj_dirs.config_dir().join("settings.json")
    } else {
        PathBuf::from("./holodesk-settings.json")
    }
}
