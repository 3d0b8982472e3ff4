//! Core types for HoloDesk.
//!
//! - [`StoredFile`]: a converted or verbatim file persisted in the blob store
//! - [`OutputFormat`]: conversion targets offered by the converter

mod format;
mod stored_file;

// Re-export all types at the module level
pub use format::{extension_for_mime, mime_for_path, output_name, with_wav_extension, OutputFormat};
pub use stored_file::{now_iso8601, StoredFile, StoredFileInfo};
