//! holodesk: the storage and conversion core of the HoloDesk panel.
//!
//! Decodes audio inputs, re-encodes them as canonical 16-bit PCM WAV and
//! keeps the results in a durable keyed blob store.
//!
//! # Modules
//!
//! - [`audio`]: AudioBuffer, WAV encoder, Symphonia decoder
//! - [`store`]: BlobStore trait with filesystem and in-memory backends
//! - [`conversion`]: input file -> stored record pipeline
//! - [`settings`]: flat key/value settings with export/import
//! - [`types`]: StoredFile and OutputFormat
//! - [`rpc`]: JSON-RPC daemon surface
//! - [`config`], [`error`], [`logging`], [`cli`]: ambient plumbing
//!
//! # Example
//!
//! ```rust,ignore
//! use holodesk::{
//!     audio::{encode, AudioBuffer},
//!     store::{BlobStore, FsBlobStore},
//!     types::StoredFile,
//! };
//!
//! let store = FsBlobStore::open("/tmp/holodesk-files").await?;
//!
//! let buffer = AudioBuffer::new(44100, vec![vec![1.0, -1.0]])?;
//! let wav = encode(&buffer);
//! let file = StoredFile::new("beep.wav", wav.mime_type(), wav.into_bytes());
//! store.put(&file).await?;
//! ```

pub mod audio;
pub mod cli;
pub mod config;
pub mod conversion;
pub mod error;
pub mod logging;
pub mod rpc;
pub mod settings;
pub mod store;
pub mod types;

// Re-export commonly used types at crate root for convenience
pub use audio::{encode, AudioBuffer, WavBytes};
pub use config::DeskConfig;
pub use error::{ErrorCode, HoloError, Result};
pub use store::{BlobStore, FsBlobStore, MemoryBlobStore, StoreSlot, StoreState};
pub use types::{OutputFormat, StoredFile};
