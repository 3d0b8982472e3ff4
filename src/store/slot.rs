//! Optional store handle with an explicit lifecycle.

use super::BlobStore;
use crate::error::{HoloError, Result};

/// Lifecycle state of a [`StoreSlot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    /// No store has been opened yet, or opening failed.
    Uninitialized,
    /// A store is open and accepts record operations.
    Ready,
}

impl StoreState {
    /// Returns the string representation of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreState::Uninitialized => "uninitialized",
            StoreState::Ready => "ready",
        }
    }
}

/// Holds the blob store once it has been opened.
///
/// Record operations go through [`StoreSlot::store`], which fails fast
/// with `STORAGE_UNAVAILABLE` while the slot is uninitialized.
#[derive(Default)]
pub struct StoreSlot {
    store: Option<Box<dyn BlobStore>>,
    last_error: Option<String>,
}

impl StoreSlot {
    /// Creates an empty slot.
    pub fn uninitialized() -> Self {
        Self::default()
    }

    /// Creates a slot holding an open store.
    pub fn ready(store: impl BlobStore + 'static) -> Self {
        Self {
            store: Some(Box::new(store)),
            last_error: None,
        }
    }

    /// Installs an open store, transitioning to Ready.
    pub fn install(&mut self, store: impl BlobStore + 'static) {
        self.store = Some(Box::new(store));
        self.last_error = None;
    }

    /// Records a failed open attempt. The slot stays Uninitialized.
    pub fn record_failure(&mut self, reason: impl Into<String>) {
        self.last_error = Some(reason.into());
    }

    /// Current lifecycle state.
    pub fn state(&self) -> StoreState {
        if self.store.is_some() {
            StoreState::Ready
        } else {
            StoreState::Uninitialized
        }
    }

    /// Returns the open store, or `STORAGE_UNAVAILABLE` if there is none.
    pub fn store(&self) -> Result<&dyn BlobStore> {
        match &self.store {
            Some(store) => Ok(store.as_ref()),
            None => Err(HoloError::storage_unavailable(
                self.last_error
                    .clone()
                    .unwrap_or_else(|| "store has not been opened".to_string()),
            )),
        }
    }
}
