//! Key/value storage areas shared between open views.
//!
//! A storage area behaves like the browser's local storage: string keys map to
//! string values, every write replaces a whole value, and each write made
//! through one view is announced to every other view as a [`StorageEvent`].
//!
//! # Backends
//!
//! - [`MemoryStorage`] - In-process area; `open_view` hands out further views
//! - [`FileStorage`] - One file per key in a directory, shared across processes

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use nosorog_core::ViewId;
use thiserror::Error;
use tokio::sync::broadcast;

/// Capacity of the change notification channel per storage area.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Default storage quota in UTF-16 code units, matching common browsers.
pub const DEFAULT_QUOTA: usize = 5 * 1024 * 1024;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The write would push the area past its quota.
    #[error("quota of {limit} exceeded while writing {key}")]
    QuotaExceeded {
        /// Key being written.
        key: String,
        /// Quota of the area.
        limit: usize,
    },

    /// The backing file system failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The area's lock was poisoned by a panicking writer.
    #[error("storage area is unavailable")]
    Unavailable,
}

/// Notification that a key in the area changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    /// Key that changed.
    pub key: String,
    /// Value before the change.
    pub old_value: Option<String>,
    /// Value after the change.
    pub new_value: Option<String>,
    /// View that made the change; `None` when it came from outside this
    /// process and the writer is unknown.
    pub origin: Option<ViewId>,
}

impl StorageEvent {
    /// Returns `true` if the change was made by some view other than `view`.
    #[must_use]
    pub fn is_foreign_to(&self, view: ViewId) -> bool {
        self.origin != Some(view)
    }
}

/// A view's handle on a shared storage area.
pub trait Storage: Send + Sync {
    /// Identity of the view this handle belongs to.
    fn view_id(&self) -> ViewId;

    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::QuotaExceeded` if the area is full, or another
    /// `StorageError` if the backend cannot be written.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Subscribe to change notifications for every view of the area.
    fn subscribe(&self) -> broadcast::Receiver<StorageEvent>;
}

/// Size of an entry as browsers account for it: UTF-16 code units of key
/// and value together.
pub(crate) fn entry_size(key: &str, value: &str) -> usize {
    key.encode_utf16().count() + value.encode_utf16().count()
}
