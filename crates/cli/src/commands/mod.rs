//! CLI command implementations.

pub mod cart;
pub mod watch;

use nosorog_cart::{CartConfig, CartError, CartService, ConfigError, FileStorage, StorageError};
use nosorog_core::ItemId;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Storage area could not be opened or polled.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Cart operation failed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// JSON output could not be produced.
    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Loaded configuration plus the storage area it points at.
pub struct Context {
    pub config: CartConfig,
    pub storage: FileStorage,
}

impl Context {
    /// Load configuration from the environment and open the storage area.
    ///
    /// # Errors
    ///
    /// Returns `CommandError` if configuration is invalid or the storage
    /// directory cannot be opened.
    pub fn from_env() -> Result<Self, CommandError> {
        let config = CartConfig::from_env()?;
        let storage = FileStorage::open_with_quota(&config.storage_dir, config.storage_quota)?;
        tracing::debug!(dir = %config.storage_dir.display(), "Storage area opened");
        Ok(Self { config, storage })
    }

    /// A cart service on a fresh view of the storage area.
    #[must_use]
    pub fn cart(&self) -> CartService<FileStorage> {
        CartService::new(self.storage.open_view())
    }
}

/// How a command addresses a cart line.
#[derive(Debug, Clone, Copy)]
pub enum Line {
    Index(usize),
    Id(ItemId),
}
