//! Unified error handling for cart operations.
//!
//! Every mutation returns `Result<T, CartError>`. Decode failures never show
//! up here: an unreadable partition is treated as empty by the store.

use nosorog_core::{Category, CategoryError, ItemId};
use thiserror::Error;

use crate::storage::StorageError;

/// Cart-level error type.
#[derive(Debug, Error)]
pub enum CartError {
    /// The category tag is not one of the recognized categories.
    #[error("Rejected: {0}")]
    UnknownCategory(#[from] CategoryError),

    /// No item sits at this position of the aggregate cart.
    #[error("No cart item at index {index} (cart has {len} items)")]
    IndexOutOfRange {
        /// Requested aggregate position.
        index: usize,
        /// Number of items in the aggregate at resolution time.
        len: usize,
    },

    /// No item carries this identity.
    #[error("No cart item with id {0}")]
    ItemNotFound(ItemId),

    /// Writing a partition back to storage failed.
    #[error("Failed to persist {category} partition: {source}")]
    Persist {
        /// Partition whose write failed.
        category: Category,
        /// Underlying storage failure.
        #[source]
        source: StorageError,
    },

    /// Clearing stopped partway; the listed partitions were already emptied.
    #[error("Cart only partially cleared ({cleared:?} emptied), {failed} failed: {source}")]
    PartialClear {
        /// Partitions emptied before the failure.
        cleared: Vec<Category>,
        /// Partition whose write failed.
        failed: Category,
        /// Underlying storage failure.
        #[source]
        source: StorageError,
    },

    /// A partition could not be encoded.
    #[error("Encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_error_display() {
        let err = CartError::from(CategoryError::Unknown("services".to_string()));
        assert_eq!(err.to_string(), "Rejected: unknown category: services");

        let err = CartError::IndexOutOfRange { index: 3, len: 2 };
        assert_eq!(err.to_string(), "No cart item at index 3 (cart has 2 items)");

        let err = CartError::ItemNotFound(ItemId::new(7));
        assert_eq!(err.to_string(), "No cart item with id 7");
    }

    #[test]
    fn test_persist_error_names_partition() {
        let err = CartError::Persist {
            category: Category::Pharma,
            source: StorageError::QuotaExceeded {
                key: "nosorogPharmaCart".to_string(),
                limit: 10,
            },
        };
        assert!(err.to_string().starts_with("Failed to persist pharma partition"));
    }
}
