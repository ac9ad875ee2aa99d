//! Identifiers for cart items and open views.

use core::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identity of a line item.
///
/// Minted from the wall clock in milliseconds when the item is added, the same
/// value the storefront has always written into the `id` field. Mutations can
/// address an item by this identity instead of by its position in the
/// aggregate cart, which shifts whenever another view edits a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(i64);

impl ItemId {
    /// Create an ID from a raw value.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the underlying i64 value.
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }

    /// Mint a fresh ID that sorts after every ID in `taken`.
    ///
    /// Uses the current time in milliseconds unless an existing ID is already
    /// at or past it (two adds within the same millisecond, or a view with a
    /// skewed clock), in which case the largest taken ID plus one is used.
    #[must_use]
    pub fn mint<I>(taken: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        let now = Utc::now().timestamp_millis();
        let floor = taken
            .into_iter()
            .map(|id| id.0.saturating_add(1))
            .max()
            .unwrap_or(i64::MIN);
        Self(now.max(floor))
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<ItemId> for i64 {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

/// Identity of one open view (page, tab or process) sharing a storage area.
///
/// Change notifications carry the writer's view ID so a view can ignore its
/// own writes and react only to those made elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewId(Uuid);

impl ViewId {
    /// Generate a random view ID.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mint_without_taken_ids_uses_clock() {
        let before = Utc::now().timestamp_millis();
        let id = ItemId::mint([]);
        assert!(id.as_i64() >= before);
    }

    #[test]
    fn test_mint_sorts_after_taken_ids() {
        let far_future = ItemId::new(i64::MAX - 10);
        let id = ItemId::mint([ItemId::new(1), far_future]);
        assert_eq!(id, ItemId::new(i64::MAX - 9));
    }

    #[test]
    fn test_mint_saturates() {
        let id = ItemId::mint([ItemId::new(i64::MAX)]);
        assert_eq!(id.as_i64(), i64::MAX);
    }

    #[test]
    fn test_view_ids_are_unique() {
        assert_ne!(ViewId::random(), ViewId::random());
    }

    #[test]
    fn test_item_id_serializes_as_number() {
        let json = serde_json::to_string(&ItemId::new(1_700_000_000_000)).ok();
        assert_eq!(json.as_deref(), Some("1700000000000"));
    }
}
