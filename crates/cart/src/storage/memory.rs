//! In-process storage area.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use nosorog_core::ViewId;
use tokio::sync::broadcast;
use tracing::trace;

use super::{DEFAULT_QUOTA, EVENT_CHANNEL_CAPACITY, Storage, StorageError, StorageEvent, entry_size};

/// Storage area held in memory.
///
/// Every handle is one view. [`MemoryStorage::open_view`] returns a handle on
/// the same area under a new view identity, which is how tests stand in for a
/// second browser tab.
pub struct MemoryStorage {
    area: Arc<Area>,
    view: ViewId,
}

struct Area {
    entries: Mutex<HashMap<String, String>>,
    events: broadcast::Sender<StorageEvent>,
    quota: usize,
}

impl MemoryStorage {
    /// Create an empty area with the default quota.
    #[must_use]
    pub fn new() -> Self {
        Self::with_quota(DEFAULT_QUOTA)
    }

    /// Create an empty area that holds at most `quota` UTF-16 code units.
    #[must_use]
    pub fn with_quota(quota: usize) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            area: Arc::new(Area {
                entries: Mutex::new(HashMap::new()),
                events,
                quota,
            }),
            view: ViewId::random(),
        }
    }

    /// Open another view on the same area.
    #[must_use]
    pub fn open_view(&self) -> Self {
        Self {
            area: Arc::clone(&self.area),
            view: ViewId::random(),
        }
    }

    /// Total size of the area in UTF-16 code units.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` if the area lock is poisoned.
    pub fn used(&self) -> Result<usize, StorageError> {
        let entries = self
            .area
            .entries
            .lock()
            .map_err(|_| StorageError::Unavailable)?;
        Ok(entries.iter().map(|(k, v)| entry_size(k, v)).sum())
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    fn view_id(&self) -> ViewId {
        self.view
    }

    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .area
            .entries
            .lock()
            .map_err(|_| StorageError::Unavailable)?;
        Ok(entries.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let old_value = {
            let mut entries = self
                .area
                .entries
                .lock()
                .map_err(|_| StorageError::Unavailable)?;

            let used: usize = entries.iter().map(|(k, v)| entry_size(k, v)).sum();
            let replaced = entries.get(key).map_or(0, |old| entry_size(key, old));
            if used - replaced + entry_size(key, value) > self.area.quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_owned(),
                    limit: self.area.quota,
                });
            }

            entries.insert(key.to_owned(), value.to_owned())
        };

        // Writes that leave the value unchanged are not announced
        if old_value.as_deref() == Some(value) {
            return Ok(());
        }

        let event = StorageEvent {
            key: key.to_owned(),
            old_value,
            new_value: Some(value.to_owned()),
            origin: Some(self.view),
        };
        // No receivers is fine: nobody is listening yet
        let receivers = self.area.events.send(event).unwrap_or(0);
        trace!(key, view = %self.view, receivers, "Storage item set");
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.area.events.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing_key() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get_item("nosorogEquipmentCart").unwrap(), None);
    }

    #[test]
    fn test_views_share_entries() {
        let first = MemoryStorage::new();
        let second = first.open_view();
        first.set_item("k", "[]").unwrap();
        assert_eq!(second.get_item("k").unwrap().as_deref(), Some("[]"));
        assert_ne!(first.view_id(), second.view_id());
    }

    #[test]
    fn test_set_announces_change_with_origin() {
        let first = MemoryStorage::new();
        let second = first.open_view();
        let mut events = second.subscribe();

        first.set_item("k", "a").unwrap();
        first.set_item("k", "b").unwrap();

        let event = events.try_recv().unwrap();
        assert_eq!(event.key, "k");
        assert_eq!(event.old_value, None);
        assert_eq!(event.new_value.as_deref(), Some("a"));
        assert_eq!(event.origin, Some(first.view_id()));
        assert!(event.is_foreign_to(second.view_id()));
        assert!(!event.is_foreign_to(first.view_id()));

        let event = events.try_recv().unwrap();
        assert_eq!(event.old_value.as_deref(), Some("a"));
        assert_eq!(event.new_value.as_deref(), Some("b"));
    }

    #[test]
    fn test_unchanged_value_is_not_announced() {
        let storage = MemoryStorage::new();
        storage.set_item("k", "a").unwrap();
        let mut events = storage.subscribe();
        storage.set_item("k", "a").unwrap();
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_quota_exceeded_leaves_value_untouched() {
        let storage = MemoryStorage::with_quota(8);
        storage.set_item("k", "1234").unwrap();
        let err = storage.set_item("k", "123456789").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { limit: 8, .. }));
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("1234"));
    }

    #[test]
    fn test_quota_accounts_for_replaced_value() {
        let storage = MemoryStorage::with_quota(8);
        storage.set_item("k", "1234567").unwrap();
        // Replacing the value frees the old bytes first
        storage.set_item("k", "7654321").unwrap();
        assert_eq!(storage.used().unwrap(), 8);
    }
}
