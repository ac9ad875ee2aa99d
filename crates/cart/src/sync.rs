//! Cross-view synchronization.
//!
//! Several views (tabs, windows, processes) share one storage area. When a
//! different view writes one of the cart partitions, this view's observers
//! must see the new state. [`SyncBroadcaster`] listens to the area's change
//! notifications, keeps only those for the three partition keys that came
//! from another view, and for each one has the [`CartService`] recompute its
//! snapshot from storage and republish it.
//!
//! Every notification triggers its own full recomputation; nothing is merged
//! or deduplicated. Local knowledge is simply replaced by whatever the
//! partitions hold at that moment.
//!
//! # Consistency window
//!
//! Writes are last-writer-wins per whole partition. If this view writes a
//! partition and another view then writes the same partition from a copy it
//! read earlier, the later notification carries the stale copy and this view's
//! write is gone. That window is accepted; it cannot be closed without a
//! transactional store.

use nosorog_core::{Category, ViewId};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, info, warn};

use crate::observer::CartSnapshot;
use crate::service::CartService;
use crate::storage::{Storage, StorageEvent};

/// Subscription state of a broadcaster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Not listening yet.
    Unsubscribed,
    /// Listening for the rest of the view's life.
    Subscribed,
}

/// Reason to recompute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Another view wrote a partition.
    Changed(StorageEvent),
    /// Notifications were dropped because this view fell behind; the
    /// partitions may have changed in any way.
    Missed(u64),
}

impl Trigger {
    /// Category whose partition changed, when known.
    #[must_use]
    pub fn category(&self) -> Option<Category> {
        match self {
            Self::Changed(event) => Category::from_storage_key(&event.key),
            Self::Missed(_) => None,
        }
    }
}

struct Subscription {
    view: ViewId,
    receiver: broadcast::Receiver<StorageEvent>,
}

/// Republishes the cart when other views change it.
pub struct SyncBroadcaster {
    subscription: Option<Subscription>,
}

impl SyncBroadcaster {
    /// Create an unsubscribed broadcaster.
    #[must_use]
    pub const fn new() -> Self {
        Self { subscription: None }
    }

    /// Current subscription state.
    #[must_use]
    pub const fn state(&self) -> SyncState {
        if self.subscription.is_some() {
            SyncState::Subscribed
        } else {
            SyncState::Unsubscribed
        }
    }

    /// Start listening to `storage`'s area. Subscribing again is a no-op.
    pub fn subscribe<S: Storage>(&mut self, storage: &S) {
        if self.subscription.is_some() {
            return;
        }
        let view = storage.view_id();
        self.subscription = Some(Subscription {
            view,
            receiver: storage.subscribe(),
        });
        info!(view = %view, "Cart sync subscribed");
    }

    /// Take the next pending trigger without waiting.
    pub fn try_next(&mut self) -> Option<Trigger> {
        let subscription = self.subscription.as_mut()?;
        loop {
            match subscription.receiver.try_recv() {
                Ok(event) if watches(subscription.view, &event) => {
                    return Some(Trigger::Changed(event));
                }
                Ok(_) => {}
                Err(TryRecvError::Lagged(missed)) => {
                    warn!(missed, "Cart sync fell behind");
                    return Some(Trigger::Missed(missed));
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Wait for the next trigger. Returns `None` if unsubscribed or the
    /// storage area is gone.
    pub async fn recv(&mut self) -> Option<Trigger> {
        let subscription = self.subscription.as_mut()?;
        loop {
            match subscription.receiver.recv().await {
                Ok(event) if watches(subscription.view, &event) => {
                    return Some(Trigger::Changed(event));
                }
                Ok(_) => {}
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "Cart sync fell behind");
                    return Some(Trigger::Missed(missed));
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Recompute and republish once for every pending trigger.
    ///
    /// Returns the number of recomputations.
    pub fn pump<S: Storage>(&mut self, cart: &CartService<S>) -> usize {
        let mut recomputed = 0;
        while let Some(trigger) = self.try_next() {
            debug!(category = ?trigger.category(), "Partition changed in another view");
            cart.publish();
            recomputed += 1;
        }
        recomputed
    }

    /// Wait for the next trigger, then recompute and republish.
    pub async fn run_once<S: Storage>(&mut self, cart: &CartService<S>) -> Option<CartSnapshot> {
        let trigger = self.recv().await?;
        debug!(category = ?trigger.category(), "Partition changed in another view");
        Some(cart.publish())
    }
}

impl Default for SyncBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns `true` for changes to a cart partition made by another view.
fn watches(view: ViewId, event: &StorageEvent) -> bool {
    event.is_foreign_to(view) && Category::from_storage_key(&event.key).is_some()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    use nosorog_core::Price;

    use super::*;
    use crate::storage::MemoryStorage;

    struct Tab {
        cart: CartService<MemoryStorage>,
        sync: SyncBroadcaster,
        badge: Arc<AtomicU64>,
        renders: Arc<AtomicUsize>,
    }

    fn open_tab(storage: MemoryStorage) -> Tab {
        let badge = Arc::new(AtomicU64::new(0));
        let renders = Arc::new(AtomicUsize::new(0));
        let mut cart = CartService::new(storage);
        {
            let badge = Arc::clone(&badge);
            let renders = Arc::clone(&renders);
            cart.add_listener(move |snapshot| {
                badge.store(snapshot.count, Ordering::SeqCst);
                renders.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
        let mut sync = SyncBroadcaster::new();
        sync.subscribe(cart.storage());
        Tab {
            cart,
            sync,
            badge,
            renders,
        }
    }

    #[test]
    fn test_initial_state_is_unsubscribed() {
        let mut sync = SyncBroadcaster::new();
        assert_eq!(sync.state(), SyncState::Unsubscribed);
        assert!(sync.try_next().is_none());

        let cart = CartService::new(MemoryStorage::new());
        assert_eq!(sync.pump(&cart), 0);

        sync.subscribe(cart.storage());
        sync.subscribe(cart.storage());
        assert_eq!(sync.state(), SyncState::Subscribed);
    }

    #[test]
    fn test_remote_change_updates_badge() {
        let storage = MemoryStorage::new();
        let mut local = open_tab(storage.open_view());
        let mut remote = open_tab(storage.open_view());

        remote.cart.add_item("Gloves", Price::new(1500), "equipment").unwrap();
        remote.cart.change_quantity(0, crate::Adjustment::Increment).unwrap();

        assert_eq!(local.badge.load(Ordering::SeqCst), 0);
        assert_eq!(local.sync.pump(&local.cart), 2);
        assert_eq!(local.badge.load(Ordering::SeqCst), local.cart.count());
        assert_eq!(local.badge.load(Ordering::SeqCst), 2);

        // The remote tab ignores its own writes
        assert_eq!(remote.sync.pump(&remote.cart), 0);
    }

    #[test]
    fn test_every_notification_recomputes() {
        let storage = MemoryStorage::new();
        let mut local = open_tab(storage.open_view());
        let mut remote = open_tab(storage.open_view());

        for name in ["Gloves", "Wraps", "Mouthguard"] {
            remote.cart.add_item(name, Price::new(100), "equipment").unwrap();
        }
        let renders_before = local.renders.load(Ordering::SeqCst);
        assert_eq!(local.sync.pump(&local.cart), 3);
        assert_eq!(local.renders.load(Ordering::SeqCst), renders_before + 3);
        // No notifications remain
        assert_eq!(local.sync.pump(&local.cart), 0);
    }

    #[test]
    fn test_ignores_unrelated_keys() {
        let storage = MemoryStorage::new();
        let mut local = open_tab(storage.open_view());
        let other = storage.open_view();
        other.set_item("theme", "dark").unwrap();
        assert_eq!(local.sync.pump(&local.cart), 0);
    }

    #[test]
    fn test_lagging_view_still_recomputes() {
        let storage = MemoryStorage::new();
        let mut local = open_tab(storage.open_view());
        let remote = storage.open_view();
        let key = Category::Equipment.storage_key();
        for i in 0..(crate::storage::EVENT_CHANNEL_CAPACITY + 5) {
            remote
                .set_item(key, &format!("[{{\"name\":\"Item\",\"price\":{i}}}]"))
                .unwrap();
        }

        assert!(matches!(local.sync.try_next(), Some(Trigger::Missed(_))));
        assert!(local.sync.pump(&local.cart) > 0);
        assert_eq!(local.badge.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_once_waits_for_foreign_change() {
        let storage = MemoryStorage::new();
        let mut local = open_tab(storage.open_view());
        let mut remote = open_tab(storage.open_view());

        local.cart.add_item("Soap", Price::new(300), "cosmetic").unwrap();
        remote.cart.add_item("Vitamins", Price::new(500), "pharma").unwrap();

        // The local add is skipped; the remote add triggers the recompute
        let snapshot = local.sync.run_once(&local.cart).await.unwrap();
        assert_eq!(snapshot.count, 2);
        assert_eq!(snapshot.summary.subtotal, Price::new(800));
    }

    #[test]
    fn test_trigger_category() {
        let event = StorageEvent {
            key: Category::Pharma.storage_key().to_string(),
            old_value: None,
            new_value: Some("[]".to_string()),
            origin: None,
        };
        assert_eq!(Trigger::Changed(event).category(), Some(Category::Pharma));
        assert_eq!(Trigger::Missed(3).category(), None);
    }
}
