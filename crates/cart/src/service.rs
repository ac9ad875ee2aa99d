//! The cart service: mutations, tariff selection and republishing.
//!
//! One `CartService` is constructed per open view with an injected storage
//! handle and passed by reference to whatever renders the cart. It holds no
//! copy of the cart: every operation reads the partitions it needs, writes
//! back whole partitions, and then recomputes the snapshot for observers.
//!
//! # Addressing
//!
//! Index-based operations resolve the aggregate position against a fresh read
//! on every call. When another view edits a partition between the render and
//! the click, the position can point at a different item than the one the
//! visitor saw. The `*_by_id` variants address the item's stable identity
//! instead and resolve it to a partition position only at write time.

use nosorog_core::{Category, ItemId, LineItem, Price, Tariff};
use tracing::{debug, info, instrument, warn};

use crate::aggregate::{Partitions, Slot};
use crate::error::{CartError, Result};
use crate::observer::{CartObserver, CartSnapshot, ObserverError, Observers};
use crate::partition::PartitionStore;
use crate::storage::Storage;
use crate::summary::{Summary, summarize};

/// A single-step quantity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Adjustment {
    /// Add one unit.
    Increment,
    /// Remove one unit, never going below one.
    Decrement,
}

impl Adjustment {
    /// Apply the change to `quantity`, clamping at one.
    #[must_use]
    pub const fn apply(self, quantity: u32) -> u32 {
        match self {
            Self::Increment => quantity.saturating_add(1),
            Self::Decrement => {
                let lowered = quantity.saturating_sub(1);
                if lowered < 1 { 1 } else { lowered }
            }
        }
    }
}

/// Cart state engine for one view.
pub struct CartService<S> {
    store: PartitionStore<S>,
    tariff: Tariff,
    observers: Observers,
}

impl<S: Storage> CartService<S> {
    /// Create a service over `storage` with free delivery selected.
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self {
            store: PartitionStore::new(storage),
            tariff: Tariff::FREE,
            observers: Observers::new(),
        }
    }

    /// The partitioned store.
    #[must_use]
    pub const fn store(&self) -> &PartitionStore<S> {
        &self.store
    }

    /// The underlying storage handle.
    #[must_use]
    pub const fn storage(&self) -> &S {
        self.store.storage()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The aggregate cart as currently persisted.
    #[must_use]
    pub fn aggregate(&self) -> Vec<LineItem> {
        Partitions::load(&self.store).into_aggregate()
    }

    /// Total quantity as currently persisted.
    #[must_use]
    pub fn count(&self) -> u64 {
        Partitions::load(&self.store).count()
    }

    /// Price summary as currently persisted, under the selected tariff.
    #[must_use]
    pub fn summary(&self) -> Summary {
        summarize(Partitions::load(&self.store).iter(), self.tariff)
    }

    /// Items, summary and count from a single read of the partitions.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        let partitions = Partitions::load(&self.store);
        let summary = summarize(partitions.iter(), self.tariff);
        let count = partitions.count();
        CartSnapshot {
            items: partitions.into_aggregate(),
            summary,
            count,
        }
    }

    /// The selected delivery tariff.
    #[must_use]
    pub const fn tariff(&self) -> Tariff {
        self.tariff
    }

    // =========================================================================
    // Observers
    // =========================================================================

    /// Register an observer of recomputed snapshots.
    pub fn subscribe(&mut self, observer: impl CartObserver + 'static) {
        self.observers.register(observer);
    }

    /// Register a closure observer of recomputed snapshots.
    pub fn add_listener<F>(&mut self, callback: F)
    where
        F: Fn(&CartSnapshot) -> std::result::Result<(), ObserverError> + Send + 'static,
    {
        self.observers.listen(callback);
    }

    /// Recompute the snapshot from storage and notify every observer.
    pub fn publish(&self) -> CartSnapshot {
        let snapshot = self.snapshot();
        let report = self.observers.notify(&snapshot);
        debug!(
            count = snapshot.count,
            subtotal = snapshot.summary.subtotal.amount(),
            delivered = report.delivered,
            failed = report.failed,
            "Cart published"
        );
        snapshot
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Select a delivery tariff and republish.
    pub fn select_tariff(&mut self, tariff: impl Into<Tariff>) -> CartSnapshot {
        self.tariff = tariff.into();
        debug!(fee = self.tariff.fee().amount(), "Tariff selected");
        self.publish()
    }

    /// Add one unit of a product, given its category tag.
    ///
    /// # Errors
    ///
    /// Returns `CartError::UnknownCategory` without touching storage if `tag`
    /// is not a recognized category, or a persistence error if the write fails.
    pub fn add_item(&mut self, name: &str, price: Price, tag: &str) -> Result<LineItem> {
        let category = tag.parse::<Category>().inspect_err(|e| {
            warn!(error = %e, name, "Rejected cart item");
        })?;
        self.add(name, price, category)
    }

    /// Add one unit of a product to its category's partition.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the write fails.
    #[instrument(skip(self, price), fields(price = price.amount()))]
    pub fn add(&mut self, name: &str, price: Price, category: Category) -> Result<LineItem> {
        let partitions = Partitions::load(&self.store);
        let item = LineItem::new(ItemId::mint(partitions.ids()), name, price, category);

        let mut items = partitions.into_partition(category);
        items.push(item.clone());
        self.store.write(category, &items)?;

        info!(id = ?item.id, "Item added to cart");
        self.publish();
        Ok(item)
    }

    /// Change the quantity of the item at an aggregate position.
    ///
    /// # Errors
    ///
    /// Returns `CartError::IndexOutOfRange` if no item is at `index`, or a
    /// persistence error if the write fails.
    #[instrument(skip(self))]
    pub fn change_quantity(&mut self, index: usize, adjustment: Adjustment) -> Result<LineItem> {
        let partitions = Partitions::load(&self.store);
        let slot = locate_index(&partitions, index)?;
        self.adjust_at(partitions, slot, adjustment)
    }

    /// Change the quantity of the item with the given identity.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotFound` if no item has `id`, or a
    /// persistence error if the write fails.
    #[instrument(skip(self))]
    pub fn change_quantity_by_id(
        &mut self,
        id: ItemId,
        adjustment: Adjustment,
    ) -> Result<LineItem> {
        let partitions = Partitions::load(&self.store);
        let slot = partitions.locate_id(id).ok_or(CartError::ItemNotFound(id))?;
        self.adjust_at(partitions, slot, adjustment)
    }

    /// Remove the item at an aggregate position.
    ///
    /// # Errors
    ///
    /// Returns `CartError::IndexOutOfRange` if no item is at `index`, or a
    /// persistence error if the write fails.
    #[instrument(skip(self))]
    pub fn remove_item(&mut self, index: usize) -> Result<LineItem> {
        let partitions = Partitions::load(&self.store);
        let slot = locate_index(&partitions, index)?;
        self.remove_at(partitions, slot)
    }

    /// Remove the item with the given identity.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotFound` if no item has `id`, or a
    /// persistence error if the write fails.
    #[instrument(skip(self))]
    pub fn remove_item_by_id(&mut self, id: ItemId) -> Result<LineItem> {
        let partitions = Partitions::load(&self.store);
        let slot = partitions.locate_id(id).ok_or(CartError::ItemNotFound(id))?;
        self.remove_at(partitions, slot)
    }

    /// Empty every partition.
    ///
    /// Partitions are written one after another. If a write fails the
    /// partitions already emptied stay empty and the error lists them.
    ///
    /// # Errors
    ///
    /// Returns `CartError::PartialClear` if any partition write fails.
    #[instrument(skip(self))]
    pub fn clear_cart(&mut self) -> Result<()> {
        let mut cleared = Vec::with_capacity(Category::ALL.len());
        for category in Category::ALL {
            if let Err(e) = self.store.write(category, &[]) {
                let source = match e {
                    CartError::Persist { source, .. } => source,
                    other => return Err(other),
                };
                // Observers must see whatever state the partial clear left
                self.publish();
                return Err(CartError::PartialClear {
                    cleared,
                    failed: category,
                    source,
                });
            }
            cleared.push(category);
        }

        info!("Cart cleared");
        self.publish();
        Ok(())
    }

    /// Place the order: if the cart has anything in it, clear it and return
    /// the summary it had.
    ///
    /// # Errors
    ///
    /// Returns `CartError::PartialClear` if clearing fails.
    #[instrument(skip(self))]
    pub fn checkout(&mut self) -> Result<Option<Summary>> {
        let partitions = Partitions::load(&self.store);
        if partitions.is_empty() {
            debug!("Checkout ignored for empty cart");
            return Ok(None);
        }
        let summary = summarize(partitions.iter(), self.tariff);
        self.clear_cart()?;
        info!(total = summary.total.amount(), "Order placed");
        Ok(Some(summary))
    }

    fn adjust_at(
        &mut self,
        partitions: Partitions,
        slot: Slot,
        adjustment: Adjustment,
    ) -> Result<LineItem> {
        let mut items = partitions.into_partition(slot.category);
        let len = items.len();
        let Some(item) = items.get_mut(slot.position) else {
            return Err(CartError::IndexOutOfRange {
                index: slot.position,
                len,
            });
        };
        item.quantity = adjustment.apply(item.quantity);
        let updated = item.clone();

        self.store.write(slot.category, &items)?;
        debug!(quantity = updated.quantity, category = %slot.category, "Quantity changed");
        self.publish();
        Ok(updated)
    }

    fn remove_at(&mut self, partitions: Partitions, slot: Slot) -> Result<LineItem> {
        let mut items = partitions.into_partition(slot.category);
        if slot.position >= items.len() {
            return Err(CartError::IndexOutOfRange {
                index: slot.position,
                len: items.len(),
            });
        }
        let removed = items.remove(slot.position);

        self.store.write(slot.category, &items)?;
        info!(id = ?removed.id, category = %slot.category, "Item removed from cart");
        self.publish();
        Ok(removed)
    }
}

fn locate_index(partitions: &Partitions, index: usize) -> Result<Slot> {
    partitions.locate(index).ok_or(CartError::IndexOutOfRange {
        index,
        len: partitions.len(),
    })
}
