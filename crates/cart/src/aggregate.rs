//! The aggregate cart: all partitions concatenated in category order.
//!
//! [`Partitions`] is a point-in-time read of every partition. It is loaded
//! fresh for each operation and dropped afterwards, so the aggregate is never
//! cached across mutations and positions are always resolved against what the
//! storage area holds at that moment.

use nosorog_core::{Category, ItemId, LineItem};

use crate::partition::PartitionStore;
use crate::storage::Storage;

/// Location of an item: its owning partition and position within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    /// Owning partition.
    pub category: Category,
    /// Position within the partition.
    pub position: usize,
}

/// All three partitions as read at one moment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partitions {
    equipment: Vec<LineItem>,
    cosmetic: Vec<LineItem>,
    pharma: Vec<LineItem>,
}

impl Partitions {
    /// Read every partition from `store`.
    #[must_use]
    pub fn load<S: Storage>(store: &PartitionStore<S>) -> Self {
        Self {
            equipment: store.read(Category::Equipment),
            cosmetic: store.read(Category::Cosmetic),
            pharma: store.read(Category::Pharma),
        }
    }

    /// Items of one partition, in insertion order.
    #[must_use]
    pub fn partition(&self, category: Category) -> &[LineItem] {
        match category {
            Category::Equipment => &self.equipment,
            Category::Cosmetic => &self.cosmetic,
            Category::Pharma => &self.pharma,
        }
    }

    /// Take ownership of one partition's items.
    #[must_use]
    pub fn into_partition(self, category: Category) -> Vec<LineItem> {
        match category {
            Category::Equipment => self.equipment,
            Category::Cosmetic => self.cosmetic,
            Category::Pharma => self.pharma,
        }
    }

    /// Iterate the aggregate cart in order.
    pub fn iter(&self) -> impl Iterator<Item = &LineItem> {
        Category::ALL
            .into_iter()
            .flat_map(move |category| self.partition(category).iter())
    }

    /// The aggregate cart.
    #[must_use]
    pub fn into_aggregate(self) -> Vec<LineItem> {
        let mut items = self.equipment;
        items.extend(self.cosmetic);
        items.extend(self.pharma);
        items
    }

    /// Number of lines in the aggregate.
    #[must_use]
    pub fn len(&self) -> usize {
        self.equipment.len() + self.cosmetic.len() + self.pharma.len()
    }

    /// Returns `true` if every partition is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total quantity over the aggregate.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Resolve an aggregate position to the owning partition.
    #[must_use]
    pub fn locate(&self, index: usize) -> Option<Slot> {
        let mut offset = index;
        for category in Category::ALL {
            let len = self.partition(category).len();
            if offset < len {
                return Some(Slot {
                    category,
                    position: offset,
                });
            }
            offset -= len;
        }
        None
    }

    /// Resolve a stable item identity to the owning partition.
    #[must_use]
    pub fn locate_id(&self, id: ItemId) -> Option<Slot> {
        Category::ALL.into_iter().find_map(|category| {
            self.partition(category)
                .iter()
                .position(|item| item.id == Some(id))
                .map(|position| Slot { category, position })
        })
    }

    /// Every item identity currently in use.
    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.iter().filter_map(|item| item.id)
    }
}

/// Read the aggregate cart from `store`.
#[must_use]
pub fn aggregate<S: Storage>(store: &PartitionStore<S>) -> Vec<LineItem> {
    Partitions::load(store).into_aggregate()
}

/// Total quantity of the aggregate cart in `store`.
#[must_use]
pub fn count<S: Storage>(store: &PartitionStore<S>) -> u64 {
    Partitions::load(store).count()
}
