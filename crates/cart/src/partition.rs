//! Per-category partitions persisted in a storage area.
//!
//! Each category's items live under that category's storage key as a JSON
//! array. Reading is fail-safe: a missing, unreadable or malformed value is an
//! empty partition. Writing replaces the whole partition in one `set_item`.

use nosorog_core::{Category, ItemId, LineItem, Price};
use serde::{Deserialize, Deserializer};
use tracing::{instrument, warn};

use crate::error::{CartError, Result};
use crate::storage::Storage;

/// A record as found in storage.
///
/// Every field is optional so that records written by older pages still
/// decode; missing fields are filled in by [`StoredItem::into_line_item`].
/// An explicit `null` is treated the same as a missing field.
#[derive(Debug, Deserialize)]
struct StoredItem {
    #[serde(default)]
    id: Option<ItemId>,
    #[serde(default, deserialize_with = "null_as_default")]
    name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    price: Price,
    #[serde(default)]
    category: Option<Category>,
    #[serde(default = "default_quantity", deserialize_with = "null_as_one")]
    quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_one<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or_else(default_quantity))
}

impl StoredItem {
    fn into_line_item(self, partition: Category) -> LineItem {
        LineItem {
            id: self.id,
            name: self.name,
            price: self.price,
            // Records from before categories were stored belong to the
            // partition they were found in
            category: self.category.unwrap_or(partition),
            quantity: self.quantity,
        }
    }
}

/// Decode a partition value, or `None` if it is not a sequence of items.
#[must_use]
pub fn decode_partition(raw: &str, partition: Category) -> Option<Vec<LineItem>> {
    let records: Vec<StoredItem> = serde_json::from_str(raw).ok()?;
    Some(
        records
            .into_iter()
            .map(|record| record.into_line_item(partition))
            .collect(),
    )
}

/// Partitioned view of a storage area.
pub struct PartitionStore<S> {
    storage: S,
}

impl<S: Storage> PartitionStore<S> {
    /// Wrap a storage handle.
    #[must_use]
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    /// The underlying storage handle.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Read one partition.
    ///
    /// Never fails: anything that is not a well-formed item sequence reads as
    /// an empty partition.
    #[must_use]
    pub fn read(&self, category: Category) -> Vec<LineItem> {
        let key = category.storage_key();
        let raw = match self.storage.get_item(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(key, error = %e, "Failed to read cart partition, treating as empty");
                return Vec::new();
            }
        };

        decode_partition(&raw, category).unwrap_or_else(|| {
            warn!(key, "Malformed cart partition, treating as empty");
            Vec::new()
        })
    }

    /// Replace one partition with `items`.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Encode` if the items cannot be serialized, or
    /// `CartError::Persist` if the storage write fails.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub fn write(&self, category: Category, items: &[LineItem]) -> Result<()> {
        let encoded = serde_json::to_string(items)?;
        self.storage
            .set_item(category.storage_key(), &encoded)
            .map_err(|source| CartError::Persist { category, source })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn store() -> PartitionStore<MemoryStorage> {
        PartitionStore::new(MemoryStorage::new())
    }

    fn item(id: i64, name: &str, price: u64, category: Category) -> LineItem {
        LineItem::new(ItemId::new(id), name, Price::new(price), category)
    }

    #[test]
    fn test_missing_partition_reads_empty() {
        assert!(store().read(Category::Equipment).is_empty());
    }

    #[test]
    fn test_write_then_read_is_identical() {
        let store = store();
        let mut gloves = item(1, "Gloves", 1500, Category::Equipment);
        gloves.quantity = 3;
        let items = vec![gloves, item(2, "Wraps", 700, Category::Equipment)];

        store.write(Category::Equipment, &items).unwrap();
        assert_eq!(store.read(Category::Equipment), items);
    }

    #[test]
    fn test_malformed_values_read_empty() {
        let store = store();
        let key = Category::Cosmetic.storage_key();
        for raw in [
            "not json",
            "{\"name\":\"Soap\"}",
            "null",
            "[{\"name\":\"Soap\",\"price\":\"cheap\"}]",
            "[{\"name\":\"Soap\",\"quantity\":-1}]",
            "[{\"name\":\"Soap\",\"category\":\"services\"}]",
        ] {
            store.storage().set_item(key, raw).unwrap();
            assert!(store.read(Category::Cosmetic).is_empty(), "{raw}");
        }
    }

    #[test]
    fn test_legacy_record_defaults() {
        let store = store();
        store
            .storage()
            .set_item(
                Category::Pharma.storage_key(),
                "[{\"name\":\"Vitamins\",\"price\":500}]",
            )
            .unwrap();

        let items = store.read(Category::Pharma);
        assert_eq!(items.len(), 1);
        let vitamins = items.first().unwrap();
        assert_eq!(vitamins.category, Category::Pharma);
        assert_eq!(vitamins.quantity, 1);
        assert_eq!(vitamins.id, None);
    }

    #[test]
    fn test_null_fields_default_like_missing_ones() {
        let store = store();
        store
            .storage()
            .set_item(
                Category::Equipment.storage_key(),
                r#"[{"name":"Gloves","price":1500,"quantity":null},
                    {"name":null,"price":null,"category":null,"quantity":2}]"#,
            )
            .unwrap();

        let items = store.read(Category::Equipment);
        assert_eq!(items.len(), 2);
        let gloves = items.first().unwrap();
        assert_eq!(gloves.quantity, 1);
        assert_eq!(gloves.price, Price::new(1500));
        let unnamed = items.get(1).unwrap();
        assert_eq!(unnamed.name, "");
        assert_eq!(unnamed.price, Price::ZERO);
        assert_eq!(unnamed.category, Category::Equipment);
        assert_eq!(unnamed.quantity, 2);
    }

    #[test]
    fn test_legacy_default_is_not_written_back() {
        let store = store();
        let raw = "[{\"name\":\"Vitamins\",\"price\":500,\"quantity\":2}]";
        store
            .storage()
            .set_item(Category::Pharma.storage_key(), raw)
            .unwrap();
        let _ = store.read(Category::Pharma);
        assert_eq!(
            store
                .storage()
                .get_item(Category::Pharma.storage_key())
                .unwrap()
                .as_deref(),
            Some(raw)
        );
    }

    #[test]
    fn test_stored_category_is_kept_even_in_other_partition() {
        let store = store();
        store
            .storage()
            .set_item(
                Category::Equipment.storage_key(),
                "[{\"name\":\"Soap\",\"price\":300,\"category\":\"cosmetic\",\"quantity\":1}]",
            )
            .unwrap();
        assert_eq!(
            store.read(Category::Equipment).first().unwrap().category,
            Category::Cosmetic
        );
    }

    #[test]
    fn test_write_failure_is_reported() {
        let store = PartitionStore::new(MemoryStorage::with_quota(4));
        let err = store
            .write(Category::Equipment, &[item(1, "Gloves", 1500, Category::Equipment)])
            .unwrap_err();
        assert!(matches!(
            err,
            CartError::Persist {
                category: Category::Equipment,
                ..
            }
        ));
    }
}
