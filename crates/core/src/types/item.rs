//! Cart line items.

use serde::{Deserialize, Serialize};

use super::{Category, ItemId, Price};

/// One product entry in the cart.
///
/// Field names match the records the storefront keeps in browser storage:
/// `id`, `name`, `price`, `category`, `quantity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Stable identity; absent on records written before identities existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ItemId>,
    /// Product name as shown on the product card.
    pub name: String,
    /// Unit price.
    pub price: Price,
    /// Category, which also names the owning partition.
    pub category: Category,
    /// Number of units, at least 1 once written through the cart.
    pub quantity: u32,
}

impl LineItem {
    /// Create a fresh line item with a quantity of one.
    #[must_use]
    pub fn new(id: ItemId, name: impl Into<String>, price: Price, category: Category) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
            price,
            category,
            quantity: 1,
        }
    }

    /// Price of this line: unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}
