//! Display data for whatever renders the cart.
//!
//! The renderer itself lives outside this crate; these types turn a
//! [`CartSnapshot`] into ready-to-print strings.

use nosorog_core::{ItemId, LineItem};
use serde::Serialize;

use crate::observer::CartSnapshot;

/// Cart line display data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartItemView {
    /// Aggregate position, for index-addressed buttons.
    pub index: usize,
    /// Stable identity, for id-addressed buttons.
    pub id: Option<ItemId>,
    pub title: String,
    pub category_name: &'static str,
    pub icon: &'static str,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

/// Cart page display data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub delivery: String,
    pub total: String,
    pub item_count: u64,
    /// Count line on the cart page, e.g. "3 товаров".
    pub count_label: String,
    pub checkout_enabled: bool,
}

impl CartView {
    /// Create an empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self::from(&CartSnapshot {
            items: Vec::new(),
            summary: crate::Summary::default(),
            count: 0,
        })
    }

    /// Returns `true` if the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Type Conversions
// =============================================================================

impl From<&CartSnapshot> for CartView {
    fn from(snapshot: &CartSnapshot) -> Self {
        Self {
            items: snapshot
                .items
                .iter()
                .enumerate()
                .map(|(index, item)| CartItemView::new(index, item))
                .collect(),
            subtotal: snapshot.summary.subtotal.to_string(),
            delivery: snapshot.summary.delivery.to_string(),
            total: snapshot.summary.total.to_string(),
            item_count: snapshot.count,
            count_label: count_label(snapshot.count),
            checkout_enabled: snapshot.summary.checkout_enabled,
        }
    }
}

impl CartItemView {
    fn new(index: usize, item: &LineItem) -> Self {
        Self {
            index,
            id: item.id,
            title: item.name.clone(),
            category_name: item.category.display_name(),
            icon: item.category.icon(),
            quantity: item.quantity,
            price: item.price.to_string(),
            line_price: item.line_total().to_string(),
        }
    }
}

// =============================================================================
// Labels
// =============================================================================

/// Text for the header badge, or `None` when the badge should be hidden.
#[must_use]
pub fn badge_label(count: u64, cap: u64) -> Option<String> {
    match count {
        0 => None,
        n if n > cap => Some(format!("{cap}+")),
        n => Some(n.to_string()),
    }
}

/// Count line shown on the cart page.
#[must_use]
pub fn count_label(count: u64) -> String {
    format!("{count} товаров")
}

#[cfg(test)]
mod tests {
    use nosorog_core::{Category, Price, Tariff};

    use super::*;
    use crate::summary::summarize;

    fn snapshot() -> CartSnapshot {
        let mut gloves =
            LineItem::new(ItemId::new(1), "Gloves", Price::new(1500), Category::Equipment);
        gloves.quantity = 2;
        let soap = LineItem::new(ItemId::new(2), "Soap", Price::new(300), Category::Cosmetic);
        let items = vec![gloves, soap];
        CartSnapshot {
            summary: summarize(&items, Tariff::new(400)),
            count: 3,
            items,
        }
    }

    #[test]
    fn test_badge_label() {
        assert_eq!(badge_label(0, 99), None);
        assert_eq!(badge_label(1, 99).as_deref(), Some("1"));
        assert_eq!(badge_label(99, 99).as_deref(), Some("99"));
        assert_eq!(badge_label(100, 99).as_deref(), Some("99+"));
    }

    #[test]
    fn test_count_label() {
        assert_eq!(count_label(0), "0 товаров");
        assert_eq!(count_label(3), "3 товаров");
    }

    #[test]
    fn test_cart_view_from_snapshot() {
        let view = CartView::from(&snapshot());
        assert_eq!(view.items.len(), 2);
        assert_eq!(view.subtotal, "3\u{a0}300₽");
        assert_eq!(view.delivery, "400₽");
        assert_eq!(view.total, "3\u{a0}700₽");
        assert_eq!(view.count_label, "3 товаров");
        assert!(view.checkout_enabled);

        let gloves = view.items.first().cloned();
        assert_eq!(
            gloves,
            Some(CartItemView {
                index: 0,
                id: Some(ItemId::new(1)),
                title: "Gloves".to_string(),
                category_name: "Экипировка",
                icon: "🥊",
                quantity: 2,
                price: "1\u{a0}500₽".to_string(),
                line_price: "3\u{a0}000₽".to_string(),
            })
        );
        assert_eq!(view.items.get(1).map(|i| i.index), Some(1));
    }

    #[test]
    fn test_empty_view() {
        let view = CartView::empty();
        assert!(view.is_empty());
        assert_eq!(view.subtotal, "0₽");
        assert_eq!(view.delivery, "0₽");
        assert_eq!(view.count_label, "0 товаров");
        assert!(!view.checkout_enabled);
    }
}
