//! Price summary of the cart.

use nosorog_core::{LineItem, Price, Tariff};
use serde::Serialize;

/// Totals shown next to the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Σ price × quantity over the cart.
    pub subtotal: Price,
    /// Fee of the selected delivery tariff.
    pub delivery: Price,
    /// Subtotal plus delivery.
    pub total: Price,
    /// Checkout is offered only for a cart with something to pay for.
    pub checkout_enabled: bool,
}

/// Summarize `items` under `tariff`.
#[must_use]
pub fn summarize<'a, I>(items: I, tariff: Tariff) -> Summary
where
    I: IntoIterator<Item = &'a LineItem>,
{
    let subtotal: Price = items.into_iter().map(LineItem::line_total).sum();
    let delivery = tariff.fee();
    Summary {
        subtotal,
        delivery,
        total: subtotal + delivery,
        checkout_enabled: !subtotal.is_zero(),
    }
}
