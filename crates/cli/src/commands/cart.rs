//! Cart editing and display commands.
//!
//! # Usage
//!
//! ```bash
//! nosorog add "Boxing gloves" 1500 equipment
//! nosorog inc 0
//! nosorog remove --id 1767225600000
//! nosorog show --tariff 400 --json
//! nosorog checkout --tariff 400
//! ```

use nosorog_cart::{Adjustment, CartView, badge_label};
use nosorog_core::{LineItem, Price};

use super::{CommandError, Context, Line};

/// Add one unit of a product.
pub fn add(ctx: &Context, name: &str, price: u64, category: &str) -> Result<(), CommandError> {
    let mut cart = ctx.cart();
    let item = cart.add_item(name, Price::new(price), category)?;
    print_line("Added", &item);
    Ok(())
}

/// Change a line's quantity by one.
pub fn adjust(ctx: &Context, line: Line, adjustment: Adjustment) -> Result<(), CommandError> {
    let mut cart = ctx.cart();
    let item = match line {
        Line::Index(index) => cart.change_quantity(index, adjustment)?,
        Line::Id(id) => cart.change_quantity_by_id(id, adjustment)?,
    };
    print_line("Updated", &item);
    Ok(())
}

/// Remove a line.
pub fn remove(ctx: &Context, line: Line) -> Result<(), CommandError> {
    let mut cart = ctx.cart();
    let item = match line {
        Line::Index(index) => cart.remove_item(index)?,
        Line::Id(id) => cart.remove_item_by_id(id)?,
    };
    print_line("Removed", &item);
    Ok(())
}

/// Empty the cart.
pub fn clear(ctx: &Context) -> Result<(), CommandError> {
    ctx.cart().clear_cart()?;

    #[allow(clippy::print_stdout)]
    {
        println!("Cart cleared");
    }
    Ok(())
}

/// Place the order under `tariff`.
pub fn checkout(ctx: &Context, tariff: u64) -> Result<(), CommandError> {
    let mut cart = ctx.cart();
    cart.select_tariff(tariff);
    let placed = cart.checkout()?;

    #[allow(clippy::print_stdout)]
    {
        match placed {
            Some(summary) => println!("Order placed, total {}", summary.total),
            None => println!("Cart is empty, nothing to order"),
        }
    }
    Ok(())
}

/// Print the cart under `tariff`.
pub fn show(ctx: &Context, tariff: u64, json: bool) -> Result<(), CommandError> {
    let mut cart = ctx.cart();
    let snapshot = cart.select_tariff(tariff);
    let view = CartView::from(&snapshot);

    if json {
        let encoded = serde_json::to_string_pretty(&view)?;
        #[allow(clippy::print_stdout)]
        {
            println!("{encoded}");
        }
        return Ok(());
    }

    #[allow(clippy::print_stdout)]
    {
        if let Some(badge) = badge_label(view.item_count, ctx.config.badge_cap) {
            println!("[{badge}]");
        }
        if view.is_empty() {
            println!("Корзина пуста");
            return Ok(());
        }
        for item in &view.items {
            println!(
                "{:>3}  {} {} ({})  x{}  {} = {}  #{}",
                item.index,
                item.icon,
                item.title,
                item.category_name,
                item.quantity,
                item.price,
                item.line_price,
                item.id.map_or_else(|| "-".to_string(), |id| id.to_string()),
            );
        }
        println!();
        println!("{}", view.count_label);
        println!("Товары:   {}", view.subtotal);
        println!("Доставка: {}", view.delivery);
        println!("Итого:    {}", view.total);
    }
    Ok(())
}

fn print_line(action: &str, item: &LineItem) {
    #[allow(clippy::print_stdout)]
    {
        println!(
            "{action}: {} {} x{} ({})",
            item.category.icon(),
            item.name,
            item.quantity,
            item.line_total()
        );
    }
}
