//! Follow the cart as other processes change it.
//!
//! # Usage
//!
//! ```bash
//! nosorog watch
//! ```
//!
//! Polls the storage directory every `NOSOROG_POLL_INTERVAL_MS` and prints
//! the header badge each time a partition changes. Stops on Ctrl-C.

use nosorog_cart::{SyncBroadcaster, badge_label};
use tokio::time::{MissedTickBehavior, interval};

use super::{CommandError, Context};

/// Run until interrupted.
pub async fn run(ctx: &Context) -> Result<(), CommandError> {
    let mut cart = ctx.cart();
    let cap = ctx.config.badge_cap;
    cart.add_listener(move |snapshot| {
        #[allow(clippy::print_stdout)]
        {
            match badge_label(snapshot.count, cap) {
                Some(badge) => println!("[{badge}] {}", snapshot.summary.total),
                None => println!("[ ] cart is empty"),
            }
        }
        Ok(())
    });

    let mut sync = SyncBroadcaster::new();
    sync.subscribe(cart.storage());
    cart.publish();

    let mut ticker = interval(ctx.config.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tracing::info!(dir = %ctx.storage.dir().display(), "Watching cart");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match ctx.storage.poll_changes() {
                    Ok(0) => {}
                    Ok(changes) => {
                        let recomputed = sync.pump(&cart);
                        tracing::debug!(changes, recomputed, "Cart changed on disk");
                    }
                    Err(e) => tracing::warn!(error = %e, "Failed to poll storage directory"),
                }
            }
            _ = &mut shutdown => {
                tracing::info!("Stopped watching cart");
                return Ok(());
            }
        }
    }
}
