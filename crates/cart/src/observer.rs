//! Observers notified whenever the cart is recomputed.
//!
//! Observers are the renderer's way in: the cart list, the summary panel and
//! the header badge each register one. A failing observer (an `Err` or a
//! panic) is logged and skipped; the rest are still notified and the
//! operation that triggered the notification still succeeds.

use std::panic::{AssertUnwindSafe, catch_unwind};

use nosorog_core::LineItem;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, trace};

use crate::summary::Summary;

/// Everything a renderer needs after a recomputation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartSnapshot {
    /// The aggregate cart, in render order.
    pub items: Vec<LineItem>,
    /// Price summary under the selected tariff.
    pub summary: Summary,
    /// Total quantity, for the badge.
    pub count: u64,
}

/// Error reported by an observer.
#[derive(Debug, Error)]
#[error("observer failed: {0}")]
pub struct ObserverError(pub String);

/// Callback notified with every recomputed snapshot.
pub trait CartObserver: Send {
    /// Called after each recomputation.
    ///
    /// # Errors
    ///
    /// Any error is logged by the registry and otherwise ignored.
    fn on_cart_changed(&self, snapshot: &CartSnapshot) -> Result<(), ObserverError>;
}

impl<F> CartObserver for F
where
    F: Fn(&CartSnapshot) -> Result<(), ObserverError> + Send,
{
    fn on_cart_changed(&self, snapshot: &CartSnapshot) -> Result<(), ObserverError> {
        self(snapshot)
    }
}

/// Outcome of one notification round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NotifyReport {
    /// Observers that completed normally.
    pub delivered: usize,
    /// Observers that returned an error or panicked.
    pub failed: usize,
}

/// Registered observers, notified in registration order.
#[derive(Default)]
pub struct Observers {
    entries: Vec<Box<dyn CartObserver>>,
}

impl Observers {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer.
    pub fn register(&mut self, observer: impl CartObserver + 'static) {
        self.entries.push(Box::new(observer));
    }

    /// Register a closure as an observer.
    pub fn listen<F>(&mut self, callback: F)
    where
        F: Fn(&CartSnapshot) -> Result<(), ObserverError> + Send + 'static,
    {
        self.register(callback);
    }

    /// Number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no observer is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Notify every observer of `snapshot`.
    pub fn notify(&self, snapshot: &CartSnapshot) -> NotifyReport {
        let mut report = NotifyReport::default();
        for (index, observer) in self.entries.iter().enumerate() {
            let outcome = catch_unwind(AssertUnwindSafe(|| observer.on_cart_changed(snapshot)));
            match outcome {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    report.failed += 1;
                    error!(observer = index, error = %e, "Cart observer failed");
                }
                Err(panic) => {
                    report.failed += 1;
                    let message = panic
                        .downcast_ref::<&str>()
                        .map(|s| (*s).to_owned())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_owned());
                    error!(observer = index, panic = %message, "Cart observer panicked");
                }
            }
        }
        trace!(
            delivered = report.delivered,
            failed = report.failed,
            "Cart observers notified"
        );
        report
    }
}
