//! Integration tests for the Nosorog cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p nosorog-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_scenarios` - End-to-end cart behavior through the service
//! - `cross_view` - Several views sharing one in-memory storage area
//! - `file_storage` - Views in separate "processes" sharing a directory
//!
//! # Harness
//!
//! [`Tab`] stands in for one open page: a cart service, a sync broadcaster and
//! a renderer that records every snapshot it is handed.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::{Arc, Mutex, PoisonError};

use nosorog_cart::{CartService, CartSnapshot, Storage, SyncBroadcaster};

/// One open page of the site.
pub struct Tab<S> {
    pub cart: CartService<S>,
    pub sync: SyncBroadcaster,
    rendered: Arc<Mutex<Vec<CartSnapshot>>>,
}

impl<S: Storage> Tab<S> {
    /// Open a page on `storage`, subscribed to changes from other pages.
    #[must_use]
    pub fn open(storage: S) -> Self {
        let rendered = Arc::new(Mutex::new(Vec::new()));
        let mut cart = CartService::new(storage);
        {
            let rendered = Arc::clone(&rendered);
            cart.add_listener(move |snapshot| {
                rendered
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(snapshot.clone());
                Ok(())
            });
        }
        let mut sync = SyncBroadcaster::new();
        sync.subscribe(cart.storage());
        Self {
            cart,
            sync,
            rendered,
        }
    }

    /// Handle every pending change from other pages.
    pub fn sync(&mut self) -> usize {
        self.sync.pump(&self.cart)
    }

    /// Count currently shown on the header badge.
    #[must_use]
    pub fn badge(&self) -> u64 {
        self.last_render().map_or(0, |snapshot| snapshot.count)
    }

    /// Most recent snapshot the page rendered.
    #[must_use]
    pub fn last_render(&self) -> Option<CartSnapshot> {
        self.rendered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    /// Number of times the page re-rendered.
    #[must_use]
    pub fn renders(&self) -> usize {
        self.rendered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
