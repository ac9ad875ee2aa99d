//! Nosorog Cart - Partitioned cart state engine.
//!
//! The cart keeps one partition of line items per product category in a
//! shared key/value storage area, presents the partitions as one ordered cart,
//! enforces the quantity rules on every mutation, prices the cart under the
//! selected delivery tariff and keeps every open view of the site in step.
//!
//! # Architecture
//!
//! ```text
//! mutation ──▶ CartService ──▶ PartitionStore ──▶ Storage ──▶ other views
//!                  │                                  │
//!                  ▼                                  ▼
//!     Partitions ─▶ summarize ─▶ Observers  ◀── SyncBroadcaster
//! ```
//!
//! There is no in-memory copy of the cart: storage is the only authority and
//! every snapshot is recomputed from it.
//!
//! # Modules
//!
//! - [`storage`] - Storage areas (in-memory and file-backed) with change events
//! - [`partition`] - Fail-safe per-category partition reads and whole-partition writes
//! - [`aggregate`] - Fixed-order concatenation of partitions and index resolution
//! - [`service`] - Add, quantity change, removal, clearing, checkout, tariff selection
//! - [`summary`] - Subtotal, delivery and total
//! - [`observer`] - Snapshot observers with per-observer failure isolation
//! - [`sync`] - Recomputation on changes made by other views
//! - [`view`] - Display strings for renderers
//! - [`config`] - Environment configuration

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod aggregate;
pub mod config;
pub mod error;
pub mod observer;
pub mod partition;
pub mod service;
pub mod storage;
pub mod summary;
pub mod sync;
pub mod view;

pub use aggregate::{Partitions, Slot};
pub use config::{CartConfig, ConfigError};
pub use error::{CartError, Result};
pub use observer::{CartObserver, CartSnapshot, NotifyReport, ObserverError, Observers};
pub use partition::PartitionStore;
pub use service::{Adjustment, CartService};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError, StorageEvent};
pub use summary::{Summary, summarize};
pub use sync::{SyncBroadcaster, SyncState, Trigger};
pub use view::{CartItemView, CartView, badge_label, count_label};
