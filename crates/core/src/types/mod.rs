//! Core types for the Nosorog cart.
//!
//! This module provides type-safe wrappers for cart domain concepts.

pub mod category;
pub mod id;
pub mod item;
pub mod price;

pub use category::{Category, CategoryError};
pub use id::{ItemId, ViewId};
pub use item::LineItem;
pub use price::{Price, Tariff};
