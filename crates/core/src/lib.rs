//! Nosorog Core - Shared cart domain types.
//!
//! This crate provides the types shared by every Nosorog cart component:
//! - `nosorog-cart` - Cart state engine (storage, aggregation, mutation, sync)
//! - `nosorog-cli` - Developer tool for inspecting and editing a cart store
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access, no clocks
//! beyond ID minting. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Categories, line items, prices, tariffs and identifiers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
