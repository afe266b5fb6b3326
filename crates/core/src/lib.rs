//! GoMarket Core - Shared cart types.
//!
//! This crate provides the types used across all GoMarket components:
//! - `cart` - Persisted cart store and the floating summary widget
//! - `cli` - Command-line host that drives the cart
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no storage
//! access, no async runtime. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Product IDs, prices, line items, and cart snapshots

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
