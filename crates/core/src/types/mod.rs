//! Core types for GoMarket.
//!
//! This module provides type-safe wrappers for the cart domain.

pub mod id;
pub mod line_item;
pub mod price;
pub mod snapshot;

pub use id::ProductId;
pub use line_item::{LineItem, NewLineItem};
pub use price::{CurrencyCode, MAX_UNIT_PRICE, Price, PriceError, check_unit_price};
pub use snapshot::{CartSnapshot, CartTotals, SnapshotError};
