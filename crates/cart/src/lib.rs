//! GoMarket Cart - Persisted shopping cart and floating cart summary.
//!
//! # Architecture
//!
//! - [`CartStore`] holds the authoritative cart in memory and publishes every
//!   change through a `tokio::sync::watch` channel
//! - [`persistence::WriteBehind`] writes each new snapshot to storage from a
//!   single background task, in mutation order
//! - [`CartSummary`] derives item count and total price for the floating
//!   widget and triggers navigation to the cart screen
//! - [`KeyValueStorage`] abstracts the device storage engine
//!
//! # Example
//!
//! ```rust,no_run
//! use gomarket_cart::{CartConfig, CartStore, CartSummary, MemoryStorage, Route};
//! use gomarket_core::NewLineItem;
//! use rust_decimal::Decimal;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = CartStore::open(MemoryStorage::new(), &CartConfig::default()).await;
//! store.add_to_cart(NewLineItem::new("a", "Coffee", "", Decimal::new(10, 0))?)?;
//!
//! let mut summary = CartSummary::new(&store, |route: Route| println!("go to {}", route.name()));
//! assert_eq!(summary.render().item_count_label, "1 itens");
//! store.flush().await?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod persistence;
pub mod storage;
pub mod store;
pub mod summary;

pub use config::{CartConfig, ConfigError};
pub use error::{CartError, Result};
pub use persistence::PersistenceStats;
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError};
pub use store::{CartStore, LoadOutcome};
pub use summary::{CartSummary, Navigator, Route, SummaryView};
