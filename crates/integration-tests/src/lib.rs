//! Integration tests for GoMarket.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p gomarket-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_persistence` - Store restarts against real file storage
//! - `cart_summary` - Summary widget driven by a live store
//!
//! Shared fixtures live here so test files stay focused on behavior.

use gomarket_cart::{CartConfig, CartStore, FileStorage};
use gomarket_core::NewLineItem;
use rust_decimal::Decimal;
use tempfile::TempDir;

/// A cart directory that is removed when dropped.
pub struct TestCart {
    pub dir: TempDir,
    pub config: CartConfig,
}

impl TestCart {
    /// Create a fresh, empty cart directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config = CartConfig {
            storage_dir: dir.path().to_path_buf(),
            ..CartConfig::default()
        };
        Self { dir, config }
    }

    /// Open (or reopen, simulating an app restart) the store.
    pub async fn open(&self) -> CartStore<FileStorage> {
        CartStore::open(FileStorage::new(&self.config.storage_dir), &self.config).await
    }

    /// Storage handle onto the same directory.
    #[must_use]
    pub fn storage(&self) -> FileStorage {
        FileStorage::new(&self.config.storage_dir)
    }
}

impl Default for TestCart {
    fn default() -> Self {
        Self::new()
    }
}

/// A product descriptor priced in whole units.
///
/// # Panics
///
/// Panics if `price` is negative.
#[must_use]
pub fn product(id: &str, price: i64) -> NewLineItem {
    NewLineItem::new(
        id,
        format!("Product {id}"),
        format!("https://img/{id}.png"),
        Decimal::new(price, 0),
    )
    .expect("non-negative price")
}
