//! Error types for the cart store.

use gomarket_core::ProductId;
use thiserror::Error;

use crate::storage::StorageError;

/// Errors returned by [`CartStore`](crate::CartStore) operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// `increment`/`decrement` named a product that is not in the cart.
    #[error("item not in cart: {0}")]
    ItemNotFound(ProductId),

    /// Key-value storage operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Snapshot could not be encoded for storage.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The background writer has stopped, so nothing more can be persisted.
    #[error("cart writer is no longer running")]
    WriterClosed,
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_error_display() {
        let err = CartError::ItemNotFound(ProductId::new("sku-9"));
        assert_eq!(err.to_string(), "item not in cart: sku-9");

        let err = CartError::Storage(StorageError::Unavailable("disk gone".to_string()));
        assert_eq!(err.to_string(), "Storage error: storage unavailable: disk gone");
    }
}
