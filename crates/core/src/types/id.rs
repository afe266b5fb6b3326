//! Product identifier type.
//!
//! Product IDs come from the catalog and are opaque to the cart: the cart
//! never generates them, it only compares them for equality.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a product in the cart.
///
/// Serialized transparently as a JSON string, so persisted snapshots keep the
/// `"id": "..."` shape.
///
/// ```
/// use gomarket_core::ProductId;
///
/// let id = ProductId::new("sku-1");
/// assert_eq!(id.as_str(), "sku-1");
/// assert_eq!(id, ProductId::from("sku-1"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Create a product ID from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the ID and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
