//! Cart line items.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::{PriceError, check_unit_price};

/// One product entry in the cart.
///
/// The serialized field names (`image_url`, `price`) and the numeric price are
/// the persisted snapshot format, so existing device data keeps loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Catalog product ID, unique within a cart.
    pub id: ProductId,
    /// Display name.
    pub title: String,
    /// Product image location.
    pub image_url: String,
    /// Price of a single unit.
    #[serde(rename = "price", with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    /// Number of units, always at least 1 while the item is in a cart.
    pub quantity: u32,
}

impl LineItem {
    /// `quantity × unit_price`, saturating at `Decimal::MAX`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price.saturating_mul(Decimal::from(self.quantity))
    }

    /// A copy of this item with a different quantity.
    #[must_use]
    pub fn with_quantity(&self, quantity: u32) -> Self {
        Self {
            quantity,
            ..self.clone()
        }
    }
}

/// A product descriptor to add to the cart: a [`LineItem`] without quantity.
///
/// ```
/// use gomarket_core::NewLineItem;
/// use rust_decimal::Decimal;
///
/// let item = NewLineItem::new("a", "Coffee", "https://img/a.png", Decimal::new(10, 0)).unwrap();
/// assert_eq!(item.into_line_item().quantity, 1);
///
/// assert!(NewLineItem::new("b", "Tea", "", Decimal::new(-1, 0)).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLineItem {
    id: ProductId,
    title: String,
    image_url: String,
    unit_price: Decimal,
}

impl NewLineItem {
    /// Build a descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `unit_price` is below zero, or
    /// [`PriceError::TooLarge`] above [`MAX_UNIT_PRICE`](super::price::MAX_UNIT_PRICE).
    pub fn new(
        id: impl Into<ProductId>,
        title: impl Into<String>,
        image_url: impl Into<String>,
        unit_price: Decimal,
    ) -> Result<Self, PriceError> {
        check_unit_price(unit_price)?;

        Ok(Self {
            id: id.into(),
            title: title.into(),
            image_url: image_url.into(),
            unit_price,
        })
    }

    #[must_use]
    pub const fn id(&self) -> &ProductId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    #[must_use]
    pub const fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    /// Turn the descriptor into a line item with quantity 1.
    #[must_use]
    pub fn into_line_item(self) -> LineItem {
        LineItem {
            id: self.id,
            title: self.title,
            image_url: self.image_url,
            unit_price: self.unit_price,
            quantity: 1,
        }
    }
}
