//! Cart snapshots and the pure transitions between them.
//!
//! A [`CartSnapshot`] is the whole cart: the ordered list of line items that
//! gets persisted in one piece. Every transition returns a new snapshot and
//! leaves `self` untouched, so readers holding an older snapshot never see a
//! half-applied change.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::line_item::{LineItem, NewLineItem};
use super::price::{CurrencyCode, Price, check_unit_price};

/// Errors decoding a persisted snapshot.
#[derive(thiserror::Error, Debug)]
pub enum SnapshotError {
    /// The stored text is not a JSON list of line items.
    #[error("snapshot is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    /// The stored list parsed but breaks a cart invariant.
    #[error("snapshot is invalid: {0}")]
    Invalid(String),
}

/// The ordered list of line items in a cart, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartSnapshot(Vec<LineItem>);

/// Aggregates shown by the cart summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartTotals {
    /// Sum of all quantities.
    pub item_count: u64,
    /// Sum of `quantity × unit_price` over all items.
    pub total_price: Price,
}

impl CartSnapshot {
    /// An empty cart.
    #[must_use]
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// Build a snapshot from items, checking the cart invariants.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Invalid`] on a zero quantity, a negative or
    /// oversized price, or a duplicated ID.
    pub fn from_items(items: Vec<LineItem>) -> Result<Self, SnapshotError> {
        let snapshot = Self(items);
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Decode a persisted snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Parse`] if the text is not a list of line
    /// items, or [`SnapshotError::Invalid`] if the list breaks an invariant.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let items: Vec<LineItem> = serde_json::from_str(json)?;
        Self::from_items(items)
    }

    /// Encode the snapshot in its persisted form.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.0)
    }

    fn validate(&self) -> Result<(), SnapshotError> {
        let mut seen = HashSet::with_capacity(self.0.len());
        for item in &self.0 {
            if item.quantity == 0 {
                return Err(SnapshotError::Invalid(format!(
                    "item {} has quantity 0",
                    item.id
                )));
            }
            if let Err(e) = check_unit_price(item.unit_price) {
                return Err(SnapshotError::Invalid(format!("item {}: {e}", item.id)));
            }
            if !seen.insert(&item.id) {
                return Err(SnapshotError::Invalid(format!(
                    "item {} appears more than once",
                    item.id
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Look up an item by product ID.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&LineItem> {
        self.0.iter().find(|item| &item.id == id)
    }

    fn position(&self, id: &ProductId) -> Option<usize> {
        self.0.iter().position(|item| &item.id == id)
    }

    /// Add a product: appended with quantity 1, or incremented if present.
    #[must_use]
    pub fn with_added(&self, item: NewLineItem) -> Self {
        if let Some(next) = self.with_incremented(item.id()) {
            return next;
        }

        let mut items = self.0.clone();
        items.push(item.into_line_item());
        Self(items)
    }

    /// Increase an item's quantity by one.
    ///
    /// Returns `None` if no item has that ID.
    #[must_use]
    pub fn with_incremented(&self, id: &ProductId) -> Option<Self> {
        let index = self.position(id)?;
        let mut items = self.0.clone();
        let slot = items.get_mut(index)?;
        *slot = slot.with_quantity(slot.quantity.saturating_add(1));
        Some(Self(items))
    }

    /// Decrease an item's quantity by one, removing it when it reaches zero.
    ///
    /// Returns `None` if no item has that ID.
    #[must_use]
    pub fn with_decremented(&self, id: &ProductId) -> Option<Self> {
        let index = self.position(id)?;
        let mut items = self.0.clone();
        let remaining = items.get(index)?.quantity.saturating_sub(1);
        if remaining > 0 {
            let slot = items.get_mut(index)?;
            *slot = slot.with_quantity(remaining);
        } else {
            items.remove(index);
        }
        Some(Self(items))
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.0.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of all line totals, saturating at `Decimal::MAX`.
    #[must_use]
    pub fn total_amount(&self) -> Decimal {
        self.0
            .iter()
            .map(LineItem::line_total)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Both summary aggregates, priced in `currency_code`.
    #[must_use]
    pub fn totals(&self, currency_code: CurrencyCode) -> CartTotals {
        CartTotals {
            item_count: self.item_count(),
            total_price: Price::new(self.total_amount(), currency_code),
        }
    }
}

impl<'a> IntoIterator for &'a CartSnapshot {
    type Item = &'a LineItem;
    type IntoIter = std::slice::Iter<'a, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::price::MAX_UNIT_PRICE;

    fn product(id: &str, price: i64) -> NewLineItem {
        NewLineItem::new(id, format!("Product {id}"), "", Decimal::new(price, 0)).unwrap()
    }

    fn line(id: &str, price: i64, quantity: u32) -> LineItem {
        product(id, price).into_line_item().with_quantity(quantity)
    }

    #[test]
    fn test_add_appends_in_order() {
        let cart = CartSnapshot::empty()
            .with_added(product("a", 10))
            .with_added(product("b", 5));
        let ids: Vec<_> = cart.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert!(cart.items().iter().all(|i| i.quantity == 1));
    }

    #[test]
    fn test_add_twice_equals_add_then_increment() {
        let twice = CartSnapshot::empty()
            .with_added(product("a", 10))
            .with_added(product("a", 10));
        let incremented = CartSnapshot::empty()
            .with_added(product("a", 10))
            .with_incremented(&ProductId::new("a"))
            .unwrap();
        assert_eq!(twice, incremented);
        assert_eq!(twice.get(&ProductId::new("a")).unwrap().quantity, 2);
        assert_eq!(twice.len(), 1);
    }

    #[test]
    fn test_decrement_removes_at_zero() {
        let id = ProductId::new("a");
        let cart = CartSnapshot::empty().with_added(product("a", 10));
        let cart = cart.with_decremented(&id).unwrap();
        assert!(cart.get(&id).is_none());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_decrement_keeps_position() {
        let cart = CartSnapshot::from_items(vec![line("a", 1, 1), line("b", 1, 3), line("c", 1, 1)])
            .unwrap();
        let cart = cart.with_decremented(&ProductId::new("b")).unwrap();
        let ids: Vec<_> = cart.items().iter().map(|i| (i.id.as_str(), i.quantity)).collect();
        assert_eq!(ids, [("a", 1), ("b", 2), ("c", 1)]);
    }

    #[test]
    fn test_missing_id_returns_none() {
        let cart = CartSnapshot::empty().with_added(product("a", 10));
        assert!(cart.with_incremented(&ProductId::new("zzz")).is_none());
        assert!(cart.with_decremented(&ProductId::new("zzz")).is_none());
    }

    #[test]
    fn test_transitions_leave_original_untouched() {
        let cart = CartSnapshot::empty().with_added(product("a", 10));
        let _ = cart.with_incremented(&ProductId::new("a")).unwrap();
        assert_eq!(cart.get(&ProductId::new("a")).unwrap().quantity, 1);
    }

    #[test]
    fn test_totals() {
        let cart = CartSnapshot::from_items(vec![line("a", 10, 2), line("b", 5, 3)]).unwrap();
        let totals = cart.totals(CurrencyCode::BRL);
        assert_eq!(totals.item_count, 5);
        assert_eq!(totals.total_price.amount, Decimal::new(35, 0));
        assert_eq!(totals.total_price.display(), "R$ 35.00");
    }

    #[test]
    fn test_empty_totals() {
        let totals = CartSnapshot::empty().totals(CurrencyCode::USD);
        assert_eq!(totals.item_count, 0);
        assert_eq!(totals.total_price.display(), "$0.00");
    }

    #[test]
    fn test_totals_saturate_instead_of_panicking() {
        let big = LineItem {
            unit_price: Decimal::MAX,
            ..line("a", 1, 1)
        };
        let cart = CartSnapshot(vec![big.with_quantity(2), line("b", 1, 1)]);
        let totals = cart.totals(CurrencyCode::BRL);
        assert_eq!(totals.total_price.amount, Decimal::MAX);
        assert_eq!(totals.item_count, 3);
    }

    #[test]
    fn test_largest_accepted_cart_totals_without_overflow() {
        let max = LineItem {
            unit_price: MAX_UNIT_PRICE,
            ..line("a", 1, 1)
        }
        .with_quantity(u32::MAX);
        let other = LineItem {
            id: ProductId::new("b"),
            ..max.clone()
        };
        let cart = CartSnapshot::from_items(vec![max, other]).unwrap();
        let expected = MAX_UNIT_PRICE * Decimal::from(u32::MAX) * Decimal::TWO;
        assert_eq!(cart.total_amount(), expected);
    }

    #[test]
    fn test_json_roundtrip_preserves_items() {
        let cart = CartSnapshot::from_items(vec![line("a", 10, 2), line("b", 5, 3)]).unwrap();
        let json = cart.to_json().unwrap();
        assert!(json.starts_with('['));
        assert_eq!(CartSnapshot::from_json(&json).unwrap(), cart);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            CartSnapshot::from_json("not json"),
            Err(SnapshotError::Parse(_))
        ));
        assert!(matches!(
            CartSnapshot::from_json(r#"{"id":"a"}"#),
            Err(SnapshotError::Parse(_))
        ));
    }

    #[test]
    fn test_from_json_rejects_broken_invariants() {
        let zero = r#"[{"id":"a","title":"A","image_url":"","price":1,"quantity":0}]"#;
        assert!(matches!(
            CartSnapshot::from_json(zero),
            Err(SnapshotError::Invalid(_))
        ));

        let negative = r#"[{"id":"a","title":"A","image_url":"","price":-1,"quantity":1}]"#;
        assert!(matches!(
            CartSnapshot::from_json(negative),
            Err(SnapshotError::Invalid(_))
        ));

        let oversized = r#"[{"id":"a","title":"A","image_url":"","price":5e28,"quantity":2}]"#;
        assert!(matches!(
            CartSnapshot::from_json(oversized),
            Err(SnapshotError::Invalid(_))
        ));

        let duplicate = r#"[
            {"id":"a","title":"A","image_url":"","price":1,"quantity":1},
            {"id":"a","title":"A","image_url":"","price":1,"quantity":2}
        ]"#;
        assert!(matches!(
            CartSnapshot::from_json(duplicate),
            Err(SnapshotError::Invalid(_))
        ));
    }
}
