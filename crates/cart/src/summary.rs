//! Floating cart summary.
//!
//! Shows how many units are in the cart and what they cost, and sends the
//! user to the cart screen when tapped. The aggregates are derived from the
//! store's current snapshot and recomputed only when the snapshot changes.

use std::sync::Arc;

use gomarket_core::{CartSnapshot, CartTotals, CurrencyCode};
use tokio::sync::watch;
use tracing::debug;

use crate::storage::KeyValueStorage;
use crate::store::CartStore;

/// Screens the summary can navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// The full cart listing.
    Cart,
}

impl Route {
    /// Route name as registered with the host's navigator.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Cart => "Cart",
        }
    }
}

/// Host navigation capability.
pub trait Navigator {
    fn navigate(&self, route: Route);
}

impl<F: Fn(Route)> Navigator for F {
    fn navigate(&self, route: Route) {
        self(route);
    }
}

/// Rendered widget content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryView {
    pub item_count: u64,
    /// e.g. "5 itens"
    pub item_count_label: String,
    /// e.g. "R$ 35.00"
    pub total_price_label: String,
}

/// The floating cart summary widget.
///
/// Construction requires a store, so a summary can never exist without the
/// cart it describes.
pub struct CartSummary<N> {
    products: watch::Receiver<Arc<CartSnapshot>>,
    currency: CurrencyCode,
    navigator: N,
    cached: Option<(Arc<CartSnapshot>, CartTotals)>,
    #[cfg(test)]
    computed: u64,
}

impl<N: Navigator> CartSummary<N> {
    /// Attach a summary to `store`.
    pub fn new<S: KeyValueStorage>(store: &CartStore<S>, navigator: N) -> Self {
        Self {
            products: store.subscribe(),
            currency: store.currency(),
            navigator,
            cached: None,
            #[cfg(test)]
            computed: 0,
        }
    }

    /// Item count and total price of the store's current cart.
    pub fn totals(&mut self) -> CartTotals {
        let current = Arc::clone(&self.products.borrow_and_update());

        if let Some((seen, totals)) = &self.cached {
            if Arc::ptr_eq(seen, &current) {
                return *totals;
            }
        }

        let totals = current.totals(self.currency);
        #[cfg(test)]
        {
            self.computed += 1;
        }
        self.cached = Some((current, totals));
        totals
    }

    /// Labels for the widget.
    pub fn render(&mut self) -> SummaryView {
        let totals = self.totals();
        SummaryView {
            item_count: totals.item_count,
            item_count_label: format!("{} itens", totals.item_count),
            total_price_label: totals.total_price.display(),
        }
    }

    /// Handle a tap: navigate to the cart screen.
    pub fn activate(&self) {
        debug!(route = Route::Cart.name(), "Cart summary activated");
        self.navigator.navigate(Route::Cart);
    }

    /// Wait for the cart to change.
    ///
    /// Returns `false` once every store handle is gone and no further change
    /// can arrive.
    pub async fn changed(&mut self) -> bool {
        self.products.changed().await.is_ok()
    }
}
