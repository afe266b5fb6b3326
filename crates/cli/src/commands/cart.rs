//! Cart commands.
//!
//! Every command opens the file-backed store once, performs one action, waits
//! for the write-behind queue to drain, and prints the summary widget.

#![allow(clippy::print_stdout)]

use std::fmt::Write as _;

use gomarket_cart::{
    CartConfig, CartError, CartStore, CartSummary, FileStorage, KeyValueStorage, Navigator, Route,
};
use gomarket_core::{CartSnapshot, CurrencyCode, NewLineItem, Price, ProductId};
use rust_decimal::Decimal;
use tracing::{error, info};

/// Navigator that renders the requested screen to the terminal.
pub struct TerminalNavigator<S: KeyValueStorage> {
    store: CartStore<S>,
}

impl<S: KeyValueStorage> TerminalNavigator<S> {
    #[must_use]
    pub const fn new(store: CartStore<S>) -> Self {
        Self { store }
    }
}

impl<S: KeyValueStorage> Navigator for TerminalNavigator<S> {
    fn navigate(&self, route: Route) {
        info!(route = route.name(), "Navigating");
        match route {
            Route::Cart => {
                print!(
                    "{}",
                    render_cart_screen(&self.store.products(), self.store.currency())
                );
            }
        }
    }
}

/// Open and hydrate the cart configured in `config`.
pub async fn open_store(config: &CartConfig) -> CartStore<FileStorage> {
    let storage = FileStorage::new(&config.storage_dir);
    info!(path = %storage.path_for(&config.storage_key).display(), "Opening cart");
    CartStore::open(storage, config).await
}

/// Print the cart lines.
pub fn show<S: KeyValueStorage>(store: &CartStore<S>) {
    print!("{}", render_cart_screen(&store.products(), store.currency()));
}

/// Add a product.
///
/// # Errors
///
/// Returns an error if the price is negative or the change cannot be queued.
pub fn add<S: KeyValueStorage>(
    store: &CartStore<S>,
    id: &str,
    title: &str,
    image_url: &str,
    price: Decimal,
) -> Result<(), Box<dyn std::error::Error>> {
    let item = NewLineItem::new(id, title, image_url, price)?;
    store.add_to_cart(item)?;
    Ok(())
}

/// Increase a product's quantity.
///
/// # Errors
///
/// Returns an error if the product is not in the cart.
pub fn increment<S: KeyValueStorage>(store: &CartStore<S>, id: &str) -> Result<(), CartError> {
    store.increment(&ProductId::new(id))
}

/// Decrease a product's quantity.
///
/// # Errors
///
/// Returns an error if the product is not in the cart.
pub fn decrement<S: KeyValueStorage>(store: &CartStore<S>, id: &str) -> Result<(), CartError> {
    store.decrement(&ProductId::new(id))
}

/// Tap the floating summary.
pub fn open<S: KeyValueStorage>(store: &CartStore<S>) {
    let summary = CartSummary::new(store, TerminalNavigator::new(store.clone()));
    summary.activate();
}

/// Drain pending writes and print the summary widget.
///
/// # Errors
///
/// Returns an error if any write failed, since the stored cart is then behind
/// what was printed.
pub async fn finish<S: KeyValueStorage>(
    store: &CartStore<S>,
) -> Result<(), Box<dyn std::error::Error>> {
    store.flush().await?;

    let mut summary = CartSummary::new(store, |_route: Route| {});
    let view = summary.render();
    println!("[{}]  {}", view.item_count_label, view.total_price_label);

    let stats = store.persistence_stats();
    if stats.failed > 0 {
        error!(failed = stats.failed, "Cart changes were not saved");
        return Err(format!("{} cart write(s) failed", stats.failed).into());
    }
    Ok(())
}

/// Text listing of the cart screen.
fn render_cart_screen(cart: &CartSnapshot, currency: CurrencyCode) -> String {
    let mut out = String::new();

    if cart.is_empty() {
        out.push_str("Cart is empty\n");
        return out;
    }

    for item in cart {
        let unit = Price::new(item.unit_price, currency);
        let line = Price::new(item.line_total(), currency);
        // Writing to a String cannot fail.
        let _ = writeln!(
            out,
            "{:<12} {:<30} {:>3} x {:>12} = {:>12}",
            item.id.as_str(),
            item.title,
            item.quantity,
            unit.display(),
            line.display()
        );
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gomarket_cart::MemoryStorage;

    use super::*;

    #[test]
    fn test_render_empty_cart() {
        let screen = render_cart_screen(&CartSnapshot::empty(), CurrencyCode::BRL);
        assert_eq!(screen, "Cart is empty\n");
    }

    #[test]
    fn test_render_lists_each_line() {
        let cart = CartSnapshot::empty()
            .with_added(NewLineItem::new("1", "Cadeira", "", Decimal::new(1400, 0)).unwrap())
            .with_added(NewLineItem::new("2", "Mesa", "", Decimal::new(250, 1)).unwrap())
            .with_added(NewLineItem::new("2", "Mesa", "", Decimal::new(250, 1)).unwrap());
        let screen = render_cart_screen(&cart, CurrencyCode::BRL);
        let lines: Vec<_> = screen.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Cadeira"));
        assert!(lines[0].contains("R$ 1400.00"));
        assert!(lines[1].contains("2 x"));
        assert!(lines[1].ends_with("R$ 50.00"));
    }

    #[tokio::test]
    async fn test_add_rejects_negative_price() {
        let store = CartStore::open(MemoryStorage::new(), &CartConfig::default()).await;
        let result = add(&store, "1", "Broken", "", Decimal::new(-5, 0));
        assert!(result.is_err());
        assert!(store.products().is_empty());
    }

    #[tokio::test]
    async fn test_commands_persist_to_file_storage() {
        let dir = tempfile::tempdir().unwrap();
        let config = CartConfig {
            storage_dir: dir.path().to_path_buf(),
            ..CartConfig::default()
        };

        let store = open_store(&config).await;
        add(&store, "1", "Cadeira", "", Decimal::new(1400, 0)).unwrap();
        increment(&store, "1").unwrap();
        assert!(decrement(&store, "missing").is_err());
        finish(&store).await.unwrap();
        drop(store);

        let reopened = open_store(&config).await;
        assert_eq!(reopened.get(&ProductId::new("1")).unwrap().quantity, 2);
    }
}
