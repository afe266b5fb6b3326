//! The cart store.
//!
//! [`CartStore`] is the single authoritative cart for a session. Mutations
//! apply to memory immediately and are persisted by the write-behind writer;
//! dependents subscribe to change notifications instead of polling.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use gomarket_core::{CartSnapshot, CurrencyCode, LineItem, NewLineItem, ProductId};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::config::CartConfig;
use crate::error::{CartError, Result};
use crate::persistence::{PersistenceStats, WriteBehind};
use crate::storage::KeyValueStorage;

/// What [`CartStore::load`] found in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A stored cart replaced the in-memory list.
    Restored {
        /// Number of line items restored.
        items: usize,
    },
    /// Nothing stored, or storage could not be read; the cart stays empty.
    Empty,
    /// A stored cart existed but was unreadable; the cart stays empty.
    Discarded,
    /// The store was already hydrated; nothing was read.
    AlreadyLoaded,
    /// The cart was mutated before the stored cart arrived. The in-memory
    /// cart is kept, and its queued write overwrites the stored one.
    Superseded,
}

/// Shared cart store.
///
/// This handle is cheaply cloneable via `Arc`. Build one at startup and pass
/// clones to everything that needs the cart.
pub struct CartStore<S: KeyValueStorage> {
    inner: Arc<CartStoreInner<S>>,
}

struct CartStoreInner<S> {
    storage: Arc<S>,
    key: String,
    currency: CurrencyCode,
    products: watch::Sender<Arc<CartSnapshot>>,
    writer: WriteBehind,
    loaded: AtomicBool,
    /// Set once a mutation has been published. Read and written under the
    /// watch lock.
    dirty: AtomicBool,
}

impl<S: KeyValueStorage> Clone for CartStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: KeyValueStorage> CartStore<S> {
    /// Create an empty, not yet hydrated store and spawn its writer.
    ///
    /// Call [`Self::load`] before the first mutation, or use [`Self::open`].
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn new(storage: S, config: &CartConfig) -> Self {
        let storage = Arc::new(storage);
        let writer = WriteBehind::spawn(Arc::clone(&storage), config.storage_key.clone());
        let (products, _) = watch::channel(Arc::new(CartSnapshot::empty()));

        Self {
            inner: Arc::new(CartStoreInner {
                storage,
                key: config.storage_key.clone(),
                currency: config.currency,
                products,
                writer,
                loaded: AtomicBool::new(false),
                dirty: AtomicBool::new(false),
            }),
        }
    }

    /// Create a store and hydrate it from storage.
    pub async fn open(storage: S, config: &CartConfig) -> Self {
        let store = Self::new(storage, config);
        store.load().await;
        store
    }

    /// Hydrate the cart from storage. Only the first call reads.
    ///
    /// Never fails: a missing, unreadable, or corrupt snapshot leaves the
    /// cart empty and is logged. A stored cart never replaces one that was
    /// already mutated; see [`LoadOutcome::Superseded`].
    #[instrument(skip(self), fields(key = %self.inner.key))]
    pub async fn load(&self) -> LoadOutcome {
        if self.inner.loaded.swap(true, Ordering::SeqCst) {
            debug!("Cart already loaded, skipping");
            return LoadOutcome::AlreadyLoaded;
        }

        let stored = match self.inner.storage.get(&self.inner.key).await {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                info!("No stored cart, starting empty");
                return LoadOutcome::Empty;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read stored cart, starting empty");
                return LoadOutcome::Empty;
            }
        };

        match CartSnapshot::from_json(&stored) {
            Ok(snapshot) => {
                let items = snapshot.len();
                let restored = self.inner.products.send_if_modified(|current| {
                    if self.inner.dirty.load(Ordering::SeqCst) {
                        return false;
                    }
                    *current = Arc::new(snapshot);
                    true
                });
                if restored {
                    info!(items, "Restored stored cart");
                    LoadOutcome::Restored { items }
                } else {
                    warn!(items, "Cart changed while loading, keeping in-memory cart");
                    LoadOutcome::Superseded
                }
            }
            Err(e) => {
                warn!(error = %e, "Stored cart is corrupt, starting empty");
                LoadOutcome::Discarded
            }
        }
    }

    /// Add a product, or bump its quantity if it is already in the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::WriterClosed`] if the change cannot be persisted.
    #[instrument(skip(self, item), fields(id = %item.id()))]
    pub fn add_to_cart(&self, item: NewLineItem) -> Result<()> {
        self.mutate(|cart| Ok(cart.with_added(item)))?;
        debug!("Added item to cart");
        Ok(())
    }

    /// Increase an item's quantity by one.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ItemNotFound`] if the item is not in the cart; the
    /// cart and storage are left untouched.
    #[instrument(skip(self), fields(id = %id))]
    pub fn increment(&self, id: &ProductId) -> Result<()> {
        self.mutate(|cart| {
            cart.with_incremented(id)
                .ok_or_else(|| CartError::ItemNotFound(id.clone()))
        })?;
        debug!("Incremented item");
        Ok(())
    }

    /// Decrease an item's quantity by one, removing it at zero.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ItemNotFound`] if the item is not in the cart; the
    /// cart and storage are left untouched.
    #[instrument(skip(self), fields(id = %id))]
    pub fn decrement(&self, id: &ProductId) -> Result<()> {
        self.mutate(|cart| {
            cart.with_decremented(id)
                .ok_or_else(|| CartError::ItemNotFound(id.clone()))
        })?;
        debug!("Decremented item");
        Ok(())
    }

    /// Apply `change` to the current cart, publish the result, and queue it
    /// for writing.
    ///
    /// The enqueue happens while the watch lock is held, so storage sees
    /// snapshots in mutation order even with several handles.
    fn mutate<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&CartSnapshot) -> Result<CartSnapshot>,
    {
        let mut outcome = Ok(());
        self.inner.products.send_if_modified(|current| {
            let next = match change(current) {
                Ok(next) => Arc::new(next),
                Err(e) => {
                    outcome = Err(e);
                    return false;
                }
            };
            if let Err(e) = self.inner.writer.enqueue(Arc::clone(&next)) {
                outcome = Err(e);
                return false;
            }
            *current = next;
            self.inner.dirty.store(true, Ordering::SeqCst);
            true
        });
        outcome
    }

    /// The current cart.
    #[must_use]
    pub fn products(&self) -> Arc<CartSnapshot> {
        Arc::clone(&self.inner.products.borrow())
    }

    /// Look up a single line item.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<LineItem> {
        self.inner.products.borrow().get(id).cloned()
    }

    /// Receive the cart each time it changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<CartSnapshot>> {
        self.inner.products.subscribe()
    }

    /// Currency the cart's prices are in.
    #[must_use]
    pub fn currency(&self) -> CurrencyCode {
        self.inner.currency
    }

    /// Wait until every mutation made so far has reached storage (or failed).
    ///
    /// # Errors
    ///
    /// Returns [`CartError::WriterClosed`] if the writer task is gone.
    pub async fn flush(&self) -> Result<()> {
        self.inner.writer.flush().await
    }

    #[must_use]
    pub fn persistence_stats(&self) -> PersistenceStats {
        self.inner.writer.stats()
    }
}
