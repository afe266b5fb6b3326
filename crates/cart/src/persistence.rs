//! Write-behind persistence for cart snapshots.
//!
//! The store updates memory synchronously and hands each new snapshot to a
//! single background task through a FIFO channel. The task writes snapshots
//! in the order they were enqueued, so storage always ends on the latest
//! mutation no matter how slow individual writes are.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use gomarket_core::CartSnapshot;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use crate::error::CartError;
use crate::storage::KeyValueStorage;

/// Counters describing the writer's progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistenceStats {
    /// Snapshots handed to the writer.
    pub enqueued: u64,
    /// Snapshots stored successfully.
    pub written: u64,
    /// Snapshots that failed to encode or store.
    pub failed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    enqueued: AtomicU64,
    written: AtomicU64,
    failed: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> PersistenceStats {
        // Finished counts first: a write observed here was enqueued before it.
        let written = self.written.load(Ordering::SeqCst);
        let failed = self.failed.load(Ordering::SeqCst);
        PersistenceStats {
            enqueued: self.enqueued.load(Ordering::SeqCst),
            written,
            failed,
        }
    }
}

enum Command {
    Write(Arc<CartSnapshot>),
    Flush(oneshot::Sender<()>),
}

/// Handle to the background writer.
///
/// Dropping the last handle closes the queue; the task drains what is left
/// and exits.
#[derive(Debug)]
pub struct WriteBehind {
    tx: mpsc::UnboundedSender<Command>,
    counters: Arc<Counters>,
}

impl WriteBehind {
    /// Spawn the writer task on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn<S: KeyValueStorage>(storage: Arc<S>, key: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let counters = Arc::new(Counters::default());
        let key = key.into();

        info!(key = %key, "Spawning cart writer task");
        tokio::spawn(run(storage, key, rx, Arc::clone(&counters)));

        Self { tx, counters }
    }

    /// Queue a snapshot for writing. Returns immediately.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::WriterClosed`] if the writer task is gone.
    pub fn enqueue(&self, snapshot: Arc<CartSnapshot>) -> Result<(), CartError> {
        // Counted before sending so `written + failed` never exceeds `enqueued`.
        self.counters.enqueued.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(Command::Write(snapshot)).is_err() {
            self.counters.enqueued.fetch_sub(1, Ordering::SeqCst);
            return Err(CartError::WriterClosed);
        }
        Ok(())
    }

    /// Wait until every snapshot enqueued before this call has been handled.
    ///
    /// Failed writes count as handled; check [`Self::stats`] for failures.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::WriterClosed`] if the writer task is gone.
    pub async fn flush(&self) -> Result<(), CartError> {
        let (ack, done) = oneshot::channel();
        self.tx
            .send(Command::Flush(ack))
            .map_err(|_| CartError::WriterClosed)?;
        done.await.map_err(|_| CartError::WriterClosed)
    }

    #[must_use]
    pub fn stats(&self) -> PersistenceStats {
        self.counters.snapshot()
    }
}

async fn run<S: KeyValueStorage>(
    storage: Arc<S>,
    key: String,
    mut rx: mpsc::UnboundedReceiver<Command>,
    counters: Arc<Counters>,
) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Write(snapshot) => match write(storage.as_ref(), &key, &snapshot).await {
                Ok(()) => {
                    counters.written.fetch_add(1, Ordering::SeqCst);
                    debug!(key = %key, items = snapshot.len(), "Cart snapshot persisted");
                }
                Err(e) => {
                    counters.failed.fetch_add(1, Ordering::SeqCst);
                    error!(
                        key = %key,
                        items = snapshot.len(),
                        error = %e,
                        "Failed to persist cart snapshot; stored cart is behind memory"
                    );
                }
            },
            Command::Flush(ack) => {
                // The flusher may have stopped waiting.
                let _ = ack.send(());
            }
        }
    }

    info!(key = %key, "Cart writer task stopped");
}

async fn write<S: KeyValueStorage>(
    storage: &S,
    key: &str,
    snapshot: &CartSnapshot,
) -> Result<(), CartError> {
    let json = snapshot.to_json()?;
    storage.set(key, json).await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use gomarket_core::NewLineItem;
    use rust_decimal::Decimal;

    use super::*;
    use crate::storage::{MemoryStorage, StorageError};

    /// Storage whose first write is slow, to check ordering.
    struct SlowFirstWrite {
        inner: MemoryStorage,
        calls: AtomicU64,
    }

    impl KeyValueStorage for SlowFirstWrite {
        async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            self.inner.set(key, value).await
        }
    }

    struct Broken;

    impl KeyValueStorage for Broken {
        async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("broken".to_string()))
        }

        async fn set(&self, _key: &str, _value: String) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("broken".to_string()))
        }
    }

    fn snapshot_with(ids: &[&str]) -> Arc<CartSnapshot> {
        let cart = ids.iter().fold(CartSnapshot::empty(), |cart, id| {
            cart.with_added(NewLineItem::new(*id, *id, "", Decimal::ONE).unwrap())
        });
        Arc::new(cart)
    }

    #[tokio::test]
    async fn test_last_enqueued_snapshot_wins() {
        let memory = MemoryStorage::new();
        let storage = Arc::new(SlowFirstWrite {
            inner: memory.clone(),
            calls: AtomicU64::new(0),
        });
        let writer = WriteBehind::spawn(storage, "cart");

        writer.enqueue(snapshot_with(&["a"])).unwrap();
        writer.enqueue(snapshot_with(&["a", "b"])).unwrap();
        writer.flush().await.unwrap();

        let stored = memory.get("cart").await.unwrap().unwrap();
        assert_eq!(
            CartSnapshot::from_json(&stored).unwrap(),
            *snapshot_with(&["a", "b"])
        );
        assert_eq!(
            writer.stats(),
            PersistenceStats {
                enqueued: 2,
                written: 2,
                failed: 0
            }
        );
    }

    #[tokio::test]
    async fn test_failed_writes_are_counted() {
        let writer = WriteBehind::spawn(Arc::new(Broken), "cart");
        writer.enqueue(snapshot_with(&["a"])).unwrap();
        writer.flush().await.unwrap();

        let stats = writer.stats();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.written, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stats_never_report_more_finished_than_enqueued() {
        let writer = Arc::new(WriteBehind::spawn(Arc::new(MemoryStorage::new()), "cart"));

        let reader = {
            let writer = Arc::clone(&writer);
            tokio::spawn(async move {
                for _ in 0..2_000 {
                    let stats = writer.stats();
                    assert!(stats.written + stats.failed <= stats.enqueued, "{stats:?}");
                    tokio::task::yield_now().await;
                }
            })
        };

        for _ in 0..500 {
            writer.enqueue(snapshot_with(&["a"])).unwrap();
        }
        writer.flush().await.unwrap();
        reader.await.unwrap();

        assert_eq!(writer.stats().written, 500);
    }
}
