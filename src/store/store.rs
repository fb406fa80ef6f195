// ============================================================================
// Report Store
// ============================================================================

use std::path::Path;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::snapshot::{SnapshotManager, StoreMap, StoreSnapshot};
use super::transaction::StoreTransaction;
use crate::core::{ReportError, Result};

/// File name of the store snapshot inside the data directory.
const SNAPSHOT_FILE: &str = "reports.snapshot";

/// Transactional key-value store for aggregate reports.
///
/// Values live in named stores and are written through scoped transactions:
/// callers stage upserts on a [`StoreTransaction`] and commit it, at which
/// point all staged writes become visible atomically. A transaction that
/// ends without commit leaves the store untouched.
///
/// When a data directory is configured, every commit also persists a
/// snapshot of the full store contents, and [`ReportStore::open`] reloads
/// the last committed state.
#[derive(Clone)]
pub struct ReportStore {
    stores: Arc<RwLock<StoreMap>>,
    snapshot: Option<SnapshotManager>,
}

impl ReportStore {
    /// Create an empty in-memory store without snapshot persistence.
    pub fn new() -> Self {
        Self {
            stores: Arc::new(RwLock::new(StoreMap::new())),
            snapshot: None,
        }
    }

    /// Open a store backed by a snapshot file in `data_dir`, reloading the
    /// last committed state if one exists.
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let manager = SnapshotManager::new(data_dir.as_ref().join(SNAPSHOT_FILE));
        let stores = match manager.load()? {
            Some(snapshot) => snapshot.stores,
            None => StoreMap::new(),
        };

        Ok(Self {
            stores: Arc::new(RwLock::new(stores)),
            snapshot: Some(manager),
        })
    }

    /// Begin a new transaction.
    pub fn begin(&self) -> StoreTransaction {
        StoreTransaction::new()
    }

    /// Commit a transaction, applying all staged writes atomically.
    ///
    /// The new state is persisted (when snapshots are configured) before it
    /// becomes visible, so a failed persist leaves both the in-memory state
    /// and the on-disk snapshot at the previously committed values. On
    /// failure the transaction is rolled back.
    ///
    /// # Errors
    /// `PersistFailed` if the snapshot cannot be written, `TransactionError`
    /// if the transaction is not active.
    pub async fn commit(&self, tx: &mut StoreTransaction) -> Result<()> {
        if !tx.state().is_active() {
            return Err(ReportError::TransactionError(format!(
                "Cannot commit: transaction {} is already {}",
                tx.id(),
                tx.state()
            )));
        }

        // Apply staged writes to a copy of the current state.
        let next = {
            let stores = self.stores.read().await;
            let mut next = stores.clone();
            for write in tx.take_writes() {
                let entries = next.entry(write.store).or_default();
                let value = match entries.get(&write.key) {
                    Some(old) => (write.merge)(*old, write.value),
                    None => write.value,
                };
                entries.insert(write.key, value);
            }
            next
        };

        if let Some(manager) = &self.snapshot {
            if let Err(err) = manager.save(&StoreSnapshot::new(next.clone())) {
                tx.rollback()?;
                return Err(err);
            }
        }

        {
            let mut stores = self.stores.write().await;
            *stores = next;
        }

        tx.mark_committed()
    }

    /// Run `stage` inside a transaction and commit it.
    ///
    /// If `stage` returns an error the transaction is dropped without
    /// commit and no writes become visible.
    pub async fn with_transaction<F>(&self, stage: F) -> Result<()>
    where
        F: FnOnce(&mut StoreTransaction) -> Result<()>,
    {
        let mut tx = self.begin();
        stage(&mut tx)?;
        self.commit(&mut tx).await
    }

    /// Read a single value in a short-lived read scope, independent of any
    /// writer transaction.
    pub async fn try_get(&self, store: &str, key: &str) -> Option<i64> {
        let stores = self.stores.read().await;
        stores.get(store)?.get(key).copied()
    }
}

impl Default for ReportStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::transaction::take_new;

    #[tokio::test]
    async fn test_upsert_inserts_when_absent() {
        let store = ReportStore::new();

        let mut tx = store.begin();
        tx.upsert("reports", "NumberOfvotes", 7, take_new).unwrap();
        store.commit(&mut tx).await.unwrap();

        assert_eq!(store.try_get("reports", "NumberOfvotes").await, Some(7));
    }

    #[tokio::test]
    async fn test_upsert_replaces_with_merge() {
        let store = ReportStore::new();

        store
            .with_transaction(|tx| tx.upsert("reports", "NumberOfvotes", 7, take_new))
            .await
            .unwrap();
        store
            .with_transaction(|tx| tx.upsert("reports", "NumberOfvotes", 3, take_new))
            .await
            .unwrap();

        // Replace, not accumulate.
        assert_eq!(store.try_get("reports", "NumberOfvotes").await, Some(3));
    }

    #[tokio::test]
    async fn test_merge_function_sees_old_value() {
        let store = ReportStore::new();

        store
            .with_transaction(|tx| tx.upsert("counters", "hits", 10, take_new))
            .await
            .unwrap();
        store
            .with_transaction(|tx| tx.upsert("counters", "hits", 5, |old, new| old + new))
            .await
            .unwrap();

        assert_eq!(store.try_get("counters", "hits").await, Some(15));
    }

    #[tokio::test]
    async fn test_uncommitted_transaction_is_invisible() {
        let store = ReportStore::new();

        {
            let mut tx = store.begin();
            tx.upsert("reports", "NumberOfvotes", 99, take_new).unwrap();
            // Dropped without commit.
        }

        assert_eq!(store.try_get("reports", "NumberOfvotes").await, None);
    }

    #[tokio::test]
    async fn test_try_get_missing() {
        let store = ReportStore::new();
        assert_eq!(store.try_get("reports", "NumberOfvotes").await, None);
        assert_eq!(store.try_get("nothing", "here").await, None);
    }

    #[tokio::test]
    async fn test_commit_after_rollback_fails() {
        let store = ReportStore::new();

        let mut tx = store.begin();
        tx.upsert("reports", "NumberOfvotes", 1, take_new).unwrap();
        tx.rollback().unwrap();

        assert!(store.commit(&mut tx).await.is_err());
        assert_eq!(store.try_get("reports", "NumberOfvotes").await, None);
    }
}
