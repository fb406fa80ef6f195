// ============================================================================
// Store Transaction State Management
// ============================================================================
//
// Implements the State Pattern for transaction lifecycle management.
// Each transaction moves through defined states: Active -> Committed/Aborted
//
// Writes are staged inside the transaction and only become visible when the
// store applies them atomically on commit. A transaction dropped without
// commit is rolled back.
//
// ============================================================================

use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::{ReportError, Result};

/// Global transaction ID counter
static NEXT_TX_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a store transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(pub u64);

impl TransactionId {
    /// Generate a new unique transaction ID
    pub fn new() -> Self {
        TransactionId(NEXT_TX_ID.fetch_add(1, Ordering::SeqCst))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tx_{}", self.0)
    }
}

/// Transaction state following the State Pattern
///
/// State transitions:
/// ```text
/// Active ──commit──> Committed
///   │
///   └──rollback──> Aborted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is active and can stage writes
    Active,

    /// Transaction has been successfully committed
    Committed,

    /// Transaction has been aborted/rolled back
    Aborted,
}

impl TransactionState {
    pub fn is_active(&self) -> bool {
        matches!(self, TransactionState::Active)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionState::Committed | TransactionState::Aborted
        )
    }
}

impl std::fmt::Display for TransactionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionState::Active => write!(f, "ACTIVE"),
            TransactionState::Committed => write!(f, "COMMITTED"),
            TransactionState::Aborted => write!(f, "ABORTED"),
        }
    }
}

/// Merge function applied when an upsert finds an existing value:
/// `(old, new) -> stored`.
pub type MergeFn = Box<dyn Fn(i64, i64) -> i64 + Send>;

/// Merge function that discards the old value and keeps the new one.
pub fn take_new(_old: i64, new: i64) -> i64 {
    new
}

/// A staged insert-or-merge write
pub struct StagedUpsert {
    pub store: String,
    pub key: String,
    pub value: i64,
    pub merge: MergeFn,
}

/// A store transaction with staged writes
///
/// # Thread Safety
/// A transaction is owned by a single caller; the store handles
/// synchronization when the staged writes are applied.
pub struct StoreTransaction {
    id: TransactionId,
    state: TransactionState,
    writes: Vec<StagedUpsert>,
}

impl StoreTransaction {
    pub(crate) fn new() -> Self {
        Self {
            id: TransactionId::new(),
            state: TransactionState::Active,
            writes: Vec::new(),
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Number of staged writes
    pub fn write_count(&self) -> usize {
        self.writes.len()
    }

    /// Stage an insert-or-merge write.
    ///
    /// If the key is absent when the transaction commits, `value` is
    /// inserted; otherwise the stored value becomes `merge(old, value)`.
    ///
    /// # Errors
    /// Returns an error if the transaction is not active.
    pub fn upsert(
        &mut self,
        store: impl Into<String>,
        key: impl Into<String>,
        value: i64,
        merge: impl Fn(i64, i64) -> i64 + Send + 'static,
    ) -> Result<()> {
        if !self.state.is_active() {
            return Err(ReportError::TransactionError(format!(
                "Cannot stage write: transaction {} is {}",
                self.id, self.state
            )));
        }

        self.writes.push(StagedUpsert {
            store: store.into(),
            key: key.into(),
            value,
            merge: Box::new(merge),
        });
        Ok(())
    }

    /// Take the staged writes for application, leaving the transaction empty.
    pub(crate) fn take_writes(&mut self) -> Vec<StagedUpsert> {
        std::mem::take(&mut self.writes)
    }

    /// Mark transaction as committed
    ///
    /// # Errors
    /// Returns an error if the transaction is not active.
    pub(crate) fn mark_committed(&mut self) -> Result<()> {
        if !self.state.is_active() {
            return Err(ReportError::TransactionError(format!(
                "Cannot commit: transaction {} is already {}",
                self.id, self.state
            )));
        }

        self.state = TransactionState::Committed;
        Ok(())
    }

    /// Mark transaction as aborted and discard staged writes
    ///
    /// # Errors
    /// Returns an error if the transaction is not active.
    pub fn rollback(&mut self) -> Result<()> {
        if !self.state.is_active() {
            return Err(ReportError::TransactionError(format!(
                "Cannot rollback: transaction {} is already {}",
                self.id, self.state
            )));
        }

        self.writes.clear();
        self.state = TransactionState::Aborted;
        Ok(())
    }
}

impl Drop for StoreTransaction {
    fn drop(&mut self) {
        // Ending the scope without commit discards the staged writes.
        if self.state.is_active() {
            let _ = self.rollback();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_id_generation() {
        let id1 = TransactionId::new();
        let id2 = TransactionId::new();
        assert!(id2.as_u64() > id1.as_u64());
    }

    #[test]
    fn test_transaction_lifecycle() {
        let mut tx = StoreTransaction::new();

        assert_eq!(tx.state(), TransactionState::Active);
        assert!(tx.state().is_active());
        assert!(!tx.state().is_terminal());

        tx.mark_committed().unwrap();
        assert_eq!(tx.state(), TransactionState::Committed);
        assert!(tx.state().is_terminal());
    }

    #[test]
    fn test_cannot_commit_twice() {
        let mut tx = StoreTransaction::new();

        tx.mark_committed().unwrap();
        assert!(tx.mark_committed().is_err());
    }

    #[test]
    fn test_rollback_clears_writes() {
        let mut tx = StoreTransaction::new();

        tx.upsert("reports", "NumberOfvotes", 42, take_new).unwrap();
        assert_eq!(tx.write_count(), 1);

        tx.rollback().unwrap();
        assert_eq!(tx.write_count(), 0);
        assert_eq!(tx.state(), TransactionState::Aborted);
    }

    #[test]
    fn test_cannot_stage_after_commit() {
        let mut tx = StoreTransaction::new();

        tx.mark_committed().unwrap();
        assert!(tx.upsert("reports", "NumberOfvotes", 1, take_new).is_err());
    }
}
