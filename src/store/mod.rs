// ============================================================================
// Report Store Module
// ============================================================================
//
// Transactional named key-value stores with commit/rollback semantics.
//
// Design Patterns Used:
// - State Pattern: Transaction state management (Active, Committed, Aborted)
// - Staged writes: upserts are recorded on the transaction and applied
//   atomically on commit
//
// ============================================================================

pub mod snapshot;
pub mod store;
pub mod transaction;

pub use snapshot::{SnapshotManager, StoreSnapshot};
pub use store::ReportStore;
pub use transaction::{StoreTransaction, TransactionId, TransactionState, take_new};
