//! Ledger store and transaction processor.
//!
//! Everything stateful lives here: the in-memory [`LedgerStore`], the
//! [`LedgerTransactionProcessor`] that runs every mutation as one serializable
//! unit of work, the retry policy for transient conflicts, and the
//! [`OfflineSyncReconciler`] that replays queued offline operations.

pub mod processor;
pub mod retry;
pub mod state;
pub mod store;
pub mod sync;

pub use processor::{
    ClosureInput, CreateKind, CreateTransactionInput, InvoiceSummary, LedgerTransactionProcessor,
    OperationOutcome, PayBillInput, Recurrence, TransactionUpdate, TransferInput,
};
pub use retry::RetryPolicy;
pub use store::LedgerStore;
pub use sync::{
    DeadLetter, OfflineQueueItem, OfflineSyncReconciler, QueuedOperation, ReplayReport,
    ReplayTarget,
};
