//! Offline queue replay.
//!
//! Operations performed while disconnected are queued locally and replayed
//! strictly in enqueue order once connectivity returns, one in-flight at a
//! time. Transient conflicts back off exponentially; anything else is
//! dead-lettered rather than silently dropped. Replay is safe to re-run after
//! a connectivity drop because every queued operation carries an idempotency
//! key and the processor returns the recorded outcome on re-apply.

use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use centavo_core::chain::EditScope;
use centavo_core::ledger::LedgerError;
use centavo_shared::config::SyncConfig;
use centavo_shared::types::{IdempotencyKey, PeriodClosureId, TransactionId, UserId};

use crate::processor::{
    CreateTransactionInput, LedgerTransactionProcessor, OperationOutcome, PayBillInput,
    TransactionUpdate, TransferInput,
};
use crate::retry::RetryPolicy;

/// A ledger mutation captured while offline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum QueuedOperation {
    /// Create a transaction or chain.
    Create(CreateTransactionInput),
    /// Move money between accounts.
    Transfer(TransferInput),
    /// Pay down a credit-card bill.
    PayBill(PayBillInput),
    /// Edit a transaction across a chain scope.
    Edit {
        /// The named transaction.
        id: TransactionId,
        /// Field updates.
        updates: TransactionUpdate,
        /// Chain breadth.
        scope: EditScope,
    },
    /// Delete a transaction across a chain scope.
    Delete {
        /// The named transaction.
        id: TransactionId,
        /// Chain breadth.
        scope: EditScope,
    },
    /// Unlock a period closure.
    Unlock {
        /// The closure to unlock.
        id: PeriodClosureId,
        /// Who is unlocking.
        by: UserId,
    },
}

/// One queued operation awaiting replay.
#[derive(Debug, Clone)]
pub struct OfflineQueueItem {
    /// At-most-once application key, minted at enqueue time.
    pub key: IdempotencyKey,
    /// The captured operation.
    pub operation: QueuedOperation,
    /// When the operation was queued.
    pub created_at: DateTime<Utc>,
    /// Replay attempts so far.
    pub attempt_count: u32,
}

/// Something queued operations can be replayed against.
#[async_trait]
pub trait ReplayTarget: Send + Sync {
    /// Applies one operation under its idempotency key.
    ///
    /// # Errors
    ///
    /// Returns the ledger error the operation failed with.
    async fn apply(&self, key: IdempotencyKey, operation: &QueuedOperation)
        -> Result<(), LedgerError>;
}

#[async_trait]
impl ReplayTarget for LedgerTransactionProcessor {
    async fn apply(
        &self,
        key: IdempotencyKey,
        operation: &QueuedOperation,
    ) -> Result<(), LedgerError> {
        match operation {
            QueuedOperation::Create(input) => {
                let mut input = input.clone();
                input.idempotency_key = Some(key);
                self.create_transaction(input).await.map(|_| ())
            }
            QueuedOperation::Transfer(input) => {
                let mut input = input.clone();
                input.idempotency_key = Some(key);
                self.transfer(input).await.map(|_| ())
            }
            QueuedOperation::PayBill(input) => {
                let mut input = input.clone();
                input.idempotency_key = Some(key);
                self.pay_credit_card_bill(input).await.map(|_| ())
            }
            QueuedOperation::Edit { id, updates, scope } => {
                if self.store().receipt(key).is_some() {
                    return Ok(());
                }
                let affected = self.edit_transaction(*id, updates.clone(), *scope).await?;
                self.store().record_outcome(key, OperationOutcome::Edited(affected));
                Ok(())
            }
            QueuedOperation::Delete { id, scope } => {
                if self.store().receipt(key).is_some() {
                    return Ok(());
                }
                let removed = self.delete_transaction(*id, *scope).await?;
                self.store().record_outcome(key, OperationOutcome::Deleted(removed));
                Ok(())
            }
            QueuedOperation::Unlock { id, by } => {
                self.unlock_period_closure(*id, *by).await.map(|_| ())
            }
        }
    }
}

/// A queued operation that could not be applied.
#[derive(Debug)]
pub struct DeadLetter {
    /// The failed item, attempt count included.
    pub item: OfflineQueueItem,
    /// The error it last failed with.
    pub error: LedgerError,
}

/// The outcome of one replay run.
#[derive(Debug, Default)]
pub struct ReplayReport {
    /// Keys applied successfully, in replay order.
    pub applied: Vec<IdempotencyKey>,
    /// Items that failed non-retryably or exhausted their attempts.
    pub dead_letter: Vec<DeadLetter>,
}

/// Replays the offline queue against a ledger, in order.
#[derive(Debug)]
pub struct OfflineSyncReconciler {
    queue: VecDeque<OfflineQueueItem>,
    policy: RetryPolicy,
}

impl OfflineSyncReconciler {
    /// Creates an empty reconciler.
    #[must_use]
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            queue: VecDeque::new(),
            policy: RetryPolicy::for_sync(config),
        }
    }

    /// Queues an operation, minting its idempotency key.
    pub fn enqueue(&mut self, operation: QueuedOperation) -> IdempotencyKey {
        let key = IdempotencyKey::new();
        self.queue.push_back(OfflineQueueItem {
            key,
            operation,
            created_at: Utc::now(),
            attempt_count: 0,
        });
        key
    }

    /// Number of operations awaiting replay.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns true when nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drains the queue against the target, strictly in enqueue order with
    /// one operation in flight at a time.
    ///
    /// Retryable failures back off exponentially up to the configured attempt
    /// bound; non-retryable failures and exhausted items land in the report's
    /// dead-letter list.
    pub async fn replay<T: ReplayTarget>(&mut self, target: &T) -> ReplayReport {
        let mut report = ReplayReport::default();

        while let Some(mut item) = self.queue.pop_front() {
            loop {
                item.attempt_count += 1;
                match target.apply(item.key, &item.operation).await {
                    Ok(()) => {
                        tracing::info!(key = %item.key, "queued operation applied");
                        report.applied.push(item.key);
                        break;
                    }
                    Err(err)
                        if err.is_retryable() && item.attempt_count < self.policy.max_attempts() =>
                    {
                        let delay = self.policy.delay_for(item.attempt_count);
                        tracing::warn!(
                            key = %item.key,
                            attempt = item.attempt_count,
                            delay = ?delay,
                            "replay conflict, backing off"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    Err(err) => {
                        tracing::warn!(key = %item.key, error = %err, "dead-lettering queued operation");
                        report.dead_letter.push(DeadLetter { item, error: err });
                        break;
                    }
                }
            }
        }
        report
    }
}
