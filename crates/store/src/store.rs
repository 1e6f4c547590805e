//! The ledger store: serialized state access plus idempotency receipts.

use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::time::timeout;

use centavo_core::ledger::{Account, LedgerError};
use centavo_shared::config::StoreConfig;
use centavo_shared::types::{AccountId, IdempotencyKey};

use crate::processor::OperationOutcome;
use crate::state::StoreState;

/// In-memory ledger store.
///
/// All state sits behind one async `RwLock`; a processor operation is one
/// write-guard critical section, which makes it a serializable unit of work.
/// Writers wait a bounded time for the guard; a timed-out wait surfaces as the
/// transient `ConcurrencyConflict` so callers can retry.
#[derive(Debug)]
pub struct LedgerStore {
    state: RwLock<StoreState>,
    receipts: DashMap<IdempotencyKey, OperationOutcome>,
    lock_wait: Duration,
}

impl LedgerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            receipts: DashMap::new(),
            lock_wait: Duration::from_millis(config.lock_wait_ms),
        }
    }

    /// Acquires the state for reading.
    pub async fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().await
    }

    /// Acquires the state for writing, waiting at most the configured bound.
    ///
    /// # Errors
    ///
    /// Returns `ConcurrencyConflict` when the guard cannot be acquired in
    /// time.
    pub async fn write(&self) -> Result<RwLockWriteGuard<'_, StoreState>, LedgerError> {
        match timeout(self.lock_wait, self.state.write()).await {
            Ok(guard) => Ok(guard),
            Err(_) => {
                tracing::debug!(wait = ?self.lock_wait, "store lock wait timed out");
                Err(LedgerError::ConcurrencyConflict)
            }
        }
    }

    /// Registers or replaces an account.
    ///
    /// # Errors
    ///
    /// Returns a validation error for inconsistent billing configuration, or
    /// `ConcurrencyConflict` on lock-wait timeout.
    pub async fn upsert_account(&self, account: Account) -> Result<(), LedgerError> {
        account.validate()?;
        let mut state = self.write().await?;
        state.insert_account(account);
        Ok(())
    }

    /// A convenience snapshot of one account.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` when the account does not exist.
    pub async fn account(&self, id: AccountId) -> Result<Account, LedgerError> {
        Ok(self.read().await.account(id)?.clone())
    }

    /// The stored outcome for an idempotency key, if the operation already
    /// committed.
    #[must_use]
    pub fn receipt(&self, key: IdempotencyKey) -> Option<OperationOutcome> {
        self.receipts.get(&key).map(|entry| entry.value().clone())
    }

    /// Records the outcome of a keyed operation so a replay returns it
    /// instead of applying twice.
    pub fn record_outcome(&self, key: IdempotencyKey, outcome: OperationOutcome) {
        self.receipts.insert(key, outcome);
    }
}
