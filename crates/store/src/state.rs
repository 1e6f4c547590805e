//! In-memory ledger state: flat tables plus the chain index.
//!
//! `StoreState` is plain data behind the store's lock. Lookups are fallible;
//! mutations are infallible so the processor can validate everything first and
//! then apply without a rollback path.

use std::collections::HashMap;

use chrono::NaiveDate;

use centavo_core::fiscal::{ensure_unlocked, PeriodClosure};
use centavo_core::ledger::{Account, JournalEntry, LedgerError, Transaction};
use centavo_shared::types::{AccountId, Money, PeriodClosureId, TransactionId, UserId};

/// The whole ledger for every user, held in memory.
#[derive(Debug, Default)]
pub struct StoreState {
    accounts: HashMap<AccountId, Account>,
    transactions: HashMap<TransactionId, Transaction>,
    entries: HashMap<TransactionId, Vec<JournalEntry>>,
    /// Chain index: root transaction id to its children.
    children: HashMap<TransactionId, Vec<TransactionId>>,
    /// Period closures, grouped per owner.
    closures: HashMap<UserId, Vec<PeriodClosure>>,
}

impl StoreState {
    /// Inserts or replaces an account.
    pub fn insert_account(&mut self, account: Account) {
        self.accounts.insert(account.id, account);
    }

    /// Looks up an account.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` when the account does not exist.
    pub fn account(&self, id: AccountId) -> Result<&Account, LedgerError> {
        self.accounts.get(&id).ok_or(LedgerError::AccountNotFound(id))
    }

    /// Looks up a transaction.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` when the transaction does not exist.
    pub fn transaction(&self, id: TransactionId) -> Result<&Transaction, LedgerError> {
        self.transactions
            .get(&id)
            .ok_or(LedgerError::TransactionNotFound(id))
    }

    /// The journal entries owned by a transaction; empty for pending
    /// transactions and for the incoming half of a linked pair.
    #[must_use]
    pub fn entries_for(&self, id: TransactionId) -> &[JournalEntry] {
        self.entries.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Inserts a transaction with its entries and maintains the chain index.
    pub fn insert_transaction(&mut self, txn: Transaction, entries: Vec<JournalEntry>) {
        if let Some(parent) = txn.parent_transaction_id {
            self.children.entry(parent).or_default().push(txn.id);
        }
        if !entries.is_empty() {
            self.entries.insert(txn.id, entries);
        }
        self.transactions.insert(txn.id, txn);
    }

    /// Replaces an existing transaction and its entries. Chain membership is
    /// immutable, so the index is left alone.
    pub fn replace_transaction(&mut self, txn: Transaction, entries: Vec<JournalEntry>) {
        if entries.is_empty() {
            self.entries.remove(&txn.id);
        } else {
            self.entries.insert(txn.id, entries);
        }
        self.transactions.insert(txn.id, txn);
    }

    /// Removes a transaction, its entries, and its chain-index slots.
    pub fn remove_transaction(&mut self, id: TransactionId) -> Option<Transaction> {
        let txn = self.transactions.remove(&id)?;
        self.entries.remove(&id);
        self.children.remove(&id);
        if let Some(parent) = txn.parent_transaction_id {
            if let Some(siblings) = self.children.get_mut(&parent) {
                siblings.retain(|child| *child != id);
            }
        }
        Some(txn)
    }

    /// Every member of the target's chain (root plus children, the target
    /// included), sorted by date then creation time.
    #[must_use]
    pub fn chain_members(&self, target: &Transaction) -> Vec<Transaction> {
        let root = target.chain_root();
        let mut members: Vec<Transaction> = Vec::new();
        if let Some(txn) = self.transactions.get(&root) {
            members.push(txn.clone());
        }
        if let Some(children) = self.children.get(&root) {
            members.extend(
                children
                    .iter()
                    .filter_map(|id| self.transactions.get(id))
                    .cloned(),
            );
        }
        if !members.iter().any(|t| t.id == target.id) {
            members.push(target.clone());
        }
        members.sort_by(|a, b| (a.date, a.created_at).cmp(&(b.date, b.created_at)));
        members
    }

    /// Applies a balance delta to an account. A missing account is a no-op;
    /// the processor validates existence before applying.
    pub fn apply_balance_delta(&mut self, id: AccountId, delta: Money) {
        if let Some(account) = self.accounts.get_mut(&id) {
            account.balance = account.balance.saturating_add(delta);
        }
    }

    /// Rejects a date that falls inside one of the owner's locked closures.
    ///
    /// # Errors
    ///
    /// Returns `PeriodLocked` with the locking closure's range.
    pub fn ensure_date_unlocked(&self, owner: UserId, date: NaiveDate) -> Result<(), LedgerError> {
        let closures = self.closures.get(&owner).map_or(&[][..], Vec::as_slice);
        ensure_unlocked(date, closures)
    }

    /// The first locked closure of the owner overlapping the given range.
    #[must_use]
    pub fn locked_overlap(
        &self,
        owner: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Option<&PeriodClosure> {
        self.closures
            .get(&owner)?
            .iter()
            .find(|c| c.blocks_writes() && c.overlaps(start, end))
    }

    /// Records a new closure for its owner.
    pub fn push_closure(&mut self, closure: PeriodClosure) {
        self.closures.entry(closure.owner).or_default().push(closure);
    }

    /// Mutable access to a closure by id.
    ///
    /// # Errors
    ///
    /// Returns `ClosureNotFound` when no closure carries the id.
    pub fn closure_mut(&mut self, id: PeriodClosureId) -> Result<&mut PeriodClosure, LedgerError> {
        self.closures
            .values_mut()
            .flatten()
            .find(|c| c.id == id)
            .ok_or(LedgerError::ClosureNotFound(id))
    }

    /// The owner's transactions dated inside the inclusive range, sorted by
    /// date then creation time.
    #[must_use]
    pub fn transactions_in_period(
        &self,
        owner: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<&Transaction> {
        let mut in_period: Vec<&Transaction> = self
            .transactions
            .values()
            .filter(|t| t.owner == owner && t.date >= start && t.date <= end)
            .collect();
        in_period.sort_by(|a, b| (a.date, a.created_at).cmp(&(b.date, b.created_at)));
        in_period
    }

    /// All transactions on one account.
    #[must_use]
    pub fn transactions_for_account(&self, account_id: AccountId) -> Vec<&Transaction> {
        self.transactions
            .values()
            .filter(|t| t.account_id == account_id)
            .collect()
    }
}
