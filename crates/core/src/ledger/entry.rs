//! Journal entry domain types.

use centavo_shared::types::{AccountId, CategoryId, JournalEntryId, Money, TransactionId};
use serde::{Deserialize, Serialize};

/// Type of journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Debit entry (increases assets/expenses, decreases liabilities/revenue).
    Debit,
    /// Credit entry (decreases assets/expenses, increases liabilities/revenue).
    Credit,
}

/// The ledger account a journal line posts to.
///
/// Real accounts appear as assets or liabilities; income and expense
/// categories act as the revenue/expense side of the double entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "id")]
pub enum JournalAccount {
    /// An asset account (checking, savings, investment, meal voucher).
    Asset(AccountId),
    /// A liability account (credit card debt).
    Liability(AccountId),
    /// A revenue category.
    Revenue(CategoryId),
    /// An expense category.
    Expense(CategoryId),
}

/// One debit or credit line attached to a transaction.
///
/// Journal entries share their transaction's lifetime: deleting the
/// transaction deletes its entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique identifier.
    pub id: JournalEntryId,
    /// The transaction this entry belongs to.
    pub transaction_id: TransactionId,
    /// The ledger account affected.
    pub account: JournalAccount,
    /// Whether this is a debit or credit.
    pub entry_type: EntryType,
    /// Amount in minor currency units; always positive.
    pub amount: Money,
}

impl JournalEntry {
    /// Creates a new entry for a transaction.
    #[must_use]
    pub fn new(
        transaction_id: TransactionId,
        account: JournalAccount,
        entry_type: EntryType,
        amount: Money,
    ) -> Self {
        Self {
            id: JournalEntryId::new(),
            transaction_id,
            account,
            entry_type,
            amount,
        }
    }

    /// Returns the signed amount (positive for debit, negative for credit).
    #[must_use]
    pub fn signed_amount(&self) -> Money {
        match self.entry_type {
            EntryType::Debit => self.amount,
            EntryType::Credit => self.amount.negated(),
        }
    }
}
