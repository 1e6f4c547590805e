//! Transaction aggregate.

use centavo_shared::types::{AccountId, CategoryId, Money, TransactionId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::billing::InvoiceMonth;

/// Transaction type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money flowing into an account.
    Income,
    /// Money flowing out of an account.
    Expense,
    /// Movement between two accounts (one outgoing and one incoming half).
    Transfer,
}

/// Transaction lifecycle status.
///
/// Only `Completed` transactions carry journal entries and affect balances;
/// `Pending` transactions are recorded but balance-inert until settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Recorded but not yet settled.
    Pending,
    /// Settled; balance applied and journal entries exist.
    Completed,
}

impl TransactionStatus {
    /// Returns true if the transaction affects balances.
    #[must_use]
    pub fn affects_balance(self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// A categorized ledger transaction.
///
/// Transfers and bill payments are pairs of linked transactions: the outgoing
/// half carries `to_account_id` and owns the journal entries for the whole
/// operation; the incoming half points back via `linked_transaction_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier.
    pub id: TransactionId,
    /// The user who owns this transaction.
    pub owner: UserId,
    /// The account this transaction posts against.
    pub account_id: AccountId,
    /// Destination account (outgoing half of a transfer only).
    pub to_account_id: Option<AccountId>,
    /// Category for reporting and journal derivation.
    pub category_id: CategoryId,
    /// Transaction type.
    pub transaction_type: TransactionType,
    /// Amount in minor currency units; always positive, sign implied by type.
    pub amount: Money,
    /// Effective date.
    pub date: NaiveDate,
    /// Free-text description.
    pub description: String,
    /// Lifecycle status.
    pub status: TransactionStatus,
    /// True for members of a recurring "fixed" series.
    pub is_fixed: bool,
    /// Chain parent; `None` on the chain root.
    pub parent_transaction_id: Option<TransactionId>,
    /// Total installment count for installment chains.
    pub installments: Option<u32>,
    /// Position within the installment chain (1-based).
    pub current_installment: Option<u32>,
    /// Invoice month for credit-card placement.
    pub invoice_month: Option<InvoiceMonth>,
    /// True when the invoice month was supplied by the caller rather than
    /// computed from the billing cycle.
    pub invoice_month_overridden: bool,
    /// The other half of a transfer or bill payment.
    pub linked_transaction_id: Option<TransactionId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Signed effect of this transaction on its own account's balance.
    ///
    /// Zero while pending. Income and the incoming half of a transfer add;
    /// expense and the outgoing half subtract.
    #[must_use]
    pub fn balance_effect(&self) -> Money {
        if !self.status.affects_balance() {
            return Money::ZERO;
        }
        match self.transaction_type {
            TransactionType::Income => self.amount,
            TransactionType::Expense => self.amount.negated(),
            TransactionType::Transfer => {
                if self.to_account_id.is_some() {
                    self.amount.negated()
                } else {
                    self.amount
                }
            }
        }
    }

    /// Returns true if this transaction belongs to an installment or
    /// recurring chain.
    #[must_use]
    pub fn is_chain_member(&self) -> bool {
        self.is_fixed || self.parent_transaction_id.is_some() || self.installments.is_some()
    }

    /// The root transaction of this chain: the parent when one exists,
    /// otherwise the transaction itself.
    #[must_use]
    pub fn chain_root(&self) -> TransactionId {
        self.parent_transaction_id.unwrap_or(self.id)
    }

    /// Returns true for the primary (entry-owning) half of a linked pair, or
    /// for any unlinked transaction.
    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.to_account_id.is_some() || self.linked_transaction_id.is_none()
    }
}
