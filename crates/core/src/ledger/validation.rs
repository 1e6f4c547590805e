//! Double-entry balance validation.

use centavo_shared::types::{Money, TransactionId};
use serde::{Deserialize, Serialize};

use super::entry::{EntryType, JournalEntry};
use super::error::LedgerError;

/// Result of checking a set of journal entries against the double-entry
/// invariant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceCheck {
    /// True when debits equal credits.
    pub valid: bool,
    /// Sum of all debit amounts.
    pub total_debits: Money,
    /// Sum of all credit amounts.
    pub total_credits: Money,
    /// `total_debits - total_credits`; zero when valid.
    pub difference: Money,
}

impl BalanceCheck {
    /// Builds a check result from debit/credit totals.
    #[must_use]
    pub fn new(total_debits: Money, total_credits: Money) -> Self {
        let difference = total_debits
            .checked_sub(total_credits)
            .unwrap_or(Money::from_cents(i64::MAX));
        Self {
            valid: difference.is_zero(),
            total_debits,
            total_credits,
            difference,
        }
    }
}

/// Sums a set of journal entries by entry type and checks the debit/credit
/// invariant. Pure; an empty set is trivially balanced.
#[must_use]
pub fn check_entries(entries: &[JournalEntry]) -> BalanceCheck {
    let total_debits = Money::sum(
        entries
            .iter()
            .filter(|e| e.entry_type == EntryType::Debit)
            .map(|e| e.amount),
    );
    let total_credits = Money::sum(
        entries
            .iter()
            .filter(|e| e.entry_type == EntryType::Credit)
            .map(|e| e.amount),
    );
    BalanceCheck::new(total_debits, total_credits)
}

/// Pre-commit assertion: a non-zero difference is a fatal derivation bug and
/// must abort the enclosing write.
///
/// # Errors
///
/// Returns `InternalConsistency` with the computed totals when the entries do
/// not balance.
pub fn ensure_balanced(
    transaction_id: TransactionId,
    entries: &[JournalEntry],
) -> Result<BalanceCheck, LedgerError> {
    let check = check_entries(entries);
    if check.valid {
        Ok(check)
    } else {
        Err(LedgerError::InternalConsistency {
            transaction_id,
            debits: check.total_debits,
            credits: check.total_credits,
        })
    }
}
