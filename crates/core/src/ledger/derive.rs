//! Journal entry derivation.
//!
//! Maps a completed transaction onto its balanced debit/credit pair:
//!
//! - income -> debit asset (or liability on a credit card), credit revenue
//! - expense -> debit expense, credit asset
//! - credit-card expense -> debit expense, credit liability
//! - transfer / bill payment -> debit destination, credit source, both lines
//!   attached to the outgoing (primary) transaction
//!
//! Pending transactions derive no entries; settlement is what creates them.

use centavo_shared::types::AccountId;

use super::account::Account;
use super::entry::{EntryType, JournalAccount, JournalEntry};
use super::error::LedgerError;
use super::transaction::{Transaction, TransactionType};

/// The journal side a real account participates on.
fn real_account_side(account: &Account) -> JournalAccount {
    if account.account_type.is_credit() {
        JournalAccount::Liability(account.id)
    } else {
        JournalAccount::Asset(account.id)
    }
}

/// Derives the journal entries for a transaction.
///
/// `account` is the transaction's own account. `to_account` must be supplied
/// for the outgoing half of a transfer. The incoming half of a linked pair
/// derives no entries of its own; the primary carries both lines so the
/// per-transaction and per-operation balance invariants both hold.
///
/// # Errors
///
/// Returns `AccountNotFound` when a transfer's destination account is not
/// supplied.
pub fn derive_entries(
    txn: &Transaction,
    account: &Account,
    to_account: Option<&Account>,
) -> Result<Vec<JournalEntry>, LedgerError> {
    if !txn.status.affects_balance() {
        return Ok(Vec::new());
    }

    let entries = match txn.transaction_type {
        TransactionType::Income => vec![
            JournalEntry::new(
                txn.id,
                real_account_side(account),
                EntryType::Debit,
                txn.amount,
            ),
            JournalEntry::new(
                txn.id,
                JournalAccount::Revenue(txn.category_id),
                EntryType::Credit,
                txn.amount,
            ),
        ],
        TransactionType::Expense => vec![
            JournalEntry::new(
                txn.id,
                JournalAccount::Expense(txn.category_id),
                EntryType::Debit,
                txn.amount,
            ),
            JournalEntry::new(
                txn.id,
                real_account_side(account),
                EntryType::Credit,
                txn.amount,
            ),
        ],
        TransactionType::Transfer => match txn.to_account_id {
            Some(to_id) => {
                let dest = to_account
                    .filter(|a| a.id == to_id)
                    .ok_or(LedgerError::AccountNotFound(to_id))?;
                vec![
                    JournalEntry::new(txn.id, real_account_side(dest), EntryType::Debit, txn.amount),
                    JournalEntry::new(
                        txn.id,
                        real_account_side(account),
                        EntryType::Credit,
                        txn.amount,
                    ),
                ]
            }
            // Incoming half: the primary owns the journal lines.
            None => Vec::new(),
        },
    };

    Ok(entries)
}

/// Convenience lookup key: the real accounts a derived entry set touches.
#[must_use]
pub fn touched_accounts(entries: &[JournalEntry]) -> Vec<AccountId> {
    entries
        .iter()
        .filter_map(|e| match e.account {
            JournalAccount::Asset(id) | JournalAccount::Liability(id) => Some(id),
            JournalAccount::Revenue(_) | JournalAccount::Expense(_) => None,
        })
        .collect()
}
