//! Double-entry ledger logic.
//!
//! This module implements the core ledger functionality:
//! - Accounts and transactions
//! - Journal entries (debits and credits)
//! - Journal derivation from transactions
//! - Double-entry balance validation
//! - Error types for ledger operations

pub mod account;
pub mod derive;
pub mod entry;
pub mod error;
pub mod transaction;
pub mod validation;

#[cfg(test)]
mod derive_props;

pub use account::{Account, AccountType};
pub use derive::{derive_entries, touched_accounts};
pub use entry::{EntryType, JournalAccount, JournalEntry};
pub use error::LedgerError;
pub use transaction::{Transaction, TransactionStatus, TransactionType};
pub use validation::{check_entries, ensure_balanced, BalanceCheck};
