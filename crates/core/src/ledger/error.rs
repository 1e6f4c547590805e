//! Ledger error types for validation, business-rule, and state errors.
//!
//! One taxonomy covers the whole engine: validation errors (rejected before
//! any write), business-rule rejections, transient concurrency conflicts
//! (retried with backoff), and fatal internal-consistency failures.

use centavo_shared::types::{AccountId, Money, PeriodClosureId, TransactionId};
use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Description must not be empty.
    #[error("Description must not be empty")]
    EmptyDescription,

    /// Description exceeds the maximum length.
    #[error("Description exceeds maximum length of {max} characters")]
    DescriptionTooLong {
        /// The maximum allowed length.
        max: usize,
    },

    /// Amount cannot be zero.
    #[error("Amount cannot be zero")]
    ZeroAmount,

    /// Amount cannot be negative.
    #[error("Amount cannot be negative")]
    NegativeAmount,

    /// Amount exceeds the maximum supported value.
    #[error("Amount exceeds maximum of {max}")]
    AmountTooLarge {
        /// The maximum allowed amount.
        max: Money,
    },

    /// Day of month must be within 1..=31.
    #[error("Invalid day of month: {0}")]
    InvalidDayOfMonth(u8),

    /// Installment count out of supported bounds.
    #[error("Invalid installment count: {0}")]
    InvalidInstallmentCount(u32),

    /// Operation requires a credit account.
    #[error("Account {0} is not a credit account")]
    NotACreditAccount(AccountId),

    /// Credit account has no closing/due day configured.
    #[error("Credit account {0} has no billing cycle configuration")]
    MissingBillingConfig(AccountId),

    /// Period range is inverted or empty.
    #[error("Invalid period range: {start} to {end}")]
    InvalidPeriodRange {
        /// Start of the period.
        start: NaiveDate,
        /// End of the period.
        end: NaiveDate,
    },

    /// A locked closure already covers part of the requested period.
    #[error("Period overlaps an existing locked closure ({start} to {end})")]
    ClosureOverlap {
        /// Start of the existing closure.
        start: NaiveDate,
        /// End of the existing closure.
        end: NaiveDate,
    },

    // ========== Not Found ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// Period closure not found.
    #[error("Period closure not found: {0}")]
    ClosureNotFound(PeriodClosureId),

    // ========== Business Rules ==========
    /// The effective date falls inside a locked accounting period.
    #[error("Date {date} falls inside locked period {period_start} to {period_end}")]
    PeriodLocked {
        /// The rejected date.
        date: NaiveDate,
        /// Start of the locked period.
        period_start: NaiveDate,
        /// End of the locked period.
        period_end: NaiveDate,
    },

    /// Source and destination accounts must differ.
    #[error("Source and destination accounts must differ")]
    SameAccount,

    /// The debit account cannot cover the requested amount.
    #[error("Insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds {
        /// Funds available, including any limit headroom.
        available: Money,
        /// Amount requested.
        requested: Money,
    },

    // ========== Concurrency ==========
    /// Transient conflict on the store; safe to retry.
    #[error("Concurrent modification detected, please retry")]
    ConcurrencyConflict,

    // ========== Internal Consistency ==========
    /// Journal entries for a transaction do not balance. Fatal: indicates a
    /// derivation bug, never a user error.
    #[error(
        "Internal consistency failure for transaction {transaction_id}: \
         debits {debits} != credits {credits}"
    )]
    InternalConsistency {
        /// The offending transaction.
        transaction_id: TransactionId,
        /// Total debits derived.
        debits: Money,
        /// Total credits derived.
        credits: Money,
    },

    /// A period cannot be closed while it contains unbalanced transactions.
    #[error(
        "Cannot close period {period_start} to {period_end}: \
         {} transaction(s) lack balanced journal entries", offenders.len()
    )]
    UnbalancedPeriod {
        /// Start of the period.
        period_start: NaiveDate,
        /// End of the period.
        period_end: NaiveDate,
        /// Transactions with missing or unbalanced entries.
        offenders: Vec<TransactionId>,
    },
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyDescription => "EMPTY_DESCRIPTION",
            Self::DescriptionTooLong { .. } => "DESCRIPTION_TOO_LONG",
            Self::ZeroAmount => "ZERO_AMOUNT",
            Self::NegativeAmount => "NEGATIVE_AMOUNT",
            Self::AmountTooLarge { .. } => "AMOUNT_TOO_LARGE",
            Self::InvalidDayOfMonth(_) => "INVALID_DAY_OF_MONTH",
            Self::InvalidInstallmentCount(_) => "INVALID_INSTALLMENT_COUNT",
            Self::NotACreditAccount(_) => "NOT_A_CREDIT_ACCOUNT",
            Self::MissingBillingConfig(_) => "MISSING_BILLING_CONFIG",
            Self::InvalidPeriodRange { .. } => "INVALID_PERIOD_RANGE",
            Self::ClosureOverlap { .. } => "CLOSURE_OVERLAP",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::ClosureNotFound(_) => "CLOSURE_NOT_FOUND",
            Self::PeriodLocked { .. } => "PERIOD_LOCKED",
            Self::SameAccount => "SAME_ACCOUNT",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::ConcurrencyConflict => "CONCURRENCY_CONFLICT",
            Self::InternalConsistency { .. } => "INTERNAL_CONSISTENCY",
            Self::UnbalancedPeriod { .. } => "UNBALANCED_PERIOD",
        }
    }

    /// Returns true if this error is transient and safe to retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict)
    }

    /// Returns true if this error indicates an internal bug rather than bad
    /// input or a business-rule rejection.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::InternalConsistency { .. })
    }
}
