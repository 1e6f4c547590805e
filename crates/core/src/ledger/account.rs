//! Account domain types.

use centavo_shared::types::{AccountId, Money, UserId};
use serde::{Deserialize, Serialize};

use super::error::LedgerError;

/// Account type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccountType {
    /// Checking account.
    Checking,
    /// Savings account.
    Savings,
    /// Credit card account. Balance runs negative while debt is outstanding.
    Credit,
    /// Investment account.
    Investment,
    /// Meal voucher card.
    MealVoucher,
}

impl AccountType {
    /// Returns true for credit-card accounts.
    #[must_use]
    pub fn is_credit(self) -> bool {
        matches!(self, Self::Credit)
    }
}

/// An account owned by a single user.
///
/// `balance` is always the sum of all completed transactions affecting the
/// account; the store maintains it by cumulative deltas, never by overwrite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// The user who owns this account.
    pub owner: UserId,
    /// Display name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Current balance in minor currency units.
    pub balance: Money,
    /// Optional spending limit (credit limit, overdraft limit).
    pub limit_amount: Option<Money>,
    /// Day of month the credit-card invoice closes (credit only, 1..=31).
    pub closing_day: Option<u8>,
    /// Day of month the credit-card invoice is due (credit only, 1..=31).
    pub due_day: Option<u8>,
}

impl Account {
    /// Validates the account's billing configuration.
    ///
    /// Credit accounts must carry valid closing/due days; other account types
    /// must not carry them.
    pub fn validate(&self) -> Result<(), LedgerError> {
        match (self.account_type, self.closing_day, self.due_day) {
            (AccountType::Credit, Some(closing), Some(due)) => {
                for day in [closing, due] {
                    if !(1..=31).contains(&day) {
                        return Err(LedgerError::InvalidDayOfMonth(day));
                    }
                }
                Ok(())
            }
            (AccountType::Credit, _, _) => Err(LedgerError::MissingBillingConfig(self.id)),
            (_, None, None) => Ok(()),
            (_, _, _) => Err(LedgerError::NotACreditAccount(self.id)),
        }
    }

    /// Returns the billing cycle configuration (closing day, due day).
    ///
    /// # Errors
    ///
    /// Returns `MissingBillingConfig` when the account has no cycle
    /// configured, `NotACreditAccount` when it is not a credit account.
    pub fn billing_cycle(&self) -> Result<(u8, u8), LedgerError> {
        if !self.account_type.is_credit() {
            return Err(LedgerError::NotACreditAccount(self.id));
        }
        match (self.closing_day, self.due_day) {
            (Some(closing), Some(due)) => Ok((closing, due)),
            _ => Err(LedgerError::MissingBillingConfig(self.id)),
        }
    }

    /// Funds available for outgoing payments: the balance plus any limit
    /// headroom that has not yet been consumed.
    #[must_use]
    pub fn available_funds(&self) -> Money {
        match self.limit_amount {
            Some(limit) => self
                .balance
                .checked_add(limit)
                .unwrap_or(Money::from_cents(i64::MAX)),
            None => self.balance,
        }
    }
}
