//! Period lock guard.
//!
//! Every processor operation runs this for every date it would write or
//! rewrite: creation dates, the old date an edit vacates, the new date it
//! occupies, deletion dates, transfer and payment dates.

use chrono::NaiveDate;

use super::period::PeriodClosure;
use crate::ledger::LedgerError;

/// Result of checking a date against the owner's period closures.
#[derive(Debug, Clone)]
pub struct LockCheck<'a> {
    /// True when a still-locked closure covers the date.
    pub locked: bool,
    /// The closure that locks the date, when one does.
    pub closure: Option<&'a PeriodClosure>,
}

/// Checks whether a date falls inside any still-locked closure.
#[must_use]
pub fn check_period_lock<'a>(date: NaiveDate, closures: &'a [PeriodClosure]) -> LockCheck<'a> {
    let closure = closures
        .iter()
        .find(|c| c.blocks_writes() && c.contains_date(date));
    LockCheck {
        locked: closure.is_some(),
        closure,
    }
}

/// Guard form of [`check_period_lock`].
///
/// # Errors
///
/// Returns `PeriodLocked` with the locking closure's range when the date is
/// inside a locked period.
pub fn ensure_unlocked(date: NaiveDate, closures: &[PeriodClosure]) -> Result<(), LedgerError> {
    match check_period_lock(date, closures).closure {
        Some(c) => Err(LedgerError::PeriodLocked {
            date,
            period_start: c.period_start,
            period_end: c.period_end,
        }),
        None => Ok(()),
    }
}
