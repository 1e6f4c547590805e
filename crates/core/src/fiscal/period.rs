//! Period closure types.

use centavo_shared::types::{PeriodClosureId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Granularity of a period closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClosureType {
    /// One calendar month.
    Monthly,
    /// A full year.
    Annual,
}

/// An administrative lock over a date range.
///
/// A closure references transactions but never owns or mutates them; it only
/// blocks future writes dated inside the range while `is_locked` holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodClosure {
    /// Unique identifier.
    pub id: PeriodClosureId,
    /// The user who owns the closed period.
    pub owner: UserId,
    /// First locked date (inclusive).
    pub period_start: NaiveDate,
    /// Last locked date (inclusive).
    pub period_end: NaiveDate,
    /// Granularity.
    pub closure_type: ClosureType,
    /// Whether the lock is currently in force.
    pub is_locked: bool,
    /// When the period was closed.
    pub closed_at: DateTime<Utc>,
    /// Who closed it.
    pub closed_by: UserId,
    /// When the lock was lifted, if ever.
    pub unlocked_at: Option<DateTime<Utc>>,
    /// Who lifted it.
    pub unlocked_by: Option<UserId>,
}

impl PeriodClosure {
    /// Returns true if the given date falls within this closure's range.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.period_start && date <= self.period_end
    }

    /// Returns true if this closure currently blocks writes.
    #[must_use]
    pub fn blocks_writes(&self) -> bool {
        self.is_locked
    }

    /// Lifts the lock, recording who and when.
    pub fn unlock(&mut self, by: UserId, at: DateTime<Utc>) {
        self.is_locked = false;
        self.unlocked_at = Some(at);
        self.unlocked_by = Some(by);
    }

    /// Returns true if the two date ranges intersect.
    #[must_use]
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.period_start <= end && start <= self.period_end
    }
}
