//! Billing cycle calculations.
//!
//! The rule set, applied consistently everywhere billing status is derived:
//!
//! - a purchase dated on or before the closing day of its calendar month
//!   belongs to the invoice that closes that month; after the closing day it
//!   rolls to the next month's invoice
//! - the invoice's due date always falls in the invoice's own labeled month
//! - the closing date falls in the prior calendar month when
//!   `due_day <= closing_day` (card closes before the next due date),
//!   otherwise in the same month
//! - day numbers are clamped to the target month's length (a day-31 close in
//!   February closes on the 28th/29th)

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use centavo_shared::types::Money;

/// The calendar month a credit-card purchase is attributed to.
///
/// Renders and parses as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InvoiceMonth {
    /// Calendar year.
    pub year: i32,
    /// Calendar month (1..=12).
    pub month: u32,
}

/// Error parsing an invoice month string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid invoice month (expected YYYY-MM): {0}")]
pub struct ParseInvoiceMonthError(String);

impl InvoiceMonth {
    /// Creates an invoice month, normalizing out-of-range months.
    #[must_use]
    pub fn new(year: i32, month: u32) -> Self {
        debug_assert!((1..=12).contains(&month));
        Self { year, month }
    }

    /// The invoice month containing a date.
    #[must_use]
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The following month.
    #[must_use]
    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// The preceding month.
    #[must_use]
    pub fn prev(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// First day of the month.
    #[must_use]
    pub fn first_day(self) -> NaiveDate {
        // Month is always 1..=12 by construction.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Number of days in the month.
    #[must_use]
    pub fn days(self) -> u32 {
        let next = self.next();
        next.first_day()
            .signed_duration_since(self.first_day())
            .num_days()
            .unsigned_abs() as u32
    }

    /// The given day-of-month clamped to this month's length.
    #[must_use]
    pub fn clamped_day(self, day: u8) -> NaiveDate {
        let day = u32::from(day).min(self.days()).max(1);
        NaiveDate::from_ymd_opt(self.year, self.month, day).unwrap_or(NaiveDate::MIN)
    }
}

impl std::fmt::Display for InvoiceMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl std::str::FromStr for InvoiceMonth {
    type Err = ParseInvoiceMonthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseInvoiceMonthError(s.to_string());
        let (y, m) = s.split_once('-').ok_or_else(err)?;
        if y.len() != 4 || m.len() != 2 {
            return Err(err());
        }
        let year: i32 = y.parse().map_err(|_| err())?;
        let month: u32 = m.parse().map_err(|_| err())?;
        if !(1..=12).contains(&month) {
            return Err(err());
        }
        Ok(Self { year, month })
    }
}

impl TryFrom<String> for InvoiceMonth {
    type Error = ParseInvoiceMonthError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<InvoiceMonth> for String {
    fn from(m: InvoiceMonth) -> Self {
        m.to_string()
    }
}

/// Derived status of a credit-card bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    /// Still accumulating purchases.
    Open,
    /// Past its closing date and awaiting payment.
    Closed,
    /// Cumulative payments meet or exceed the total due.
    Paid,
}

/// Maps a purchase date onto its invoice month.
///
/// On or before the (month-length-clamped) closing day: the invoice that
/// closes this month. After: next month's invoice.
#[must_use]
pub fn invoice_month_for(purchase_date: NaiveDate, closing_day: u8) -> InvoiceMonth {
    let month = InvoiceMonth::containing(purchase_date);
    let effective_closing = u32::from(closing_day).min(month.days());
    if purchase_date.day() <= effective_closing {
        month
    } else {
        month.next()
    }
}

/// The date an invoice stops accumulating purchases.
///
/// Falls in the month prior to the invoice's labeled month when
/// `due_day <= closing_day`, otherwise in the labeled month itself.
#[must_use]
pub fn closing_date(invoice: InvoiceMonth, closing_day: u8, due_day: u8) -> NaiveDate {
    let closing_month = if due_day <= closing_day {
        invoice.prev()
    } else {
        invoice
    };
    closing_month.clamped_day(closing_day)
}

/// The date an invoice's payment is due; always inside the labeled month.
#[must_use]
pub fn due_date(invoice: InvoiceMonth, due_day: u8) -> NaiveDate {
    invoice.clamped_day(due_day)
}

/// Derives a bill's status from its totals and the current date.
///
/// Paid once cumulative payments meet or exceed the total due (no tolerance);
/// closed once today has passed the computed closing date; otherwise open.
#[must_use]
pub fn bill_status(
    invoice: InvoiceMonth,
    closing_day: u8,
    due_day: u8,
    today: NaiveDate,
    total_due: Money,
    total_paid: Money,
) -> BillStatus {
    if total_due.is_positive() && total_paid >= total_due {
        return BillStatus::Paid;
    }
    if today > closing_date(invoice, closing_day, due_day) {
        BillStatus::Closed
    } else {
        BillStatus::Open
    }
}
