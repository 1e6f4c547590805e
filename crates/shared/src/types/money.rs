//! Money as integer minor currency units.
//!
//! CRITICAL: Never use floating-point for money calculations. All amounts are
//! `i64` cents; arithmetic is checked so overflow surfaces instead of
//! wrapping silently.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A monetary amount in minor currency units (cents).
///
/// Positive and negative values are both representable; credit-card debt is a
/// negative balance.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

/// Error parsing a money string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseMoneyError {
    /// The string is not a valid decimal amount.
    #[error("Invalid money amount: {0}")]
    Invalid(String),
    /// More than two fractional digits.
    #[error("Money supports at most two fractional digits: {0}")]
    TooPrecise(String),
}

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Creates an amount from minor units (cents).
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the amount in minor units (cents).
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns true if the amount is strictly positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns true if the amount is strictly negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Checked addition.
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Checked subtraction.
    #[must_use]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Saturating addition, for applying deltas whose inputs were already
    /// bounds-checked.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Negation.
    #[must_use]
    pub const fn negated(self) -> Self {
        Self(-self.0)
    }

    /// Absolute value.
    #[must_use]
    pub const fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// Saturating sum of an iterator of amounts.
    #[must_use]
    pub fn sum<I: IntoIterator<Item = Self>>(amounts: I) -> Self {
        amounts
            .into_iter()
            .fold(Self::ZERO, |acc, m| Self(acc.0.saturating_add(m.0)))
    }
}

impl std::ops::Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        self.negated()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl std::str::FromStr for Money {
    type Err = ParseMoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (sign, body) = match s.strip_prefix('-') {
            Some(rest) => (-1i64, rest),
            None => (1i64, s),
        };

        let (whole, frac) = match body.split_once('.') {
            Some((w, f)) => (w, f),
            None => (body, ""),
        };

        if frac.len() > 2 {
            return Err(ParseMoneyError::TooPrecise(s.to_string()));
        }
        if whole.is_empty()
            || !whole.bytes().all(|b| b.is_ascii_digit())
            || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(ParseMoneyError::Invalid(s.to_string()));
        }

        let units: i64 = whole
            .parse()
            .map_err(|_| ParseMoneyError::Invalid(s.to_string()))?;
        let cents: i64 = if frac.is_empty() {
            0
        } else {
            let padded = format!("{frac:0<2}");
            padded
                .parse()
                .map_err(|_| ParseMoneyError::Invalid(s.to_string()))?
        };

        units
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .and_then(|v| v.checked_mul(sign))
            .map(Self)
            .ok_or_else(|| ParseMoneyError::Invalid(s.to_string()))
    }
}
