//! Accounting period closures and the period lock guard.

pub mod guard;
pub mod period;

pub use guard::{check_period_lock, ensure_unlocked, LockCheck};
pub use period::{ClosureType, PeriodClosure};
