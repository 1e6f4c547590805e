//! Installment and recurring chain handling.

pub mod scope;

pub use scope::{resolve_scope, EditScope};
