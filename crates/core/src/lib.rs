//! Core ledger logic for Centavo.
//!
//! This crate contains pure business logic with ZERO async or storage
//! dependencies. All domain types, validation rules, and calculations live
//! here.
//!
//! # Modules
//!
//! - `ledger` - Accounts, transactions, journal derivation, double-entry validation
//! - `billing` - Credit-card billing cycles and invoice month placement
//! - `chain` - Installment/recurring chain scope resolution
//! - `fiscal` - Period closures and the period lock guard

pub mod billing;
pub mod chain;
pub mod fiscal;
pub mod ledger;
