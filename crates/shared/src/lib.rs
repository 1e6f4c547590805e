//! Shared types and configuration for Centavo.
//!
//! This crate provides common types used across all other crates:
//! - Money as integer minor currency units (cents)
//! - Typed IDs for type-safe entity references
//! - Configuration management for retry, sync, and store tuning

pub mod config;
pub mod types;

pub use config::AppConfig;
