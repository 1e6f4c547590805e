//! Scope resolution for edits and deletes across transaction chains.
//!
//! A chain is either an installment group or a recurring "fixed" series. The
//! chain's root carries `parent_transaction_id = None`; children point at the
//! root. Resolution is a pure filter over the chain members the store fetched
//! through its `parent_transaction_id` index.

use serde::{Deserialize, Serialize};

use crate::ledger::Transaction;
use centavo_shared::types::TransactionId;

/// The breadth of an edit or delete across a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EditScope {
    /// Only the named transaction.
    Current,
    /// The named transaction and every sibling dated on or after it.
    CurrentAndRemaining,
    /// Every member of the chain, including the root.
    All,
}

/// Resolves which transactions an operation affects.
///
/// `chain_members` must contain every member of the target's chain (root and
/// children, the target included). A target with no chain metadata resolves
/// to itself for any scope. Order follows `chain_members`, which the store
/// supplies date-ascending.
#[must_use]
pub fn resolve_scope(
    target: &Transaction,
    chain_members: &[Transaction],
    scope: EditScope,
) -> Vec<TransactionId> {
    if scope == EditScope::Current || !target.is_chain_member() {
        return vec![target.id];
    }

    let root = target.chain_root();
    let in_chain =
        |t: &Transaction| t.id == root || t.parent_transaction_id == Some(root) || t.id == target.id;

    match scope {
        EditScope::Current => unreachable!(),
        EditScope::CurrentAndRemaining => chain_members
            .iter()
            .filter(|t| in_chain(t) && t.date >= target.date)
            .map(|t| t.id)
            .collect(),
        EditScope::All => chain_members
            .iter()
            .filter(|t| in_chain(t))
            .map(|t| t.id)
            .collect(),
    }
}
