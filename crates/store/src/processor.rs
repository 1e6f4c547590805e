//! The ledger transaction processor.
//!
//! Every mutation runs as one serializable unit of work: validate the input
//! shape, acquire the store's write guard, re-check every precondition under
//! the guard, then apply infallibly. A failed operation leaves state
//! untouched. Transient lock-wait conflicts retry with backoff; operations
//! carrying an idempotency key return their recorded outcome on re-apply
//! instead of running twice.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use centavo_core::billing::{self, invoice_month_for, BillStatus, InvoiceMonth};
use centavo_core::chain::{resolve_scope, EditScope};
use centavo_core::fiscal::{ClosureType, PeriodClosure};
use centavo_core::ledger::{
    check_entries, derive_entries, ensure_balanced, Account, BalanceCheck, JournalEntry,
    LedgerError, Transaction, TransactionStatus, TransactionType,
};
use centavo_shared::config::AppConfig;
use centavo_shared::types::{
    AccountId, CategoryId, IdempotencyKey, Money, PeriodClosureId, TransactionId, UserId,
};

use crate::retry::{with_retry, RetryPolicy};
use crate::state::StoreState;
use crate::store::LedgerStore;

/// Maximum description length, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 255;

/// Maximum supported amount: one billion currency units.
pub const MAX_AMOUNT: Money = Money::from_cents(100_000_000_000);

/// Upper bound on generated chain length.
pub const MAX_CHAIN_LEN: u32 = 360;

/// Transaction kinds creatable directly; transfers and bill payments go
/// through their own operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreateKind {
    /// Money coming in.
    Income,
    /// Money going out.
    Expense,
}

impl From<CreateKind> for TransactionType {
    fn from(kind: CreateKind) -> Self {
        match kind {
            CreateKind::Income => Self::Income,
            CreateKind::Expense => Self::Expense,
        }
    }
}

/// Requested repetition when creating a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum Recurrence {
    /// A purchase split into `count` monthly installments.
    Installments {
        /// Total number of installments, 2..=360.
        count: u32,
    },
    /// A fixed recurring transaction repeated monthly.
    Fixed {
        /// Number of occurrences to generate, 1..=360.
        occurrences: u32,
    },
}

/// Input for creating one transaction or a whole chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTransactionInput {
    /// The ledger owner.
    pub owner: UserId,
    /// The account the money moves on.
    pub account_id: AccountId,
    /// Category for journal classification.
    pub category_id: CategoryId,
    /// Income or expense.
    pub kind: CreateKind,
    /// Amount per transaction, strictly positive.
    pub amount: Money,
    /// Effective date of the first (or only) transaction.
    pub date: NaiveDate,
    /// Human-readable description.
    pub description: String,
    /// Pending transactions carry no journal entries and move no balance.
    pub status: TransactionStatus,
    /// Optional chain generation.
    pub recurrence: Option<Recurrence>,
    /// Explicit invoice month for the first transaction on a credit account.
    pub invoice_month: Option<InvoiceMonth>,
    /// Key for at-most-once application during offline replay.
    pub idempotency_key: Option<IdempotencyKey>,
}

impl CreateTransactionInput {
    /// Validates the input shape before any store access.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed descriptions, non-positive or
    /// oversized amounts, or out-of-bounds chain lengths.
    pub fn validate(&self) -> Result<(), LedgerError> {
        validate_description(&self.description)?;
        validate_amount(self.amount)?;
        match self.recurrence {
            Some(Recurrence::Installments { count }) if !(2..=MAX_CHAIN_LEN).contains(&count) => {
                Err(LedgerError::InvalidInstallmentCount(count))
            }
            Some(Recurrence::Fixed { occurrences }) if !(1..=MAX_CHAIN_LEN).contains(&occurrences) => {
                Err(LedgerError::InvalidInstallmentCount(occurrences))
            }
            _ => Ok(()),
        }
    }
}

/// Field updates for an edit. `None` fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionUpdate {
    /// New description, applied across the scope.
    pub description: Option<String>,
    /// New amount, applied across the scope.
    pub amount: Option<Money>,
    /// New category, applied across the scope.
    pub category_id: Option<CategoryId>,
    /// New date, applied to the named transaction only.
    pub date: Option<NaiveDate>,
    /// New status: pending -> completed settles, completed -> pending
    /// reverses.
    pub status: Option<TransactionStatus>,
    /// Pins the invoice month, marking it overridden.
    pub invoice_month: Option<InvoiceMonth>,
}

impl TransactionUpdate {
    /// Validates the populated fields.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed description or amount.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        if let Some(amount) = self.amount {
            validate_amount(amount)?;
        }
        Ok(())
    }
}

/// Input for moving money between two accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferInput {
    /// The ledger owner.
    pub owner: UserId,
    /// Source account.
    pub from_account_id: AccountId,
    /// Destination account.
    pub to_account_id: AccountId,
    /// Amount to move, strictly positive.
    pub amount: Money,
    /// Effective date.
    pub date: NaiveDate,
    /// Human-readable description.
    pub description: String,
    /// Category recorded on both halves.
    pub category_id: CategoryId,
    /// Key for at-most-once application during offline replay.
    pub idempotency_key: Option<IdempotencyKey>,
}

impl TransferInput {
    /// Validates the input shape before any store access.
    ///
    /// # Errors
    ///
    /// Returns `SameAccount` for a self-transfer, otherwise the usual
    /// description/amount validation errors.
    pub fn validate(&self) -> Result<(), LedgerError> {
        validate_description(&self.description)?;
        validate_amount(self.amount)?;
        if self.from_account_id == self.to_account_id {
            return Err(LedgerError::SameAccount);
        }
        Ok(())
    }
}

/// Input for paying down a credit-card bill from another account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayBillInput {
    /// The ledger owner.
    pub owner: UserId,
    /// The credit-card account being paid.
    pub credit_account_id: AccountId,
    /// The account the payment comes out of.
    pub from_account_id: AccountId,
    /// Payment amount, strictly positive.
    pub amount: Money,
    /// Payment date; decides the invoice month the payment lands on.
    pub date: NaiveDate,
    /// Human-readable description.
    pub description: String,
    /// Category recorded on both halves.
    pub category_id: CategoryId,
    /// Key for at-most-once application during offline replay.
    pub idempotency_key: Option<IdempotencyKey>,
}

impl PayBillInput {
    /// Validates the input shape before any store access.
    ///
    /// # Errors
    ///
    /// Returns `SameAccount` when the payment source is the card itself,
    /// otherwise the usual description/amount validation errors.
    pub fn validate(&self) -> Result<(), LedgerError> {
        validate_description(&self.description)?;
        validate_amount(self.amount)?;
        if self.from_account_id == self.credit_account_id {
            return Err(LedgerError::SameAccount);
        }
        Ok(())
    }
}

/// Input for closing an accounting period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosureInput {
    /// The ledger owner; also recorded as the closer.
    pub owner: UserId,
    /// First locked date (inclusive).
    pub period_start: NaiveDate,
    /// Last locked date (inclusive).
    pub period_end: NaiveDate,
    /// Granularity of the closure.
    pub closure_type: ClosureType,
}

impl ClosureInput {
    /// Validates the period range.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriodRange` when the range is inverted.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.period_start > self.period_end {
            return Err(LedgerError::InvalidPeriodRange {
                start: self.period_start,
                end: self.period_end,
            });
        }
        Ok(())
    }
}

/// Totals and derived status of one credit-card invoice.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceSummary {
    /// The credit-card account.
    pub account_id: AccountId,
    /// The invoice month.
    pub invoice: InvoiceMonth,
    /// Sum of completed expenses attributed to the invoice, less refunds.
    pub total_due: Money,
    /// Cumulative payments recorded against the invoice.
    pub total_paid: Money,
    /// Derived open/closed/paid status.
    pub status: BillStatus,
    /// The date the invoice stops accumulating purchases.
    pub closing_date: NaiveDate,
    /// The payment due date.
    pub due_date: NaiveDate,
}

/// The recorded result of a keyed operation, returned verbatim on replay.
#[derive(Debug, Clone)]
pub enum OperationOutcome {
    /// Transactions created, root first.
    Created(Vec<Transaction>),
    /// Transactions affected by an edit.
    Edited(Vec<TransactionId>),
    /// Number of transactions removed.
    Deleted(usize),
    /// A linked transfer or bill-payment pair.
    Transferred {
        /// The outgoing half, owner of the journal lines.
        outgoing: Transaction,
        /// The incoming half.
        incoming: Transaction,
    },
}

/// Runs every ledger mutation as an atomic, retryable unit of work.
#[derive(Debug, Clone)]
pub struct LedgerTransactionProcessor {
    store: Arc<LedgerStore>,
    retry: RetryPolicy,
}

struct PlannedWrite {
    account_id: AccountId,
    old_effect: Money,
    new: Transaction,
    entries: Vec<JournalEntry>,
}

impl LedgerTransactionProcessor {
    /// Creates a processor over a shared store.
    #[must_use]
    pub fn new(store: Arc<LedgerStore>, config: &AppConfig) -> Self {
        Self {
            store,
            retry: RetryPolicy::new(&config.retry),
        }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    /// Creates a transaction, or a whole chain when the input requests
    /// recurrence. Returns every created transaction, root first.
    ///
    /// # Errors
    ///
    /// Returns validation errors, `AccountNotFound`, `PeriodLocked` for any
    /// generated date inside a locked period, or `ConcurrencyConflict` once
    /// retries are exhausted.
    pub async fn create_transaction(
        &self,
        input: CreateTransactionInput,
    ) -> Result<Vec<Transaction>, LedgerError> {
        input.validate()?;
        with_retry(&self.retry, "create_transaction", || self.try_create(&input)).await
    }

    async fn try_create(
        &self,
        input: &CreateTransactionInput,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let mut state = self.store.write().await?;
        // Receipt check and recording stay inside the write-guard critical
        // section, so two callers sharing a key cannot both commit.
        if let Some(key) = input.idempotency_key {
            if let Some(OperationOutcome::Created(existing)) = self.store.receipt(key) {
                return Ok(existing);
            }
        }
        let account = state.account(input.account_id)?.clone();

        let count = match input.recurrence {
            None => 1,
            Some(Recurrence::Installments { count }) => count,
            Some(Recurrence::Fixed { occurrences }) => occurrences,
        };
        let is_fixed = matches!(input.recurrence, Some(Recurrence::Fixed { .. }));
        let installments_total = match input.recurrence {
            Some(Recurrence::Installments { count }) => Some(count),
            _ => None,
        };

        let now = Utc::now();
        let mut planned: Vec<(Transaction, Vec<JournalEntry>)> = Vec::new();
        let mut root_id: Option<TransactionId> = None;

        for step in 0..count {
            let date = input
                .date
                .checked_add_months(Months::new(step))
                .ok_or(LedgerError::InvalidInstallmentCount(count))?;
            state.ensure_date_unlocked(input.owner, date)?;

            let override_applies = step == 0 && input.invoice_month.is_some();
            // Credit accounts attribute every movement to an invoice; a
            // refund (income) offsets the invoice it lands on.
            let invoice_month = if account.account_type.is_credit() {
                if override_applies {
                    input.invoice_month
                } else {
                    let (closing_day, _) = account.billing_cycle()?;
                    Some(invoice_month_for(date, closing_day))
                }
            } else {
                None
            };

            let txn = Transaction {
                id: TransactionId::new(),
                owner: input.owner,
                account_id: input.account_id,
                to_account_id: None,
                category_id: input.category_id,
                transaction_type: input.kind.into(),
                amount: input.amount,
                date,
                description: input.description.clone(),
                status: input.status,
                is_fixed,
                parent_transaction_id: root_id,
                installments: installments_total,
                current_installment: installments_total.map(|_| step + 1),
                invoice_month,
                invoice_month_overridden: override_applies,
                linked_transaction_id: None,
                created_at: now,
                updated_at: now,
            };
            if step == 0 && count > 1 {
                root_id = Some(txn.id);
            }

            let entries = derive_entries(&txn, &account, None)?;
            guard_balanced(&txn, &entries)?;
            planned.push((txn, entries));
        }

        let delta = Money::sum(planned.iter().map(|(txn, _)| txn.balance_effect()));
        state.apply_balance_delta(input.account_id, delta);

        let created: Vec<Transaction> = planned.iter().map(|(txn, _)| txn.clone()).collect();
        for (txn, entries) in planned {
            state.insert_transaction(txn, entries);
        }
        if let Some(key) = input.idempotency_key {
            self.store
                .record_outcome(key, OperationOutcome::Created(created.clone()));
        }
        tracing::info!(account = %input.account_id, count = created.len(), "transactions committed");
        Ok(created)
    }

    /// Edits a transaction, fanning field updates across the chain scope.
    ///
    /// Each affected transaction is reversed and reapplied: its old balance
    /// effect is backed out, the updated version's effect applied, and its
    /// journal entries re-derived. The `date` field only ever moves the named
    /// transaction. Returns the affected transaction ids.
    ///
    /// # Errors
    ///
    /// Returns validation errors, `TransactionNotFound`, `PeriodLocked` for
    /// either the vacated or the newly occupied date, or
    /// `ConcurrencyConflict` once retries are exhausted.
    pub async fn edit_transaction(
        &self,
        id: TransactionId,
        updates: TransactionUpdate,
        scope: EditScope,
    ) -> Result<Vec<TransactionId>, LedgerError> {
        updates.validate()?;
        with_retry(&self.retry, "edit_transaction", || {
            self.try_edit(id, &updates, scope)
        })
        .await
    }

    async fn try_edit(
        &self,
        id: TransactionId,
        updates: &TransactionUpdate,
        scope: EditScope,
    ) -> Result<Vec<TransactionId>, LedgerError> {
        let mut state = self.store.write().await?;
        let target = state.transaction(id)?.clone();
        let members = state.chain_members(&target);
        let affected = resolve_scope(&target, &members, scope);

        let now = Utc::now();
        let mut planned: Vec<PlannedWrite> = Vec::with_capacity(affected.len());

        for txn_id in &affected {
            let old = state.transaction(*txn_id)?.clone();
            let mut new = old.clone();
            if let Some(description) = &updates.description {
                new.description = description.clone();
            }
            if let Some(amount) = updates.amount {
                new.amount = amount;
            }
            if let Some(category_id) = updates.category_id {
                new.category_id = category_id;
            }
            if let Some(status) = updates.status {
                new.status = status;
            }
            if *txn_id == id {
                if let Some(date) = updates.date {
                    new.date = date;
                }
            }
            if let Some(invoice) = updates.invoice_month {
                new.invoice_month = Some(invoice);
                new.invoice_month_overridden = true;
            }
            new.updated_at = now;

            planned.push(self.plan_rewrite(&state, &old, new)?);

            // An amount, date, or status change on half of a linked pair has
            // to land on the twin as well.
            if let Some(twin_id) = old.linked_transaction_id {
                if affected.contains(&twin_id) {
                    continue;
                }
                let twin_old = state.transaction(twin_id)?.clone();
                let mut twin_new = twin_old.clone();
                if let Some(amount) = updates.amount {
                    twin_new.amount = amount;
                }
                if let Some(status) = updates.status {
                    twin_new.status = status;
                }
                if *txn_id == id {
                    if let Some(date) = updates.date {
                        twin_new.date = date;
                    }
                }
                twin_new.updated_at = now;
                planned.push(self.plan_rewrite(&state, &twin_old, twin_new)?);
            }
        }

        let mut deltas: HashMap<AccountId, Money> = HashMap::new();
        for write in &planned {
            let delta = Money::sum([write.new.balance_effect(), write.old_effect.negated()]);
            let slot = deltas.entry(write.account_id).or_insert(Money::ZERO);
            *slot = slot.saturating_add(delta);
        }
        for write in planned {
            state.replace_transaction(write.new, write.entries);
        }
        for (account_id, delta) in deltas {
            state.apply_balance_delta(account_id, delta);
        }
        tracing::info!(transaction = %id, affected = affected.len(), "edit committed");
        Ok(affected)
    }

    /// Validates one rewrite and derives its new journal entries. Pure
    /// planning: nothing is mutated.
    fn plan_rewrite(
        &self,
        state: &StoreState,
        old: &Transaction,
        mut new: Transaction,
    ) -> Result<PlannedWrite, LedgerError> {
        state.ensure_date_unlocked(old.owner, old.date)?;
        if new.date != old.date {
            state.ensure_date_unlocked(new.owner, new.date)?;
        }

        let account = state.account(new.account_id)?.clone();
        if account.account_type.is_credit() && !new.invoice_month_overridden && new.date != old.date
        {
            let (closing_day, _) = account.billing_cycle()?;
            new.invoice_month = Some(invoice_month_for(new.date, closing_day));
        }

        let entries = if new.is_primary() {
            let to_account = match new.to_account_id {
                Some(to_id) => Some(state.account(to_id)?.clone()),
                None => None,
            };
            let entries = derive_entries(&new, &account, to_account.as_ref())?;
            guard_balanced(&new, &entries)?;
            entries
        } else {
            Vec::new()
        };

        Ok(PlannedWrite {
            account_id: new.account_id,
            old_effect: old.balance_effect(),
            new,
            entries,
        })
    }

    /// Deletes a transaction across the chain scope, reversing every balance
    /// effect. Deleting either half of a linked pair removes both halves.
    /// Returns the number of transactions removed.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound`, `PeriodLocked` for any affected date,
    /// or `ConcurrencyConflict` once retries are exhausted.
    pub async fn delete_transaction(
        &self,
        id: TransactionId,
        scope: EditScope,
    ) -> Result<usize, LedgerError> {
        with_retry(&self.retry, "delete_transaction", || self.try_delete(id, scope)).await
    }

    async fn try_delete(&self, id: TransactionId, scope: EditScope) -> Result<usize, LedgerError> {
        let mut state = self.store.write().await?;
        let target = state.transaction(id)?.clone();
        let members = state.chain_members(&target);
        let affected = resolve_scope(&target, &members, scope);

        let mut doomed: Vec<TransactionId> = Vec::with_capacity(affected.len());
        for txn_id in affected {
            if !doomed.contains(&txn_id) {
                doomed.push(txn_id);
            }
            if let Some(twin_id) = state.transaction(txn_id)?.linked_transaction_id {
                if !doomed.contains(&twin_id) {
                    doomed.push(twin_id);
                }
            }
        }

        let mut deltas: HashMap<AccountId, Money> = HashMap::new();
        for txn_id in &doomed {
            let txn = state.transaction(*txn_id)?.clone();
            state.ensure_date_unlocked(txn.owner, txn.date)?;
            let slot = deltas.entry(txn.account_id).or_insert(Money::ZERO);
            *slot = slot.saturating_add(txn.balance_effect().negated());
        }

        for txn_id in &doomed {
            state.remove_transaction(*txn_id);
        }
        for (account_id, delta) in deltas {
            state.apply_balance_delta(account_id, delta);
        }
        tracing::info!(transaction = %id, removed = doomed.len(), "delete committed");
        Ok(doomed.len())
    }

    /// Moves money between two accounts as a linked transaction pair. The
    /// outgoing half owns both journal lines; the incoming half references it.
    ///
    /// The source may overdraw: a transfer records money the user already
    /// moved, so only bill payments gate on available funds.
    ///
    /// # Errors
    ///
    /// Returns validation errors, `AccountNotFound`, `PeriodLocked`, or
    /// `ConcurrencyConflict` once retries are exhausted.
    pub async fn transfer(
        &self,
        input: TransferInput,
    ) -> Result<(Transaction, Transaction), LedgerError> {
        input.validate()?;
        with_retry(&self.retry, "transfer", || self.try_transfer(&input)).await
    }

    async fn try_transfer(
        &self,
        input: &TransferInput,
    ) -> Result<(Transaction, Transaction), LedgerError> {
        let mut state = self.store.write().await?;
        if let Some(key) = input.idempotency_key {
            if let Some(OperationOutcome::Transferred { outgoing, incoming }) =
                self.store.receipt(key)
            {
                return Ok((outgoing, incoming));
            }
        }
        let from = state.account(input.from_account_id)?.clone();
        let to = state.account(input.to_account_id)?.clone();
        state.ensure_date_unlocked(input.owner, input.date)?;

        // A transfer into a credit card pays down its bill; attribute it to
        // the invoice the payment date falls on.
        let invoice_month = if to.account_type.is_credit() {
            let (closing_day, _) = to.billing_cycle()?;
            Some(invoice_month_for(input.date, closing_day))
        } else {
            None
        };

        let pair = plan_pair(
            input.owner,
            &from,
            &to,
            input.amount,
            input.date,
            &input.description,
            input.category_id,
            invoice_month,
        )?;
        let (outgoing, incoming) = commit_pair(&mut state, pair);
        if let Some(key) = input.idempotency_key {
            self.store.record_outcome(
                key,
                OperationOutcome::Transferred {
                    outgoing: outgoing.clone(),
                    incoming: incoming.clone(),
                },
            );
        }
        Ok((outgoing, incoming))
    }

    /// Pays down a credit-card bill from another account. The payment lands
    /// on the invoice month the payment date falls on.
    ///
    /// # Errors
    ///
    /// Returns `NotACreditAccount`/`MissingBillingConfig` for a target that
    /// is not a configured credit card, `InsufficientFunds` when the source
    /// account (including its limit headroom) cannot cover the payment, plus
    /// the usual validation, lock, and concurrency errors.
    pub async fn pay_credit_card_bill(
        &self,
        input: PayBillInput,
    ) -> Result<(Transaction, Transaction), LedgerError> {
        input.validate()?;
        with_retry(&self.retry, "pay_credit_card_bill", || self.try_pay_bill(&input)).await
    }

    async fn try_pay_bill(
        &self,
        input: &PayBillInput,
    ) -> Result<(Transaction, Transaction), LedgerError> {
        let mut state = self.store.write().await?;
        if let Some(key) = input.idempotency_key {
            if let Some(OperationOutcome::Transferred { outgoing, incoming }) =
                self.store.receipt(key)
            {
                return Ok((outgoing, incoming));
            }
        }
        let credit = state.account(input.credit_account_id)?.clone();
        let (closing_day, _) = credit.billing_cycle()?;
        let from = state.account(input.from_account_id)?.clone();
        state.ensure_date_unlocked(input.owner, input.date)?;

        let available = from.available_funds();
        if available < input.amount {
            return Err(LedgerError::InsufficientFunds {
                available,
                requested: input.amount,
            });
        }

        let invoice_month = Some(invoice_month_for(input.date, closing_day));
        let pair = plan_pair(
            input.owner,
            &from,
            &credit,
            input.amount,
            input.date,
            &input.description,
            input.category_id,
            invoice_month,
        )?;
        let (outgoing, incoming) = commit_pair(&mut state, pair);
        if let Some(key) = input.idempotency_key {
            self.store.record_outcome(
                key,
                OperationOutcome::Transferred {
                    outgoing: outgoing.clone(),
                    incoming: incoming.clone(),
                },
            );
        }
        Ok((outgoing, incoming))
    }

    /// Closes an accounting period, locking every date inside it.
    ///
    /// Every completed transaction dated in the period must carry a balanced
    /// entry set; an entry-less linked secondary is covered by its balanced
    /// primary. Offenders abort the closure.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriodRange`, `ClosureOverlap` against an existing
    /// locked closure, `UnbalancedPeriod` listing the offenders, or
    /// `ConcurrencyConflict` once retries are exhausted.
    pub async fn create_period_closure(
        &self,
        input: ClosureInput,
    ) -> Result<PeriodClosure, LedgerError> {
        input.validate()?;
        with_retry(&self.retry, "create_period_closure", || self.try_close(&input)).await
    }

    async fn try_close(&self, input: &ClosureInput) -> Result<PeriodClosure, LedgerError> {
        let mut state = self.store.write().await?;

        if let Some(existing) =
            state.locked_overlap(input.owner, input.period_start, input.period_end)
        {
            return Err(LedgerError::ClosureOverlap {
                start: existing.period_start,
                end: existing.period_end,
            });
        }

        let offenders: Vec<TransactionId> = state
            .transactions_in_period(input.owner, input.period_start, input.period_end)
            .into_iter()
            .filter(|txn| txn.status.affects_balance() && txn.is_primary())
            .filter(|txn| {
                let entries = state.entries_for(txn.id);
                entries.is_empty() || !check_entries(entries).valid
            })
            .map(|txn| txn.id)
            .collect();
        if !offenders.is_empty() {
            return Err(LedgerError::UnbalancedPeriod {
                period_start: input.period_start,
                period_end: input.period_end,
                offenders,
            });
        }

        let closure = PeriodClosure {
            id: PeriodClosureId::new(),
            owner: input.owner,
            period_start: input.period_start,
            period_end: input.period_end,
            closure_type: input.closure_type,
            is_locked: true,
            closed_at: Utc::now(),
            closed_by: input.owner,
            unlocked_at: None,
            unlocked_by: None,
        };
        state.push_closure(closure.clone());
        tracing::info!(
            start = %input.period_start,
            end = %input.period_end,
            "period closed"
        );
        Ok(closure)
    }

    /// Lifts a period closure's lock; mutations dated inside the period
    /// succeed again afterwards.
    ///
    /// # Errors
    ///
    /// Returns `ClosureNotFound`, or `ConcurrencyConflict` once retries are
    /// exhausted.
    pub async fn unlock_period_closure(
        &self,
        id: PeriodClosureId,
        by: UserId,
    ) -> Result<PeriodClosure, LedgerError> {
        with_retry(&self.retry, "unlock_period_closure", || self.try_unlock(id, by)).await
    }

    async fn try_unlock(
        &self,
        id: PeriodClosureId,
        by: UserId,
    ) -> Result<PeriodClosure, LedgerError> {
        let mut state = self.store.write().await?;
        let closure = state.closure_mut(id)?;
        closure.unlock(by, Utc::now());
        let unlocked = closure.clone();
        tracing::info!(closure = %id, "period unlocked");
        Ok(unlocked)
    }

    /// The double-entry diagnostic for one transaction. The incoming half of
    /// a linked pair reports against its primary's journal lines.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound`.
    pub async fn check_transaction_balance(
        &self,
        id: TransactionId,
    ) -> Result<BalanceCheck, LedgerError> {
        let state = self.store.read().await;
        let txn = state.transaction(id)?;
        let source = if txn.is_primary() {
            id
        } else {
            txn.linked_transaction_id.unwrap_or(id)
        };
        Ok(check_entries(state.entries_for(source)))
    }

    /// Totals and derived status of one credit-card invoice.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`, or `NotACreditAccount` /
    /// `MissingBillingConfig` for an account without a billing cycle.
    pub async fn invoice_summary(
        &self,
        account_id: AccountId,
        invoice: InvoiceMonth,
    ) -> Result<InvoiceSummary, LedgerError> {
        let state = self.store.read().await;
        let account = state.account(account_id)?;
        let (closing_day, due_day) = account.billing_cycle()?;

        let transactions = state.transactions_for_account(account_id);
        let total_due = Money::sum(
            transactions
                .iter()
                .copied()
                .filter(|txn| txn.status.affects_balance() && txn.invoice_month == Some(invoice))
                .filter_map(|txn| match txn.transaction_type {
                    TransactionType::Expense => Some(txn.amount),
                    // A refund offsets the invoice it was attributed to.
                    TransactionType::Income => Some(txn.amount.negated()),
                    TransactionType::Transfer => None,
                }),
        );
        let total_paid = Money::sum(
            transactions
                .iter()
                .copied()
                .filter(|txn| txn.status.affects_balance() && txn.invoice_month == Some(invoice))
                .filter(|txn| {
                    txn.transaction_type == TransactionType::Transfer && txn.to_account_id.is_none()
                })
                .map(|txn| txn.amount),
        );

        let today = Utc::now().date_naive();
        Ok(InvoiceSummary {
            account_id,
            invoice,
            total_due,
            total_paid,
            status: billing::bill_status(invoice, closing_day, due_day, today, total_due, total_paid),
            closing_date: billing::closing_date(invoice, closing_day, due_day),
            due_date: billing::due_date(invoice, due_day),
        })
    }

    /// A snapshot of one transaction.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound`.
    pub async fn transaction(&self, id: TransactionId) -> Result<Transaction, LedgerError> {
        Ok(self.store.read().await.transaction(id)?.clone())
    }

    /// A snapshot of one transaction's journal entries.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound`.
    pub async fn journal_entries(
        &self,
        id: TransactionId,
    ) -> Result<Vec<JournalEntry>, LedgerError> {
        let state = self.store.read().await;
        state.transaction(id)?;
        Ok(state.entries_for(id).to_vec())
    }
}

struct PairPlan {
    outgoing: Transaction,
    incoming: Transaction,
    entries: Vec<JournalEntry>,
}

/// Builds the linked pair for a transfer or bill payment. The outgoing half
/// carries `to_account_id` and owns the journal lines.
#[allow(clippy::too_many_arguments)]
fn plan_pair(
    owner: UserId,
    from: &Account,
    to: &Account,
    amount: Money,
    date: NaiveDate,
    description: &str,
    category_id: CategoryId,
    invoice_month: Option<InvoiceMonth>,
) -> Result<PairPlan, LedgerError> {
    let now = Utc::now();
    let outgoing_id = TransactionId::new();
    let incoming_id = TransactionId::new();

    let base = Transaction {
        id: outgoing_id,
        owner,
        account_id: from.id,
        to_account_id: Some(to.id),
        category_id,
        transaction_type: TransactionType::Transfer,
        amount,
        date,
        description: description.to_string(),
        status: TransactionStatus::Completed,
        is_fixed: false,
        parent_transaction_id: None,
        installments: None,
        current_installment: None,
        invoice_month: None,
        invoice_month_overridden: false,
        linked_transaction_id: Some(incoming_id),
        created_at: now,
        updated_at: now,
    };

    let incoming = Transaction {
        id: incoming_id,
        account_id: to.id,
        to_account_id: None,
        invoice_month,
        linked_transaction_id: Some(outgoing_id),
        ..base.clone()
    };
    let outgoing = base;

    let entries = derive_entries(&outgoing, from, Some(to))?;
    guard_balanced(&outgoing, &entries)?;
    Ok(PairPlan {
        outgoing,
        incoming,
        entries,
    })
}

/// Applies a planned pair under the write guard.
fn commit_pair(state: &mut StoreState, pair: PairPlan) -> (Transaction, Transaction) {
    state.apply_balance_delta(pair.outgoing.account_id, pair.outgoing.balance_effect());
    state.apply_balance_delta(pair.incoming.account_id, pair.incoming.balance_effect());
    state.insert_transaction(pair.incoming.clone(), Vec::new());
    state.insert_transaction(pair.outgoing.clone(), pair.entries);
    tracing::info!(
        from = %pair.outgoing.account_id,
        to = %pair.incoming.account_id,
        "linked pair committed"
    );
    (pair.outgoing, pair.incoming)
}

fn guard_balanced(txn: &Transaction, entries: &[JournalEntry]) -> Result<(), LedgerError> {
    match ensure_balanced(txn.id, entries) {
        Ok(_) => Ok(()),
        Err(err) => {
            if err.is_internal() {
                tracing::error!(
                    transaction = %txn.id,
                    error = %err,
                    "journal derivation out of balance, aborting"
                );
            }
            Err(err)
        }
    }
}

fn validate_description(description: &str) -> Result<(), LedgerError> {
    if description.trim().is_empty() {
        return Err(LedgerError::EmptyDescription);
    }
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(LedgerError::DescriptionTooLong {
            max: MAX_DESCRIPTION_LEN,
        });
    }
    Ok(())
}

fn validate_amount(amount: Money) -> Result<(), LedgerError> {
    if amount.is_zero() {
        return Err(LedgerError::ZeroAmount);
    }
    if amount.is_negative() {
        return Err(LedgerError::NegativeAmount);
    }
    if amount > MAX_AMOUNT {
        return Err(LedgerError::AmountTooLarge { max: MAX_AMOUNT });
    }
    Ok(())
}
