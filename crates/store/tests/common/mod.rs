//! Shared fixtures for store integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;

use centavo_core::ledger::{Account, AccountType, TransactionStatus};
use centavo_shared::config::AppConfig;
use centavo_shared::types::{AccountId, CategoryId, Money, UserId};
use centavo_store::{CreateKind, CreateTransactionInput, LedgerStore, LedgerTransactionProcessor};

pub fn processor() -> (Arc<LedgerStore>, LedgerTransactionProcessor) {
    processor_with(AppConfig::default())
}

pub fn processor_with(config: AppConfig) -> (Arc<LedgerStore>, LedgerTransactionProcessor) {
    let store = Arc::new(LedgerStore::new(&config.store));
    let proc = LedgerTransactionProcessor::new(Arc::clone(&store), &config);
    (store, proc)
}

pub fn checking(owner: UserId, balance_cents: i64) -> Account {
    Account {
        id: AccountId::new(),
        owner,
        name: "Checking".to_string(),
        account_type: AccountType::Checking,
        balance: Money::from_cents(balance_cents),
        limit_amount: None,
        closing_day: None,
        due_day: None,
    }
}

pub fn credit_card(
    owner: UserId,
    balance_cents: i64,
    limit_cents: i64,
    closing_day: u8,
    due_day: u8,
) -> Account {
    Account {
        id: AccountId::new(),
        owner,
        name: "Credit card".to_string(),
        account_type: AccountType::Credit,
        balance: Money::from_cents(balance_cents),
        limit_amount: Some(Money::from_cents(limit_cents)),
        closing_day: Some(closing_day),
        due_day: Some(due_day),
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn income(owner: UserId, account_id: AccountId, cents: i64, on: NaiveDate) -> CreateTransactionInput {
    CreateTransactionInput {
        owner,
        account_id,
        category_id: CategoryId::new(),
        kind: CreateKind::Income,
        amount: Money::from_cents(cents),
        date: on,
        description: "salary".to_string(),
        status: TransactionStatus::Completed,
        recurrence: None,
        invoice_month: None,
        idempotency_key: None,
    }
}

pub fn expense(owner: UserId, account_id: AccountId, cents: i64, on: NaiveDate) -> CreateTransactionInput {
    CreateTransactionInput {
        owner,
        account_id,
        category_id: CategoryId::new(),
        kind: CreateKind::Expense,
        amount: Money::from_cents(cents),
        date: on,
        description: "groceries".to_string(),
        status: TransactionStatus::Completed,
        recurrence: None,
        invoice_month: None,
        idempotency_key: None,
    }
}
