//! Period closure behavior: locking, unlocking, and balance validation.

mod common;

use centavo_core::chain::EditScope;
use centavo_core::fiscal::ClosureType;
use centavo_core::ledger::{LedgerError, Transaction, TransactionStatus, TransactionType};
use centavo_shared::types::{CategoryId, Money, TransactionId, UserId};
use centavo_store::{ClosureInput, TransactionUpdate};

use common::{checking, date, expense, processor};

fn closure_input(owner: UserId, start: chrono::NaiveDate, end: chrono::NaiveDate) -> ClosureInput {
    ClosureInput {
        owner,
        period_start: start,
        period_end: end,
        closure_type: ClosureType::Monthly,
    }
}

#[tokio::test]
async fn test_locked_period_rejects_create_edit_and_delete() {
    let (store, proc) = processor();
    let owner = UserId::new();
    let account = checking(owner, 0);
    let account_id = account.id;
    store.upsert_account(account).await.unwrap();

    let inside = proc
        .create_transaction(expense(owner, account_id, 1_000, date(2026, 1, 10)))
        .await
        .unwrap();
    proc.create_period_closure(closure_input(owner, date(2026, 1, 1), date(2026, 1, 31)))
        .await
        .unwrap();

    let err = proc
        .create_transaction(expense(owner, account_id, 500, date(2026, 1, 20)))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::PeriodLocked { .. }));

    let err = proc
        .edit_transaction(
            inside[0].id,
            TransactionUpdate {
                amount: Some(Money::from_cents(2_000)),
                ..TransactionUpdate::default()
            },
            EditScope::Current,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::PeriodLocked { .. }));

    let err = proc
        .delete_transaction(inside[0].id, EditScope::Current)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::PeriodLocked { .. }));

    // Nothing changed.
    assert_eq!(
        store.account(account_id).await.unwrap().balance,
        Money::from_cents(-1_000)
    );
}

#[tokio::test]
async fn test_moving_a_date_into_a_locked_period_is_rejected() {
    let (store, proc) = processor();
    let owner = UserId::new();
    let account = checking(owner, 0);
    let account_id = account.id;
    store.upsert_account(account).await.unwrap();

    let outside = proc
        .create_transaction(expense(owner, account_id, 1_000, date(2026, 2, 10)))
        .await
        .unwrap();
    proc.create_period_closure(closure_input(owner, date(2026, 1, 1), date(2026, 1, 31)))
        .await
        .unwrap();

    let err = proc
        .edit_transaction(
            outside[0].id,
            TransactionUpdate {
                date: Some(date(2026, 1, 15)),
                ..TransactionUpdate::default()
            },
            EditScope::Current,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::PeriodLocked { .. }));
    assert_eq!(proc.transaction(outside[0].id).await.unwrap().date, date(2026, 2, 10));
}

#[tokio::test]
async fn test_unlock_reopens_the_period() {
    let (store, proc) = processor();
    let owner = UserId::new();
    let account = checking(owner, 0);
    let account_id = account.id;
    store.upsert_account(account).await.unwrap();

    let closure = proc
        .create_period_closure(closure_input(owner, date(2026, 1, 1), date(2026, 1, 31)))
        .await
        .unwrap();
    assert!(closure.is_locked);

    let unlocked = proc.unlock_period_closure(closure.id, owner).await.unwrap();
    assert!(!unlocked.is_locked);
    assert_eq!(unlocked.unlocked_by, Some(owner));

    proc.create_transaction(expense(owner, account_id, 500, date(2026, 1, 20)))
        .await
        .unwrap();
    assert_eq!(
        store.account(account_id).await.unwrap().balance,
        Money::from_cents(-500)
    );
}

#[tokio::test]
async fn test_overlapping_locked_closures_are_rejected() {
    let (_, proc) = processor();
    let owner = UserId::new();

    proc.create_period_closure(closure_input(owner, date(2026, 1, 1), date(2026, 1, 31)))
        .await
        .unwrap();
    let err = proc
        .create_period_closure(closure_input(owner, date(2026, 1, 15), date(2026, 2, 15)))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::ClosureOverlap {
            start: date(2026, 1, 1),
            end: date(2026, 1, 31),
        }
    );

    // A disjoint period closes fine.
    proc.create_period_closure(closure_input(owner, date(2026, 2, 16), date(2026, 3, 15)))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unlocking_a_missing_closure_fails() {
    let (_, proc) = processor();
    let id = centavo_shared::types::PeriodClosureId::new();
    let err = proc.unlock_period_closure(id, UserId::new()).await.unwrap_err();
    assert_eq!(err, LedgerError::ClosureNotFound(id));
}

#[tokio::test]
async fn test_pending_transactions_do_not_block_closure() {
    let (store, proc) = processor();
    let owner = UserId::new();
    let account = checking(owner, 0);
    let account_id = account.id;
    store.upsert_account(account).await.unwrap();

    let mut input = expense(owner, account_id, 1_000, date(2026, 1, 10));
    input.status = TransactionStatus::Pending;
    proc.create_transaction(input).await.unwrap();

    proc.create_period_closure(closure_input(owner, date(2026, 1, 1), date(2026, 1, 31)))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unbalanced_transaction_blocks_closure() {
    let (store, proc) = processor();
    let owner = UserId::new();
    let account = checking(owner, 0);
    let account_id = account.id;
    store.upsert_account(account).await.unwrap();

    // A completed transaction that somehow lost its journal entries.
    let orphan = Transaction {
        id: TransactionId::new(),
        owner,
        account_id,
        to_account_id: None,
        category_id: CategoryId::new(),
        transaction_type: TransactionType::Expense,
        amount: Money::from_cents(1_000),
        date: date(2026, 1, 10),
        description: "orphaned".to_string(),
        status: TransactionStatus::Completed,
        is_fixed: false,
        parent_transaction_id: None,
        installments: None,
        current_installment: None,
        invoice_month: None,
        invoice_month_overridden: false,
        linked_transaction_id: None,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    };
    let orphan_id = orphan.id;
    store
        .write()
        .await
        .unwrap()
        .insert_transaction(orphan, Vec::new());

    let err = proc
        .create_period_closure(closure_input(owner, date(2026, 1, 1), date(2026, 1, 31)))
        .await
        .unwrap_err();
    match err {
        LedgerError::UnbalancedPeriod { offenders, .. } => {
            assert_eq!(offenders, vec![orphan_id]);
        }
        other => panic!("expected UnbalancedPeriod, got {other:?}"),
    }
}
