//! Offline queue replay against the real processor.

mod common;

use centavo_shared::config::AppConfig;
use centavo_shared::types::{AccountId, CategoryId, Money, UserId};
use centavo_store::{
    OfflineSyncReconciler, QueuedOperation, ReplayTarget, TransferInput,
};

use common::{checking, date, expense, income, processor};

#[tokio::test]
async fn test_replay_applies_queued_operations_in_order() {
    let (store, proc) = processor();
    let owner = UserId::new();
    let a = checking(owner, 0);
    let b = checking(owner, 0);
    let (a_id, b_id) = (a.id, b.id);
    store.upsert_account(a).await.unwrap();
    store.upsert_account(b).await.unwrap();

    let mut reconciler = OfflineSyncReconciler::new(&AppConfig::default().sync);
    // The income and the transfer must land in enqueue order.
    reconciler.enqueue(QueuedOperation::Create(income(owner, a_id, 5_000, date(2026, 3, 10))));
    reconciler.enqueue(QueuedOperation::Transfer(TransferInput {
        owner,
        from_account_id: a_id,
        to_account_id: b_id,
        amount: Money::from_cents(2_000),
        date: date(2026, 3, 11),
        description: "move".to_string(),
        category_id: CategoryId::new(),
        idempotency_key: None,
    }));

    let report = reconciler.replay(&proc).await;
    assert_eq!(report.applied.len(), 2);
    assert!(report.dead_letter.is_empty());
    assert!(reconciler.is_empty());

    assert_eq!(store.account(a_id).await.unwrap().balance, Money::from_cents(3_000));
    assert_eq!(store.account(b_id).await.unwrap().balance, Money::from_cents(2_000));
}

#[tokio::test]
async fn test_replay_after_drop_does_not_double_apply() {
    let (store, proc) = processor();
    let owner = UserId::new();
    let account = checking(owner, 0);
    let account_id = account.id;
    store.upsert_account(account).await.unwrap();

    let mut reconciler = OfflineSyncReconciler::new(&AppConfig::default().sync);
    let operation = QueuedOperation::Create(income(owner, account_id, 5_000, date(2026, 3, 10)));
    let key = reconciler.enqueue(operation.clone());
    let report = reconciler.replay(&proc).await;
    assert_eq!(report.applied, vec![key]);

    // A connectivity drop before the ack re-delivers the same keyed item.
    proc.apply(key, &operation).await.unwrap();
    assert_eq!(
        store.account(account_id).await.unwrap().balance,
        Money::from_cents(5_000)
    );
}

#[tokio::test]
async fn test_non_retryable_failure_dead_letters_and_replay_continues() {
    let (store, proc) = processor();
    let owner = UserId::new();
    let account = checking(owner, 0);
    let account_id = account.id;
    store.upsert_account(account).await.unwrap();

    let mut reconciler = OfflineSyncReconciler::new(&AppConfig::default().sync);
    // References an account that never synced; fails fast.
    reconciler.enqueue(QueuedOperation::Create(expense(
        owner,
        AccountId::new(),
        1_000,
        date(2026, 3, 10),
    )));
    let survivor = reconciler.enqueue(QueuedOperation::Create(income(
        owner, account_id, 2_500,
        date(2026, 3, 10),
    )));

    let report = reconciler.replay(&proc).await;
    assert_eq!(report.applied, vec![survivor]);
    assert_eq!(report.dead_letter.len(), 1);
    assert_eq!(report.dead_letter[0].item.attempt_count, 1);

    assert_eq!(
        store.account(account_id).await.unwrap().balance,
        Money::from_cents(2_500)
    );
}
