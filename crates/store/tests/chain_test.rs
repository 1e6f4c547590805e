//! Installment and recurring chain behavior through the processor.

mod common;

use centavo_core::billing::invoice_month_for;
use centavo_core::chain::EditScope;
use chrono::Datelike;
use centavo_shared::types::{Money, UserId};
use centavo_store::{Recurrence, TransactionUpdate};

use common::{checking, credit_card, date, expense, processor};

#[tokio::test]
async fn test_installments_generate_a_monthly_chain() {
    let (store, proc) = processor();
    let owner = UserId::new();
    let account = checking(owner, 0);
    let account_id = account.id;
    store.upsert_account(account).await.unwrap();

    let mut input = expense(owner, account_id, 1_200, date(2026, 1, 15));
    input.recurrence = Some(Recurrence::Installments { count: 6 });
    let chain = proc.create_transaction(input).await.unwrap();

    assert_eq!(chain.len(), 6);
    let root = &chain[0];
    assert_eq!(root.parent_transaction_id, None);
    for (i, txn) in chain.iter().enumerate() {
        assert_eq!(txn.installments, Some(6));
        assert_eq!(txn.current_installment, Some(u32::try_from(i).unwrap() + 1));
        assert_eq!(txn.date.day(), 15);
        if i > 0 {
            assert_eq!(txn.parent_transaction_id, Some(root.id));
        }
    }
    assert_eq!(chain[1].date, date(2026, 2, 15));
    assert_eq!(chain[5].date, date(2026, 6, 15));

    // Six installments of 1,200 land at once.
    assert_eq!(
        store.account(account_id).await.unwrap().balance,
        Money::from_cents(-7_200)
    );
}

#[tokio::test]
async fn test_installment_dates_clamp_to_short_months() {
    let (store, proc) = processor();
    let owner = UserId::new();
    let account = checking(owner, 0);
    let account_id = account.id;
    store.upsert_account(account).await.unwrap();

    let mut input = expense(owner, account_id, 900, date(2026, 1, 31));
    input.recurrence = Some(Recurrence::Installments { count: 3 });
    let chain = proc.create_transaction(input).await.unwrap();

    assert_eq!(chain[0].date, date(2026, 1, 31));
    assert_eq!(chain[1].date, date(2026, 2, 28));
    assert_eq!(chain[2].date, date(2026, 3, 31));
}

#[tokio::test]
async fn test_fixed_recurrence_marks_every_member() {
    let (store, proc) = processor();
    let owner = UserId::new();
    let account = checking(owner, 0);
    let account_id = account.id;
    store.upsert_account(account).await.unwrap();

    let mut input = expense(owner, account_id, 4_500, date(2026, 2, 1));
    input.description = "rent".to_string();
    input.recurrence = Some(Recurrence::Fixed { occurrences: 4 });
    let chain = proc.create_transaction(input).await.unwrap();

    assert_eq!(chain.len(), 4);
    for txn in &chain {
        assert!(txn.is_fixed);
        assert_eq!(txn.installments, None);
    }
    assert_eq!(chain[0].parent_transaction_id, None);
    assert_eq!(chain[3].parent_transaction_id, Some(chain[0].id));
}

#[tokio::test]
async fn test_chain_on_credit_card_gets_per_date_invoice_months() {
    let (store, proc) = processor();
    let owner = UserId::new();
    let card = credit_card(owner, 0, 50_000, 10, 20);
    let card_id = card.id;
    store.upsert_account(card).await.unwrap();

    let mut input = expense(owner, card_id, 2_000, date(2026, 1, 15));
    input.recurrence = Some(Recurrence::Installments { count: 3 });
    let chain = proc.create_transaction(input).await.unwrap();

    for txn in &chain {
        assert_eq!(txn.invoice_month, Some(invoice_month_for(txn.date, 10)));
    }
}

#[tokio::test]
async fn test_scoped_edit_spares_past_siblings() {
    let (store, proc) = processor();
    let owner = UserId::new();
    let account = checking(owner, 0);
    let account_id = account.id;
    store.upsert_account(account).await.unwrap();

    let mut input = expense(owner, account_id, 1_000, date(2026, 1, 10));
    input.recurrence = Some(Recurrence::Fixed { occurrences: 5 });
    let chain = proc.create_transaction(input).await.unwrap();
    assert_eq!(
        store.account(account_id).await.unwrap().balance,
        Money::from_cents(-5_000)
    );

    // Raise the amount from the third occurrence onward.
    let affected = proc
        .edit_transaction(
            chain[2].id,
            TransactionUpdate {
                amount: Some(Money::from_cents(1_500)),
                ..TransactionUpdate::default()
            },
            EditScope::CurrentAndRemaining,
        )
        .await
        .unwrap();
    assert_eq!(affected.len(), 3);

    for (i, txn) in chain.iter().enumerate() {
        let amount = proc.transaction(txn.id).await.unwrap().amount;
        let expected = if i < 2 { 1_000 } else { 1_500 };
        assert_eq!(amount, Money::from_cents(expected));
    }
    // Three members gained 500 each.
    assert_eq!(
        store.account(account_id).await.unwrap().balance,
        Money::from_cents(-6_500)
    );
}

#[tokio::test]
async fn test_date_edit_moves_only_the_named_transaction() {
    let (store, proc) = processor();
    let owner = UserId::new();
    let account = checking(owner, 0);
    let account_id = account.id;
    store.upsert_account(account).await.unwrap();

    let mut input = expense(owner, account_id, 1_000, date(2026, 1, 10));
    input.recurrence = Some(Recurrence::Fixed { occurrences: 3 });
    let chain = proc.create_transaction(input).await.unwrap();

    proc.edit_transaction(
        chain[1].id,
        TransactionUpdate {
            date: Some(date(2026, 2, 20)),
            description: Some("adjusted".to_string()),
            ..TransactionUpdate::default()
        },
        EditScope::All,
    )
    .await
    .unwrap();

    assert_eq!(proc.transaction(chain[0].id).await.unwrap().date, date(2026, 1, 10));
    assert_eq!(proc.transaction(chain[1].id).await.unwrap().date, date(2026, 2, 20));
    assert_eq!(proc.transaction(chain[2].id).await.unwrap().date, date(2026, 3, 10));
    for txn in &chain {
        assert_eq!(proc.transaction(txn.id).await.unwrap().description, "adjusted");
    }
}

#[tokio::test]
async fn test_scoped_delete_counts_and_reverses() {
    let (store, proc) = processor();
    let owner = UserId::new();
    let account = checking(owner, 0);
    let account_id = account.id;
    store.upsert_account(account).await.unwrap();

    let mut input = expense(owner, account_id, 1_000, date(2026, 1, 10));
    input.recurrence = Some(Recurrence::Installments { count: 6 });
    let chain = proc.create_transaction(input).await.unwrap();

    let removed = proc
        .delete_transaction(chain[3].id, EditScope::CurrentAndRemaining)
        .await
        .unwrap();
    assert_eq!(removed, 3);
    assert_eq!(
        store.account(account_id).await.unwrap().balance,
        Money::from_cents(-3_000)
    );

    let removed = proc
        .delete_transaction(chain[0].id, EditScope::All)
        .await
        .unwrap();
    assert_eq!(removed, 3);
    assert_eq!(store.account(account_id).await.unwrap().balance, Money::ZERO);
}
