//! Property-based tests for journal derivation.
//!
//! - Property: every derived entry set satisfies the double-entry invariant
//! - Property: the balance effect of a transaction matches its journal lines

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;

use centavo_shared::types::{AccountId, CategoryId, Money, TransactionId, UserId};

use super::account::{Account, AccountType};
use super::derive::derive_entries;
use super::entry::JournalAccount;
use super::transaction::{Transaction, TransactionStatus, TransactionType};
use super::validation::check_entries;

/// Strategy for positive amounts (0.01 to 1,000,000.00).
fn positive_amount() -> impl Strategy<Value = Money> {
    (1i64..=100_000_000i64).prop_map(Money::from_cents)
}

fn account_type_strategy() -> impl Strategy<Value = AccountType> {
    prop_oneof![
        Just(AccountType::Checking),
        Just(AccountType::Savings),
        Just(AccountType::Credit),
        Just(AccountType::Investment),
        Just(AccountType::MealVoucher),
    ]
}

fn status_strategy() -> impl Strategy<Value = TransactionStatus> {
    prop_oneof![
        Just(TransactionStatus::Pending),
        Just(TransactionStatus::Completed),
    ]
}

fn make_account(account_type: AccountType) -> Account {
    let is_credit = account_type.is_credit();
    Account {
        id: AccountId::new(),
        owner: UserId::new(),
        name: "prop".to_string(),
        account_type,
        balance: Money::ZERO,
        limit_amount: is_credit.then(|| Money::from_cents(1_000_000)),
        closing_day: is_credit.then_some(10),
        due_day: is_credit.then_some(20),
    }
}

fn make_txn(
    transaction_type: TransactionType,
    status: TransactionStatus,
    amount: Money,
    account: &Account,
    to_account: Option<&Account>,
) -> Transaction {
    Transaction {
        id: TransactionId::new(),
        owner: account.owner,
        account_id: account.id,
        to_account_id: to_account.map(|a| a.id),
        category_id: CategoryId::new(),
        transaction_type,
        amount,
        date: NaiveDate::from_ymd_opt(2026, 6, 15).unwrap(),
        description: "prop".to_string(),
        status,
        is_fixed: false,
        parent_transaction_id: None,
        installments: None,
        current_installment: None,
        invoice_month: None,
        invoice_month_overridden: false,
        linked_transaction_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// For any income or expense on any account type, the derived entries
    /// always balance.
    #[test]
    fn prop_single_account_derivation_balances(
        amount in positive_amount(),
        account_type in account_type_strategy(),
        status in status_strategy(),
        is_income in any::<bool>(),
    ) {
        let account = make_account(account_type);
        let transaction_type = if is_income {
            TransactionType::Income
        } else {
            TransactionType::Expense
        };
        let txn = make_txn(transaction_type, status, amount, &account, None);

        let entries = derive_entries(&txn, &account, None).unwrap();
        let check = check_entries(&entries);
        prop_assert!(check.valid, "derived entries must balance");

        if status == TransactionStatus::Completed {
            prop_assert_eq!(entries.len(), 2);
            prop_assert_eq!(check.total_debits, amount);
        } else {
            prop_assert!(entries.is_empty());
        }
    }

    /// For any transfer between any two account types, the derived entries
    /// balance and total exactly the transfer amount.
    #[test]
    fn prop_transfer_derivation_balances(
        amount in positive_amount(),
        src_type in account_type_strategy(),
        dst_type in account_type_strategy(),
    ) {
        let src = make_account(src_type);
        let dst = make_account(dst_type);
        let txn = make_txn(
            TransactionType::Transfer,
            TransactionStatus::Completed,
            amount,
            &src,
            Some(&dst),
        );

        let entries = derive_entries(&txn, &src, Some(&dst)).unwrap();
        let check = check_entries(&entries);
        prop_assert!(check.valid);
        prop_assert_eq!(check.total_debits, amount);
        prop_assert_eq!(check.total_credits, amount);
    }

    /// The completed transaction's balance effect always matches the signed
    /// journal line on its own real account.
    #[test]
    fn prop_balance_effect_matches_journal(
        amount in positive_amount(),
        account_type in account_type_strategy(),
        is_income in any::<bool>(),
    ) {
        let account = make_account(account_type);
        let transaction_type = if is_income {
            TransactionType::Income
        } else {
            TransactionType::Expense
        };
        let txn = make_txn(
            transaction_type,
            TransactionStatus::Completed,
            amount,
            &account,
            None,
        );

        let entries = derive_entries(&txn, &account, None).unwrap();
        let own_line = entries
            .iter()
            .find(|e| {
                matches!(
                    e.account,
                    JournalAccount::Asset(id) | JournalAccount::Liability(id) if id == account.id
                )
            })
            .expect("completed transaction must touch its own account");

        // Asset accounts: debit adds, credit subtracts. A credit-card
        // liability line runs the same direction once expressed as the
        // account's signed balance (debt is negative balance).
        let effect_from_journal = match own_line.account {
            JournalAccount::Asset(_) | JournalAccount::Liability(_) => own_line.signed_amount(),
            JournalAccount::Revenue(_) | JournalAccount::Expense(_) => unreachable!(),
        };
        prop_assert_eq!(txn.balance_effect(), effect_from_journal);
    }
}
