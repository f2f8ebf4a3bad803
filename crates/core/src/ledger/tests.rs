//! Ledger service and posting tests against the in-memory store.

use rust_decimal_macros::dec;
use simba_shared::AccountRef;
use simba_shared::types::{Currency, Money};

use super::*;
use crate::access::Module;
use crate::error::CoreError;
use crate::store::{Store, StoreTx};
use crate::testing::{Fixture, clerk, tsh};

fn account(code: &str, name: &str, account_type: AccountType) -> NewAccount {
    NewAccount {
        code: code.into(),
        name: name.into(),
        account_type,
        currency: Currency::Tzs,
    }
}

fn posting(debit: &str, credit: &str, amount: Money) -> PostTransactionInput {
    PostTransactionInput {
        debit_code: debit.into(),
        credit_code: credit.into(),
        amount,
        transaction_type: TransactionType::Expense,
        description: "Office rent".into(),
    }
}

async fn chart(fx: &Fixture) {
    let ledger = &fx.services.ledger;
    ledger.bootstrap_chart(&fx.admin).await.unwrap();
    ledger
        .create_account(account("5100", "Rent Expense", AccountType::Expense), &fx.admin)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_bootstrap_chart_is_idempotent() {
    let fx = Fixture::new();
    let (cash, revenue) = fx.services.ledger.bootstrap_chart(&fx.admin).await.unwrap();
    let (cash_again, revenue_again) = fx.services.ledger.bootstrap_chart(&fx.admin).await.unwrap();

    assert_eq!(cash.code, "1000");
    assert_eq!(cash.account_type, AccountType::Asset);
    assert_eq!(revenue.code, "4000");
    assert_eq!(revenue.account_type, AccountType::Revenue);
    assert_eq!(cash.id, cash_again.id);
    assert_eq!(revenue.id, revenue_again.id);
}

#[tokio::test]
async fn test_create_account_rejects_duplicate_code() {
    let fx = Fixture::new();
    chart(&fx).await;

    let err = fx
        .services
        .ledger
        .create_account(account("5100", "Another", AccountType::Expense), &fx.admin)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Duplicate { entity: "account", .. }));
}

#[tokio::test]
async fn test_post_transaction_moves_balances() {
    let fx = Fixture::new();
    chart(&fx).await;
    let ledger = &fx.services.ledger;

    let transaction = ledger
        .post_transaction(posting("5100", "1000", tsh(dec!(250000))), &fx.admin)
        .await
        .unwrap();
    assert_eq!(transaction.amount, tsh(dec!(250000)));

    let rent = ledger.account_balance("5100").await.unwrap();
    let cash = ledger.account_balance("1000").await.unwrap();
    assert_eq!(rent.balance, tsh(dec!(250000)));
    assert_eq!(cash.credit_total, tsh(dec!(250000)));
    assert_eq!(cash.balance, tsh(dec!(-250000)));

    let trial = ledger.trial_balance(Currency::Tzs).await.unwrap();
    assert!(trial.is_balanced());
    assert_eq!(trial.lines.len(), 3);
}

#[tokio::test]
async fn test_post_transaction_validations() {
    let fx = Fixture::new();
    chart(&fx).await;
    let ledger = &fx.services.ledger;

    let err = ledger
        .post_transaction(posting("5100", "1000", tsh(dec!(0))), &fx.admin)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    let err = ledger
        .post_transaction(posting("1000", "1000", tsh(dec!(10))), &fx.admin)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    let err = ledger
        .post_transaction(posting("5100", "1000", Money::new(dec!(10), Currency::Usd)), &fx.admin)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Money(_)));

    let err = ledger
        .post_transaction(posting("9999", "1000", tsh(dec!(10))), &fx.admin)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound { entity: "account", .. }));

    let listed = ledger.list_transactions(simba_shared::types::PageRequest::new(1, 10)).await.unwrap();
    assert_eq!(listed.meta.total, 0);
}

#[tokio::test]
async fn test_ledger_mutations_require_finance_capability() {
    let fx = Fixture::new();
    let err = fx
        .services
        .ledger
        .bootstrap_chart(&clerk(&[Module::Sales, Module::Inventory]))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::PermissionDenied { module: Module::Finance, .. }));
}

#[tokio::test]
async fn test_get_or_create_account_refuses_type_mismatch() {
    let fx = Fixture::new();
    fx.services
        .ledger
        .create_account(account("4000", "Petty Cash", AccountType::Asset), &fx.admin)
        .await
        .unwrap();

    let mut tx = fx.store.begin().await.unwrap();
    let reference = AccountRef {
        code: "4000".into(),
        name: "Sales Revenue".into(),
    };
    let err = get_or_create_account(&mut tx, &reference, AccountType::Revenue, Currency::Tzs)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ConsistencyViolation(_)));

    let created = get_or_create_account(
        &mut tx,
        &AccountRef {
            code: "4100".into(),
            name: "Service Revenue".into(),
        },
        AccountType::Revenue,
        Currency::Tzs,
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();

    let stored = fx.services.ledger.get_account(created.id).await.unwrap();
    assert_eq!(stored.name, "Service Revenue");
}

#[tokio::test]
async fn test_cancel_income_requires_reason() {
    let fx = Fixture::new();
    let err = fx
        .services
        .ledger
        .cancel_income(simba_shared::types::IncomeId::new(), "  ", &fx.admin)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    let err = fx
        .services
        .ledger
        .cancel_income(simba_shared::types::IncomeId::new(), "duplicate", &fx.admin)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound { entity: "income", .. }));
}
