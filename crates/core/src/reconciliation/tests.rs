//! End-to-end reconciliation tests: sale → stock-out → income/transaction.

use futures::future::join_all;
use rust_decimal_macros::dec;
use simba_shared::types::{Currency, PageRequest};

use super::*;
use crate::access::Module;
use crate::error::CoreError;
use crate::inventory::{AdjustmentType, ApprovalStatus, NewAdjustment, StockOutPurpose};
use crate::ledger::{AccountType, IncomeType, NewAccount, PaymentMethod, TransactionType};
use crate::sales::{NewPayment, Sale, SaleStatus};
use crate::testing::{Fixture, Line, clerk, tsh, units};

/// An approved 10 x 1000 @ 18% sale over an item holding 50 units.
async fn salt_sale(fx: &Fixture) -> Sale {
    let salt = fx.item("Sodium Chloride", 50, dec!(1000)).await;
    fx.approved_sale(&[Line {
        item_id: salt.id,
        quantity: 10,
        unit_price: dec!(1000),
        tax_rate: dec!(18),
    }])
    .await
}

#[tokio::test]
async fn test_approval_completes_sale_and_recognizes_income() {
    let fx = Fixture::new();
    let sale = salt_sale(&fx).await;
    let (_, stock_out) = fx.services.sales.request_stock_out(sale.id, &fx.admin).await.unwrap();
    let item_id = stock_out.lines[0].item_id;

    fx.services.inventory.approve_stock_out(stock_out.id, &fx.admin).await.unwrap();

    // Stock left the store
    let item = fx.services.inventory.get_item(item_id).await.unwrap();
    assert_eq!(item.quantity, units(40));

    // The sale is completed, every line stocked out
    let sale = fx.services.sales.get_sale(sale.id).await.unwrap();
    assert_eq!(sale.status, SaleStatus::Completed);
    assert!(sale.stock_out_processed_date.is_some());
    assert!(sale.items.iter().all(|line| line.is_stocked_out && line.stock_out_date.is_some()));

    // One income for the net amount, unpaid
    let income = fx.services.ledger.income_for_sale(sale.id).await.unwrap().unwrap();
    assert_eq!(income.amount, tsh(dec!(11800)));
    assert_eq!(income.income_type, IncomeType::Sales);
    assert_eq!(income.source, format!("Sale: {}", sale.sale_number));
    assert_eq!(income.reference.as_deref(), Some(sale.sale_number.as_str()));
    assert!(!income.is_paid);

    // One balanced cash/revenue transaction
    let transactions = fx.services.ledger.transactions_for_income(income.id).await.unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].transaction_type, TransactionType::Income);
    assert_eq!(transactions[0].amount, tsh(dec!(11800)));

    let cash = fx.services.ledger.account_balance("1000").await.unwrap();
    let revenue = fx.services.ledger.account_balance("4000").await.unwrap();
    assert_eq!(cash.account_type, AccountType::Asset);
    assert_eq!(revenue.account_type, AccountType::Revenue);
    assert_eq!(cash.account_id, transactions[0].debit_account_id);
    assert_eq!(revenue.account_id, transactions[0].credit_account_id);
    assert_eq!(cash.balance, tsh(dec!(11800)));
    assert_eq!(revenue.balance, tsh(dec!(11800)));

    let events = fx.audit.events_for("sale", sale.id);
    assert!(events.iter().any(|event| event.description.contains("completed by stock out")));
    assert!(fx.services.locks.is_empty());
}

#[tokio::test]
async fn test_stock_short_at_approval_keeps_sale_pending() {
    let fx = Fixture::new();
    let sale = salt_sale(&fx).await;
    let (_, stock_out) = fx.services.sales.request_stock_out(sale.id, &fx.admin).await.unwrap();
    let item_id = stock_out.lines[0].item_id;

    // Stock shrinks to 5 while the request waits.
    let inventory = &fx.services.inventory;
    let adjustment = inventory
        .request_adjustment(
            NewAdjustment {
                item_id,
                adjustment_quantity: units(-45),
                adjustment_type: AdjustmentType::Loss,
                reason: "flooded store room".into(),
            },
            &fx.admin,
        )
        .await
        .unwrap();
    inventory.approve_adjustment(adjustment.id, &fx.admin).await.unwrap();

    let err = inventory.approve_stock_out(stock_out.id, &fx.admin).await.unwrap_err();
    let CoreError::InsufficientStock(shortages) = &err else {
        panic!("expected insufficient stock, got {err:?}");
    };
    assert_eq!(shortages.len(), 1);
    assert_eq!(shortages[0].item_id, item_id);
    assert_eq!(shortages[0].requested, units(10));
    assert_eq!(shortages[0].available, units(5));

    assert_eq!(inventory.get_item(item_id).await.unwrap().quantity, units(5));
    assert!(inventory.get_stock_out(stock_out.id).await.unwrap().review.is_pending());
    let sale = fx.services.sales.get_sale(sale.id).await.unwrap();
    assert_eq!(sale.status, SaleStatus::StockOutPending);
    assert_eq!(sale.inventory_stock_out, Some(stock_out.id));
    assert!(fx.services.ledger.income_for_sale(sale.id).await.unwrap().is_none());
    assert!(fx.services.locks.is_empty());
}

#[tokio::test]
async fn test_repeated_triggers_recognize_income_once() {
    let fx = Fixture::new();
    let sale = salt_sale(&fx).await;
    let (_, stock_out) = fx.services.sales.request_stock_out(sale.id, &fx.admin).await.unwrap();

    fx.services.inventory.approve_stock_out(stock_out.id, &fx.admin).await.unwrap();
    let err = fx.services.inventory.approve_stock_out(stock_out.id, &fx.admin).await.unwrap_err();
    assert!(matches!(err, CoreError::AlreadyProcessed { .. }));

    for _ in 0..3 {
        let outcome = fx
            .services
            .reconciler
            .reconcile_stock_out(stock_out.id, &fx.admin)
            .await
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::AlreadyCompleted);
    }

    let incomes = fx.services.ledger.list_incomes(PageRequest::new(1, 20)).await.unwrap();
    assert_eq!(incomes.meta.total, 1);
    let transactions = fx.services.ledger.list_transactions(PageRequest::new(1, 20)).await.unwrap();
    assert_eq!(transactions.meta.total, 1);
    let item = fx.services.inventory.get_item(stock_out.lines[0].item_id).await.unwrap();
    assert_eq!(item.quantity, units(40));
}

#[tokio::test]
async fn test_concurrent_approvals_apply_once() {
    let fx = Fixture::new();
    let sale = salt_sale(&fx).await;
    let (_, stock_out) = fx.services.sales.request_stock_out(sale.id, &fx.admin).await.unwrap();

    let attempts = (0..8).map(|_| fx.services.inventory.approve_stock_out(stock_out.id, &fx.admin));
    let results = join_all(attempts).await;

    let approved = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(approved, 1);
    assert!(
        results
            .iter()
            .filter_map(|result| result.as_ref().err())
            .all(|err| matches!(err, CoreError::AlreadyProcessed { .. }))
    );

    let item = fx.services.inventory.get_item(stock_out.lines[0].item_id).await.unwrap();
    assert_eq!(item.quantity, units(40));
    let incomes = fx.services.ledger.list_incomes(PageRequest::new(1, 20)).await.unwrap();
    assert_eq!(incomes.meta.total, 1);
    assert!(fx.services.locks.is_empty());
}

#[tokio::test]
async fn test_concurrent_reconcile_and_payment_serialize() {
    let fx = Fixture::new();
    let sale = salt_sale(&fx).await;
    let (_, stock_out) = fx.services.sales.request_stock_out(sale.id, &fx.admin).await.unwrap();

    let payment = NewPayment {
        amount: tsh(dec!(11800)),
        method: PaymentMethod::BankTransfer,
        reference_number: Some("NMB-778".into()),
        notes: None,
    };
    let (approved, paid) = tokio::join!(
        fx.services.inventory.approve_stock_out(stock_out.id, &fx.admin),
        fx.services.sales.record_payment(sale.id, payment, &fx.admin),
    );
    approved.unwrap();
    paid.unwrap();

    // Whichever ran first, the income ends up paid.
    let sale = fx.services.sales.get_sale(sale.id).await.unwrap();
    assert_eq!(sale.status, SaleStatus::Completed);
    assert!(sale.totals.is_paid);
    let income = fx.services.ledger.income_for_sale(sale.id).await.unwrap().unwrap();
    assert!(income.is_paid);
    assert_eq!(income.payment_method, Some(PaymentMethod::BankTransfer));
}

#[tokio::test]
async fn test_rejection_returns_sale_to_approved() {
    let fx = Fixture::new();
    let sale = salt_sale(&fx).await;
    let (_, stock_out) = fx.services.sales.request_stock_out(sale.id, &fx.admin).await.unwrap();

    fx.services
        .inventory
        .reject_stock_out(stock_out.id, "truck unavailable", &fx.admin)
        .await
        .unwrap();

    let reverted = fx.services.sales.get_sale(sale.id).await.unwrap();
    assert_eq!(reverted.status, SaleStatus::Approved);
    assert_eq!(reverted.inventory_stock_out, None);
    assert!(!reverted.is_stock_out_requested);
    assert!(fx.services.ledger.income_for_sale(sale.id).await.unwrap().is_none());

    // A fresh request replaces the rejected one
    let (again, second) = fx.services.sales.request_stock_out(sale.id, &fx.admin).await.unwrap();
    assert_ne!(second.id, stock_out.id);
    assert_eq!(again.inventory_stock_out, Some(second.id));

    fx.services.inventory.approve_stock_out(second.id, &fx.admin).await.unwrap();
    let sale = fx.services.sales.get_sale(sale.id).await.unwrap();
    assert_eq!(sale.status, SaleStatus::Completed);
}

#[tokio::test]
async fn test_ledger_failure_rolls_back_stock_and_sale() {
    let fx = Fixture::new();
    // The cash account code is taken by a revenue account.
    fx.services
        .ledger
        .create_account(
            NewAccount {
                code: "1000".into(),
                name: "Misfiled Revenue".into(),
                account_type: AccountType::Revenue,
                currency: Currency::Tzs,
            },
            &fx.admin,
        )
        .await
        .unwrap();
    let sale = salt_sale(&fx).await;
    let (_, stock_out) = fx.services.sales.request_stock_out(sale.id, &fx.admin).await.unwrap();

    let err = fx.services.inventory.approve_stock_out(stock_out.id, &fx.admin).await.unwrap_err();
    assert!(matches!(err, CoreError::ConsistencyViolation(_)));

    let stored = fx.services.inventory.get_stock_out(stock_out.id).await.unwrap();
    assert_eq!(stored.review.status, ApprovalStatus::Pending);
    let item = fx.services.inventory.get_item(stock_out.lines[0].item_id).await.unwrap();
    assert_eq!(item.quantity, units(50));
    assert!(fx.services.inventory.item_history(item.id).await.unwrap().len() == 1);
    let sale = fx.services.sales.get_sale(sale.id).await.unwrap();
    assert_eq!(sale.status, SaleStatus::StockOutPending);
    assert!(fx.services.ledger.income_for_sale(sale.id).await.unwrap().is_none());
    assert!(fx.audit.events_for("stock_out", stock_out.id).iter().all(|e| e.description.starts_with("Requested")));
}

#[tokio::test]
async fn test_reconcile_requires_approved_sale_stock_out() {
    let fx = Fixture::new();
    let sale = salt_sale(&fx).await;
    let (_, stock_out) = fx.services.sales.request_stock_out(sale.id, &fx.admin).await.unwrap();

    let err = fx
        .services
        .reconciler
        .reconcile_stock_out(stock_out.id, &fx.admin)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::InvalidTransition {
            entity: "stock_out",
            action: "reconcile",
            ..
        }
    ));

    let item = fx.item("Rock Salt", 5, dec!(700)).await;
    let unlinked = fx
        .services
        .inventory
        .create_stock_out(item.id, units(1), StockOutPurpose::Transfer, None, &fx.admin)
        .await
        .unwrap();
    let err = fx
        .services
        .reconciler
        .reconcile_stock_out(unlinked.id, &fx.admin)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    let err = fx
        .services
        .reconciler
        .reconcile_stock_out(stock_out.id, &clerk(&[Module::Inventory]))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::PermissionDenied { module: Module::Sales, .. }));
}

#[tokio::test]
async fn test_payment_after_completion_marks_income_paid() {
    let fx = Fixture::new();
    let sale = salt_sale(&fx).await;
    let (_, stock_out) = fx.services.sales.request_stock_out(sale.id, &fx.admin).await.unwrap();
    fx.services.inventory.approve_stock_out(stock_out.id, &fx.admin).await.unwrap();

    let partial = NewPayment {
        amount: tsh(dec!(8000)),
        method: PaymentMethod::Cash,
        reference_number: None,
        notes: None,
    };
    fx.services.sales.record_payment(sale.id, partial, &fx.admin).await.unwrap();
    assert!(!fx.services.ledger.income_for_sale(sale.id).await.unwrap().unwrap().is_paid);

    let rest = NewPayment {
        amount: tsh(dec!(3800)),
        method: PaymentMethod::MobileMoney,
        reference_number: Some("MP-1234".into()),
        notes: None,
    };
    let sale = fx.services.sales.record_payment(sale.id, rest, &fx.admin).await.unwrap();
    assert!(sale.totals.is_paid);

    let income = fx.services.ledger.income_for_sale(sale.id).await.unwrap().unwrap();
    assert!(income.is_paid);
    assert!(income.payment_date.is_some());
    assert_eq!(income.payment_method, Some(PaymentMethod::MobileMoney));
}

#[tokio::test]
async fn test_paid_before_completion_recognizes_paid_income() {
    let fx = Fixture::new();
    let sale = salt_sale(&fx).await;
    let payment = NewPayment {
        amount: tsh(dec!(11800)),
        method: PaymentMethod::Cheque,
        reference_number: None,
        notes: None,
    };
    fx.services.sales.record_payment(sale.id, payment, &fx.admin).await.unwrap();
    let (_, stock_out) = fx.services.sales.request_stock_out(sale.id, &fx.admin).await.unwrap();
    fx.services.inventory.approve_stock_out(stock_out.id, &fx.admin).await.unwrap();

    let income = fx.services.ledger.income_for_sale(sale.id).await.unwrap().unwrap();
    assert!(income.is_paid);
    assert_eq!(income.payment_method, Some(PaymentMethod::Cheque));
}

#[tokio::test]
async fn test_cancelled_income_nets_accounts_to_zero() {
    let fx = Fixture::new();
    let sale = salt_sale(&fx).await;
    let (_, stock_out) = fx.services.sales.request_stock_out(sale.id, &fx.admin).await.unwrap();
    fx.services.inventory.approve_stock_out(stock_out.id, &fx.admin).await.unwrap();
    let income = fx.services.ledger.income_for_sale(sale.id).await.unwrap().unwrap();

    let (cancelled, reversal) = fx
        .services
        .ledger
        .cancel_income(income.id, "goods returned", &fx.admin)
        .await
        .unwrap();
    assert!(cancelled.is_cancelled);
    assert_eq!(reversal.transaction_type, TransactionType::Adjustment);

    let cash = fx.services.ledger.account_balance("1000").await.unwrap();
    let revenue = fx.services.ledger.account_balance("4000").await.unwrap();
    assert!(cash.balance.is_zero());
    assert!(revenue.balance.is_zero());

    let trial = fx.services.ledger.trial_balance(Currency::Tzs).await.unwrap();
    assert!(trial.is_balanced());
    assert_eq!(trial.total_debit, tsh(dec!(23600)));

    let err = fx
        .services
        .ledger
        .cancel_income(income.id, "again", &fx.admin)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::AlreadyProcessed { entity: "income", .. }));
}
