//! Sales service tests against the in-memory store.

use rust_decimal_macros::dec;
use simba_shared::types::{Currency, Money, PageRequest};

use super::*;
use crate::access::Module;
use crate::error::CoreError;
use crate::inventory::{ApprovalStatus, StockOutPurpose};
use crate::ledger::PaymentMethod;
use crate::reconciliation::ReconcileOutcome;
use crate::store::{SaleFilter, SaleRepository, StockRepository, Store, StoreTx};
use crate::testing::{Fixture, Line, clerk, tsh, units};

fn cash(amount: rust_decimal::Decimal) -> NewPayment {
    NewPayment {
        amount: tsh(amount),
        method: PaymentMethod::Cash,
        reference_number: None,
        notes: None,
    }
}

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

// ========== Drafting ==========

#[tokio::test]
async fn test_totals_follow_items_and_tax() {
    let fx = Fixture::new();
    let salt = fx.item("Sodium Chloride", 50, dec!(1000)).await;
    let sale = fx
        .draft_sale(&[Line {
            item_id: salt.id,
            quantity: 10,
            unit_price: dec!(1000),
            tax_rate: dec!(18),
        }])
        .await;

    assert_eq!(sale.status, SaleStatus::Draft);
    assert!(sale.sale_number.starts_with("SALE-"));
    assert_eq!(sale.totals.total_amount, tsh(dec!(10000)));
    assert_eq!(sale.totals.tax_amount, tsh(dec!(1800)));
    assert_eq!(sale.totals.net_amount, tsh(dec!(11800)));
    assert_eq!(sale.totals.balance_due, tsh(dec!(11800)));
    assert!(!sale.totals.is_paid);
}

#[tokio::test]
async fn test_add_item_defaults_to_selling_price() {
    let fx = Fixture::new();
    let salt = fx.item("Sodium Chloride", 50, dec!(1250)).await;
    let sale = fx.draft_sale(&[]).await;

    let sale = fx
        .services
        .sales
        .add_item(
            sale.id,
            NewSaleItem {
                item_id: salt.id,
                quantity: units(2),
                unit_price: None,
                tax_rate: dec!(0),
            },
            &fx.admin,
        )
        .await
        .unwrap();
    assert_eq!(sale.items[0].unit_price, tsh(dec!(1250)));
    assert_eq!(sale.totals.net_amount, tsh(dec!(2500)));
}

#[tokio::test]
async fn test_add_item_rejects_duplicate_line() {
    let fx = Fixture::new();
    let salt = fx.item("Sodium Chloride", 50, dec!(1000)).await;
    let sale = fx
        .draft_sale(&[Line {
            item_id: salt.id,
            quantity: 1,
            unit_price: dec!(1000),
            tax_rate: dec!(0),
        }])
        .await;

    let err = fx
        .services
        .sales
        .add_item(
            sale.id,
            NewSaleItem {
                item_id: salt.id,
                quantity: units(1),
                unit_price: None,
                tax_rate: dec!(0),
            },
            &fx.admin,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}

#[tokio::test]
async fn test_add_item_checks_stock_on_hand() {
    let fx = Fixture::new();
    let salt = fx.item("Sodium Chloride", 5, dec!(1000)).await;
    let sale = fx.draft_sale(&[]).await;

    let err = fx
        .services
        .sales
        .add_item(
            sale.id,
            NewSaleItem {
                item_id: salt.id,
                quantity: units(6),
                unit_price: None,
                tax_rate: dec!(0),
            },
            &fx.admin,
        )
        .await
        .unwrap_err();
    let CoreError::InsufficientStock(shortages) = err else {
        panic!("expected insufficient stock, got {err:?}");
    };
    assert_eq!(shortages[0].available, units(5));
    assert_eq!(shortages[0].requested, units(6));
}

#[tokio::test]
async fn test_add_item_rejects_out_of_range_tax() {
    let fx = Fixture::new();
    let salt = fx.item("Sodium Chloride", 5, dec!(1000)).await;
    let sale = fx.draft_sale(&[]).await;

    let err = fx
        .services
        .sales
        .add_item(
            sale.id,
            NewSaleItem {
                item_id: salt.id,
                quantity: units(1),
                unit_price: None,
                tax_rate: dec!(101),
            },
            &fx.admin,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}

#[tokio::test]
async fn test_remove_item_recomputes_totals() {
    let fx = Fixture::new();
    let fine = fx.item("Fine Salt", 5, dec!(1000)).await;
    let coarse = fx.item("Coarse Salt", 5, dec!(500)).await;
    let sale = fx
        .draft_sale(&[
            Line { item_id: fine.id, quantity: 2, unit_price: dec!(1000), tax_rate: dec!(0) },
            Line { item_id: coarse.id, quantity: 2, unit_price: dec!(500), tax_rate: dec!(0) },
        ])
        .await;
    assert_eq!(sale.totals.net_amount, tsh(dec!(3000)));

    let line = sale.item_line(fine.id).unwrap().id;
    let sale = fx.services.sales.remove_item(sale.id, line, &fx.admin).await.unwrap();
    assert_eq!(sale.items.len(), 1);
    assert_eq!(sale.totals.net_amount, tsh(dec!(1000)));

    let stored = fx.services.sales.get_sale(sale.id).await.unwrap();
    assert_eq!(stored.items.len(), 1);
    assert_eq!(stored.totals, sale.totals);
}

#[tokio::test]
async fn test_discount_reduces_net_and_must_stay_below_gross() {
    let fx = Fixture::new();
    let salt = fx.item("Sodium Chloride", 50, dec!(1000)).await;
    let sale = fx
        .draft_sale(&[Line {
            item_id: salt.id,
            quantity: 10,
            unit_price: dec!(1000),
            tax_rate: dec!(18),
        }])
        .await;

    let sale = fx
        .services
        .sales
        .set_discount(sale.id, tsh(dec!(800)), &fx.admin)
        .await
        .unwrap();
    assert_eq!(sale.totals.net_amount, tsh(dec!(11000)));

    let err = fx
        .services
        .sales
        .set_discount(sale.id, tsh(dec!(11800)), &fx.admin)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    let err = fx
        .services
        .sales
        .set_discount(sale.id, Money::new(dec!(10), Currency::Usd), &fx.admin)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Money(_)));
}

#[tokio::test]
async fn test_items_are_frozen_after_draft() {
    let fx = Fixture::new();
    let sale = salt_sale(&fx).await;
    let other = fx.item("Rock Salt", 5, dec!(700)).await;

    let err = fx
        .services
        .sales
        .add_item(
            sale.id,
            NewSaleItem {
                item_id: other.id,
                quantity: units(1),
                unit_price: None,
                tax_rate: dec!(0),
            },
            &fx.admin,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidTransition { entity: "sale", .. }));
}

// ========== Lifecycle ==========

#[tokio::test]
async fn test_approve_requires_items() {
    let fx = Fixture::new();
    let sale = fx.draft_sale(&[]).await;

    let err = fx.services.sales.submit(sale.id, &fx.admin).await.unwrap_err();
    assert!(matches!(err, CoreError::EmptySale(id) if id == sale.id));
    let err = fx.services.sales.approve(sale.id, &fx.admin).await.unwrap_err();
    assert!(matches!(err, CoreError::EmptySale(_)));
}

#[tokio::test]
async fn test_submit_then_approve_records_approver() {
    let fx = Fixture::new();
    let sale = salt_sale(&fx).await;

    assert_eq!(sale.status, SaleStatus::Approved);
    assert_eq!(sale.approved_by, Some(fx.admin.id));
    assert!(sale.approved_at.is_some());

    let err = fx.services.sales.submit(sale.id, &fx.admin).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidTransition { action: "submit", .. }));
}

#[tokio::test]
async fn test_request_stock_out_creates_linked_request() {
    let fx = Fixture::new();
    let sale = salt_sale(&fx).await;

    let (sale, stock_out) = fx.services.sales.request_stock_out(sale.id, &fx.admin).await.unwrap();

    assert_eq!(sale.status, SaleStatus::StockOutPending);
    assert_eq!(sale.inventory_stock_out, Some(stock_out.id));
    assert!(sale.is_stock_out_requested);
    assert!(sale.stock_out_request_date.is_some());

    assert_eq!(stock_out.purpose, StockOutPurpose::Sale);
    assert_eq!(stock_out.linked_sale, Some(sale.id));
    assert_eq!(stock_out.reference.as_deref(), Some(sale.sale_number.as_str()));
    assert_eq!(stock_out.lines.len(), 1);
    assert_eq!(stock_out.lines[0].quantity, units(10));
    assert!(stock_out.review.is_pending());

    let item = fx.services.inventory.get_item(stock_out.lines[0].item_id).await.unwrap();
    assert_eq!(item.quantity, units(50));
}

#[tokio::test]
async fn test_request_stock_out_twice_is_refused() {
    let fx = Fixture::new();
    let sale = salt_sale(&fx).await;
    fx.services.sales.request_stock_out(sale.id, &fx.admin).await.unwrap();

    let err = fx.services.sales.request_stock_out(sale.id, &fx.admin).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidTransition { .. }));
}

#[tokio::test]
async fn test_live_stock_out_link_blocks_a_second_request() {
    let fx = Fixture::new();
    let sale = salt_sale(&fx).await;
    let (_, stock_out) = fx.services.sales.request_stock_out(sale.id, &fx.admin).await.unwrap();

    // An approved sale still pointing at a pending request.
    let mut tx = fx.store.begin().await.unwrap();
    let mut stored = tx.find_sale_for_update(sale.id).await.unwrap().unwrap();
    stored.status = SaleStatus::Approved;
    tx.update_sale(&stored).await.unwrap();
    tx.commit().await.unwrap();

    let err = fx.services.sales.request_stock_out(sale.id, &fx.admin).await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::StockOutAlreadyExists { stock_out_id, .. } if stock_out_id == stock_out.id
    ));
    assert!(fx.services.inventory.get_stock_out(stock_out.id).await.unwrap().review.is_pending());
}

#[tokio::test]
async fn test_request_stock_out_rechecks_stock() {
    let fx = Fixture::new();
    let salt = fx.item("Sodium Chloride", 10, dec!(1000)).await;
    let sale = fx
        .approved_sale(&[Line {
            item_id: salt.id,
            quantity: 10,
            unit_price: dec!(1000),
            tax_rate: dec!(0),
        }])
        .await;

    let drain = fx
        .services
        .inventory
        .create_stock_out(salt.id, units(5), StockOutPurpose::Damage, None, &fx.admin)
        .await
        .unwrap();
    fx.services.inventory.approve_stock_out(drain.id, &fx.admin).await.unwrap();

    let err = fx.services.sales.request_stock_out(sale.id, &fx.admin).await.unwrap_err();
    assert!(matches!(err, CoreError::InsufficientStock(_)));
    let stored = fx.services.sales.get_sale(sale.id).await.unwrap();
    assert_eq!(stored.status, SaleStatus::Approved);
    assert_eq!(stored.inventory_stock_out, None);
}

// ========== Payments ==========

#[tokio::test]
async fn test_payments_reduce_balance_until_paid() {
    let fx = Fixture::new();
    let sale = salt_sale(&fx).await;
    let sales = &fx.services.sales;

    let sale = sales.record_payment(sale.id, cash(dec!(5000)), &fx.admin).await.unwrap();
    assert_eq!(sale.totals.amount_paid, tsh(dec!(5000)));
    assert_eq!(sale.totals.balance_due, tsh(dec!(6800)));
    assert!(!sale.totals.is_paid);

    let sale = sales.record_payment(sale.id, cash(dec!(6799.99)), &fx.admin).await.unwrap();
    assert_eq!(sale.totals.balance_due, tsh(dec!(0.01)));
    assert!(!sale.totals.is_paid);

    let sale = sales.record_payment(sale.id, cash(dec!(0.01)), &fx.admin).await.unwrap();
    assert!(sale.totals.balance_due.is_zero());
    assert!(sale.totals.is_paid);
    assert_eq!(sale.payments.len(), 3);
}

#[tokio::test]
async fn test_overpayment_is_refused() {
    let fx = Fixture::new();
    let sale = salt_sale(&fx).await;

    let err = fx
        .services
        .sales
        .record_payment(sale.id, cash(dec!(11800.01)), &fx.admin)
        .await
        .unwrap_err();
    let CoreError::ExceedsBalance { amount, balance_due } = err else {
        panic!("expected exceeds balance, got {err:?}");
    };
    assert_eq!(amount, tsh(dec!(11800.01)));
    assert_eq!(balance_due, tsh(dec!(11800)));
    assert!(fx.services.sales.get_sale(sale.id).await.unwrap().payments.is_empty());
}

#[tokio::test]
async fn test_drafts_do_not_take_payments() {
    let fx = Fixture::new();
    let salt = fx.item("Sodium Chloride", 50, dec!(1000)).await;
    let sale = fx
        .draft_sale(&[Line {
            item_id: salt.id,
            quantity: 1,
            unit_price: dec!(1000),
            tax_rate: dec!(0),
        }])
        .await;

    let err = fx
        .services
        .sales
        .record_payment(sale.id, cash(dec!(100)), &fx.admin)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidTransition { .. }));

    let err = fx
        .services
        .sales
        .record_payment(sale.id, cash(dec!(0)), &fx.admin)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}

// ========== Cancellation ==========

#[tokio::test]
async fn test_cancel_voids_pending_stock_out() {
    let fx = Fixture::new();
    let sale = salt_sale(&fx).await;
    let (_, stock_out) = fx.services.sales.request_stock_out(sale.id, &fx.admin).await.unwrap();

    let sale = fx
        .services
        .sales
        .cancel(sale.id, Some("customer withdrew"), &fx.admin)
        .await
        .unwrap();
    assert_eq!(sale.status, SaleStatus::Cancelled);
    assert_eq!(sale.inventory_stock_out, None);
    assert!(!sale.is_stock_out_requested);

    let err = fx.services.inventory.get_stock_out(stock_out.id).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound { entity: "stock_out", .. }));
    let item = fx.services.inventory.get_item(stock_out.lines[0].item_id).await.unwrap();
    assert_eq!(item.quantity, units(50));
}

#[tokio::test]
async fn test_cancel_is_refused_once_stock_left() {
    let fx = Fixture::new();
    let sale = salt_sale(&fx).await;
    let (_, stock_out) = fx.services.sales.request_stock_out(sale.id, &fx.admin).await.unwrap();

    // Stock left but the sale was never reconciled.
    let mut tx = fx.store.begin().await.unwrap();
    let mut approved = tx.find_stock_out_for_update(stock_out.id).await.unwrap().unwrap();
    approved
        .review
        .approve("stock_out", stock_out.id.into_inner(), fx.admin.id, chrono::Utc::now())
        .unwrap();
    tx.update_stock_out(&approved).await.unwrap();
    tx.commit().await.unwrap();

    let err = fx.services.sales.cancel(sale.id, None, &fx.admin).await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::HasApprovedStockOut { stock_out_id, .. } if stock_out_id == stock_out.id
    ));

    let outcome = fx
        .services
        .reconciler
        .reconcile_stock_out(stock_out.id, &fx.admin)
        .await
        .unwrap();
    assert!(matches!(outcome, ReconcileOutcome::Reconciled { .. }));
    let sale = fx.services.sales.get_sale(sale.id).await.unwrap();
    assert_eq!(sale.status, SaleStatus::Completed);
    assert_eq!(
        fx.services.inventory.get_stock_out(stock_out.id).await.unwrap().review.status,
        ApprovalStatus::Approved
    );
}

#[tokio::test]
async fn test_completed_sale_cannot_be_cancelled() {
    let fx = Fixture::new();
    let sale = salt_sale(&fx).await;
    let (_, stock_out) = fx.services.sales.request_stock_out(sale.id, &fx.admin).await.unwrap();
    fx.services.inventory.approve_stock_out(stock_out.id, &fx.admin).await.unwrap();

    let err = fx.services.sales.cancel(sale.id, None, &fx.admin).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidTransition { action: "cancel", .. }));
}

// ========== Customers & Reads ==========

#[tokio::test]
async fn test_customer_names_are_unique() {
    let fx = Fixture::new();
    fx.customer("Mama Ntilie").await;

    let err = fx
        .services
        .sales
        .create_customer(
            NewCustomer {
                name: "mama ntilie".into(),
                ..NewCustomer::default()
            },
            &fx.admin,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Duplicate { entity: "customer", .. }));
}

#[tokio::test]
async fn test_sales_mutations_require_sales_capability() {
    let fx = Fixture::new();
    let sale = salt_sale(&fx).await;

    let err = fx
        .services
        .sales
        .request_stock_out(sale.id, &clerk(&[Module::Inventory]))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::PermissionDenied { module: Module::Sales, .. }));
}

#[tokio::test]
async fn test_list_sales_filters_by_status() {
    let fx = Fixture::new();
    let approved = salt_sale(&fx).await;
    fx.draft_sale(&[]).await;

    let filter = SaleFilter {
        status: Some(SaleStatus::Approved),
        ..SaleFilter::default()
    };
    let page = fx
        .services
        .sales
        .list_sales(&filter, PageRequest::new(1, 20))
        .await
        .unwrap();
    assert_eq!(page.meta.total, 1);
    assert_eq!(page.data[0].id, approved.id);
    assert_eq!(page.data[0].net_amount, tsh(dec!(11800)));
}
