//! Property-based tests for InventoryService.
//!
//! - Stock never goes negative, whatever order movements are approved in
//! - The on-hand quantity equals the sum of the recorded history deltas

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;
use crate::error::CoreError;
use crate::testing::{Fixture, units};
use simba_shared::types::Quantity;

#[derive(Debug, Clone, Copy)]
enum Movement {
    Receive(i64),
    Remove(i64),
    Adjust(i64),
}

fn movement_strategy() -> impl Strategy<Value = Movement> {
    prop_oneof![
        (1i64..40).prop_map(Movement::Receive),
        (1i64..40).prop_map(Movement::Remove),
        (-30i64..30)
            .prop_filter("non-zero", |d| *d != 0)
            .prop_map(Movement::Adjust),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

async fn apply(fx: &Fixture, item_id: simba_shared::types::ItemId, movement: Movement) -> Result<(), CoreError> {
    let inventory = &fx.services.inventory;
    match movement {
        Movement::Receive(qty) => {
            inventory
                .record_stock_in(
                    NewStockIn {
                        item_id,
                        quantity: units(qty),
                        source: StockInSource::Purchase,
                        supplier: None,
                        reference: None,
                        notes: None,
                        auto_approve: true,
                    },
                    &fx.admin,
                )
                .await?;
        }
        Movement::Remove(qty) => {
            let stock_out = inventory
                .create_stock_out(item_id, units(qty), StockOutPurpose::InternalUse, None, &fx.admin)
                .await?;
            inventory.approve_stock_out(stock_out.id, &fx.admin).await?;
        }
        Movement::Adjust(delta) => {
            let adjustment = inventory
                .request_adjustment(
                    NewAdjustment {
                        item_id,
                        adjustment_quantity: units(delta),
                        adjustment_type: AdjustmentType::PhysicalCount,
                        reason: "cycle count".into(),
                    },
                    &fx.admin,
                )
                .await?;
            inventory.approve_adjustment(adjustment.id, &fx.admin).await?;
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_stock_never_negative(movements in prop::collection::vec(movement_strategy(), 1..20)) {
        let rt = runtime();
        rt.block_on(async {
            let fx = Fixture::new();
            let item = fx.item("Property Salt", 0, dec!(1000)).await;

            for movement in movements {
                match apply(&fx, item.id, movement).await {
                    Ok(()) | Err(CoreError::InsufficientStock(_)) => {}
                    Err(other) => panic!("unexpected error {other:?}"),
                }
                let current = fx.services.inventory.get_item(item.id).await.unwrap();
                assert!(!current.quantity.is_negative());
            }

            let current = fx.services.inventory.get_item(item.id).await.unwrap();
            let history = fx.services.inventory.item_history(item.id).await.unwrap();
            let total: Decimal = history.iter().map(|entry| entry.quantity.value()).sum();
            assert_eq!(current.quantity, Quantity::new(total));
            for entry in &history {
                assert_eq!(Some(entry.new_quantity), entry.previous_quantity.checked_add(entry.quantity));
                assert!(!entry.new_quantity.is_negative());
            }
        });
    }
}
