//! Property-based tests for SaleWorkflow.
//!
//! Every transition function must agree with the declared transition table.

use proptest::prelude::*;

use crate::sales::types::SaleStatus;
use crate::sales::workflow::SaleWorkflow;

/// Strategy for generating random SaleStatus values.
fn arb_status() -> impl Strategy<Value = SaleStatus> {
    prop::sample::select(SaleStatus::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every successful transition is listed in the table.
    #[test]
    fn prop_transitions_are_in_table(status in arb_status()) {
        let results = [
            SaleWorkflow::submit(status),
            SaleWorkflow::approve(status),
            SaleWorkflow::request_stock_out(status),
            SaleWorkflow::complete(status),
            SaleWorkflow::stock_out_rejected(status),
            SaleWorkflow::cancel(status),
        ];
        for next in results.into_iter().flatten() {
            prop_assert!(SaleWorkflow::is_valid_transition(status, next),
                "{} -> {} not in table", status, next);
        }
    }

    /// Terminal states never move.
    #[test]
    fn prop_terminal_states_are_final(status in arb_status(), target in arb_status()) {
        if status.is_terminal() {
            prop_assert!(!SaleWorkflow::is_valid_transition(status, target));
        }
    }

    /// Cancellation is reachable from exactly the non-terminal states.
    #[test]
    fn prop_cancel_iff_not_terminal(status in arb_status()) {
        prop_assert_eq!(SaleWorkflow::cancel(status).is_ok(), !status.is_terminal());
    }

    /// COMPLETED is only reached through a pending stock-out.
    #[test]
    fn prop_completion_requires_pending_stock_out(status in arb_status()) {
        prop_assert_eq!(
            SaleWorkflow::is_valid_transition(status, SaleStatus::Completed),
            status == SaleStatus::StockOutPending
        );
    }

    /// Status strings round-trip.
    #[test]
    fn prop_status_parse_round_trip(status in arb_status()) {
        prop_assert_eq!(SaleStatus::parse(status.as_str()), Some(status));
        prop_assert_eq!(SaleStatus::parse(&status.as_str().to_lowercase()), Some(status));
    }
}
