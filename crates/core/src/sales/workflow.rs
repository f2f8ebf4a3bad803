//! Sale status transitions.

use super::types::SaleStatus;
use crate::error::CoreError;

/// Stateless validator for sale status transitions.
///
/// Each function takes the current status and returns the next one, or
/// [`CoreError::InvalidTransition`] if the action is not allowed from it.
pub struct SaleWorkflow;

impl SaleWorkflow {
    fn invalid(from: SaleStatus, action: &'static str) -> CoreError {
        CoreError::InvalidTransition {
            entity: "sale",
            status: from.to_string(),
            action,
        }
    }

    /// DRAFT → PENDING.
    pub fn submit(current: SaleStatus) -> Result<SaleStatus, CoreError> {
        match current {
            SaleStatus::Draft => Ok(SaleStatus::Pending),
            _ => Err(Self::invalid(current, "submit")),
        }
    }

    /// DRAFT or PENDING → APPROVED.
    pub fn approve(current: SaleStatus) -> Result<SaleStatus, CoreError> {
        match current {
            SaleStatus::Draft | SaleStatus::Pending => Ok(SaleStatus::Approved),
            _ => Err(Self::invalid(current, "approve")),
        }
    }

    /// APPROVED → STOCK_OUT_PENDING.
    pub fn request_stock_out(current: SaleStatus) -> Result<SaleStatus, CoreError> {
        match current {
            SaleStatus::Approved => Ok(SaleStatus::StockOutPending),
            _ => Err(Self::invalid(current, "request stock out for")),
        }
    }

    /// STOCK_OUT_PENDING → COMPLETED, once inventory approves the stock-out.
    pub fn complete(current: SaleStatus) -> Result<SaleStatus, CoreError> {
        match current {
            SaleStatus::StockOutPending => Ok(SaleStatus::Completed),
            _ => Err(Self::invalid(current, "complete")),
        }
    }

    /// STOCK_OUT_PENDING → APPROVED, once inventory rejects the stock-out.
    pub fn stock_out_rejected(current: SaleStatus) -> Result<SaleStatus, CoreError> {
        match current {
            SaleStatus::StockOutPending => Ok(SaleStatus::Approved),
            _ => Err(Self::invalid(current, "revert stock out for")),
        }
    }

    /// Any non-terminal status → CANCELLED.
    pub fn cancel(current: SaleStatus) -> Result<SaleStatus, CoreError> {
        if current.is_terminal() {
            Err(Self::invalid(current, "cancel"))
        } else {
            Ok(SaleStatus::Cancelled)
        }
    }

    /// Items, discount, and lines may only change while drafting.
    pub fn ensure_editable(current: SaleStatus, action: &'static str) -> Result<(), CoreError> {
        if current == SaleStatus::Draft {
            Ok(())
        } else {
            Err(Self::invalid(current, action))
        }
    }

    /// Payments are accepted from approval onwards, including after completion.
    pub fn ensure_accepts_payment(current: SaleStatus) -> Result<(), CoreError> {
        match current {
            SaleStatus::Draft | SaleStatus::Cancelled => Err(Self::invalid(current, "record payment for")),
            _ => Ok(()),
        }
    }

    /// Check if a status transition is valid.
    ///
    /// Valid transitions:
    /// - Draft → Pending (submit)
    /// - Draft/Pending → Approved (approve)
    /// - Approved → StockOutPending (request stock out)
    /// - StockOutPending → Completed (stock-out approved)
    /// - StockOutPending → Approved (stock-out rejected)
    /// - Any non-terminal → Cancelled (cancel)
    #[must_use]
    pub fn is_valid_transition(from: SaleStatus, to: SaleStatus) -> bool {
        matches!(
            (from, to),
            (SaleStatus::Draft, SaleStatus::Pending | SaleStatus::Approved)
                | (SaleStatus::Pending, SaleStatus::Approved)
                | (SaleStatus::Approved, SaleStatus::StockOutPending)
                | (
                    SaleStatus::StockOutPending,
                    SaleStatus::Completed | SaleStatus::Approved
                )
                | (
                    SaleStatus::Draft
                        | SaleStatus::Pending
                        | SaleStatus::Approved
                        | SaleStatus::StockOutPending,
                    SaleStatus::Cancelled
                )
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let status = SaleWorkflow::approve(SaleStatus::Draft).unwrap();
        let status = SaleWorkflow::request_stock_out(status).unwrap();
        assert_eq!(status, SaleStatus::StockOutPending);
        assert_eq!(SaleWorkflow::complete(status).unwrap(), SaleStatus::Completed);
    }

    #[test]
    fn test_rejection_returns_to_approved() {
        assert_eq!(
            SaleWorkflow::stock_out_rejected(SaleStatus::StockOutPending).unwrap(),
            SaleStatus::Approved
        );
    }

    #[test]
    fn test_cancel_from_terminal_fails() {
        for status in [SaleStatus::Completed, SaleStatus::Cancelled] {
            let err = SaleWorkflow::cancel(status).unwrap_err();
            assert!(matches!(err, CoreError::InvalidTransition { action: "cancel", .. }));
        }
    }

    #[test]
    fn test_edits_only_in_draft() {
        assert!(SaleWorkflow::ensure_editable(SaleStatus::Draft, "add item to").is_ok());
        assert!(SaleWorkflow::ensure_editable(SaleStatus::Approved, "add item to").is_err());
    }

    #[test]
    fn test_payments_refused_in_draft_and_cancelled() {
        assert!(SaleWorkflow::ensure_accepts_payment(SaleStatus::Draft).is_err());
        assert!(SaleWorkflow::ensure_accepts_payment(SaleStatus::Cancelled).is_err());
        assert!(SaleWorkflow::ensure_accepts_payment(SaleStatus::Completed).is_ok());
    }
}
