//! Error taxonomy for sale, stock, and ledger operations.
//!
//! Every failure inside a unit of work propagates to the caller and
//! aborts it. Nothing financial is swallowed.

use simba_shared::types::{Money, MoneyError, SaleId, StockOutId, UserId};
use simba_shared::AppError;
use thiserror::Error;
use uuid::Uuid;

use crate::access::Module;
use crate::inventory::StockShortage;
use crate::store::StoreError;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    // ========== Validation Errors ==========
    /// Bad input, rejected before any mutation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Approving a sale without items.
    #[error("Sale {0} has no items")]
    EmptySale(SaleId),

    /// Payment larger than the outstanding balance.
    #[error("Payment of {amount} exceeds balance due of {balance_due}")]
    ExceedsBalance {
        /// Attempted payment.
        amount: Money,
        /// Outstanding balance.
        balance_due: Money,
    },

    /// Money arithmetic failed (currency mismatch, overflow).
    #[error(transparent)]
    Money(#[from] MoneyError),

    // ========== State Errors ==========
    /// State machine violation; the object is unchanged.
    #[error("Cannot {action} {entity} in status {status}")]
    InvalidTransition {
        /// Entity kind.
        entity: &'static str,
        /// Status the entity is in.
        status: String,
        /// Attempted action.
        action: &'static str,
    },

    /// A request that has already been decided.
    #[error("{entity} {id} already processed (status {status})")]
    AlreadyProcessed {
        /// Entity kind.
        entity: &'static str,
        /// Entity id.
        id: Uuid,
        /// Terminal status it is in.
        status: String,
    },

    /// The sale already has a live stock-out request.
    #[error("Sale {sale_id} already has stock out {stock_out_id}")]
    StockOutAlreadyExists {
        /// The sale.
        sale_id: SaleId,
        /// The existing request.
        stock_out_id: StockOutId,
    },

    /// Stock already left for this sale; cancelling needs a return flow.
    #[error("Sale {sale_id} has approved stock out {stock_out_id}")]
    HasApprovedStockOut {
        /// The sale.
        sale_id: SaleId,
        /// The approved request.
        stock_out_id: StockOutId,
    },

    // ========== Stock Errors ==========
    /// Not enough stock; nothing was deducted.
    #[error("Insufficient stock: {}", format_shortages(.0))]
    InsufficientStock(Vec<StockShortage>),

    // ========== Lookup Errors ==========
    /// Entity not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind.
        entity: &'static str,
        /// Lookup key.
        id: String,
    },

    /// Unique key already taken.
    #[error("{entity} already exists: {key}")]
    Duplicate {
        /// Entity kind.
        entity: &'static str,
        /// Conflicting key.
        key: String,
    },

    // ========== Integrity Errors ==========
    /// Data contradicts an invariant; the unit of work aborts.
    #[error("Consistency violation: {0}")]
    ConsistencyViolation(String),

    // ========== Access Errors ==========
    /// The actor lacks the module capability.
    #[error("User {actor} lacks the {module} capability")]
    PermissionDenied {
        /// The actor.
        actor: UserId,
        /// Required module.
        module: Module,
    },

    // ========== Storage Errors ==========
    /// Persistence failure.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

fn format_shortages(shortages: &[StockShortage]) -> String {
    shortages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl CoreError {
    /// Shorthand for [`CoreError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::EmptySale(_) => "EMPTY_SALE",
            Self::ExceedsBalance { .. } => "EXCEEDS_BALANCE",
            Self::Money(MoneyError::CurrencyMismatch { .. }) => "CURRENCY_MISMATCH",
            Self::Money(MoneyError::Overflow) => "AMOUNT_OVERFLOW",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::AlreadyProcessed { .. } => "ALREADY_PROCESSED",
            Self::StockOutAlreadyExists { .. } => "STOCK_OUT_ALREADY_EXISTS",
            Self::HasApprovedStockOut { .. } => "HAS_APPROVED_STOCK_OUT",
            Self::InsufficientStock(_) => "INSUFFICIENT_STOCK",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Duplicate { .. } => "DUPLICATE",
            Self::ConsistencyViolation(_) => "CONSISTENCY_VIOLATION",
            Self::PermissionDenied { .. } => "PERMISSION_DENIED",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::Validation(_) | Self::EmptySale(_) | Self::Money(_) => 400,

            // 403 Forbidden - permission errors
            Self::PermissionDenied { .. } => 403,

            // 404 Not Found
            Self::NotFound { .. } => 404,

            // 409 Conflict - state errors
            Self::InvalidTransition { .. }
            | Self::AlreadyProcessed { .. }
            | Self::StockOutAlreadyExists { .. }
            | Self::HasApprovedStockOut { .. }
            | Self::Duplicate { .. } => 409,

            // 422 Unprocessable - business rules
            Self::ExceedsBalance { .. } | Self::InsufficientStock(_) => 422,

            // 500 Internal Server Error
            Self::ConsistencyViolation(_) | Self::Storage(_) => 500,
        }
    }

    /// Returns true if retrying the whole operation may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(err) if err.is_retryable())
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::Validation(_) | CoreError::EmptySale(_) | CoreError::Money(_) => {
                Self::Validation(message)
            }
            CoreError::PermissionDenied { .. } => Self::Forbidden(message),
            CoreError::NotFound { .. } => Self::NotFound(message),
            CoreError::InvalidTransition { .. }
            | CoreError::AlreadyProcessed { .. }
            | CoreError::StockOutAlreadyExists { .. }
            | CoreError::HasApprovedStockOut { .. }
            | CoreError::Duplicate { .. } => Self::Conflict(message),
            CoreError::ExceedsBalance { .. } | CoreError::InsufficientStock(_) => {
                Self::BusinessRule(message)
            }
            CoreError::ConsistencyViolation(_) => Self::Internal(message),
            CoreError::Storage(_) => Self::Database(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simba_shared::types::{ItemId, Quantity};

    #[test]
    fn test_error_codes_and_statuses() {
        let err = CoreError::EmptySale(SaleId::new());
        assert_eq!(err.error_code(), "EMPTY_SALE");
        assert_eq!(err.http_status_code(), 400);

        let err = CoreError::AlreadyProcessed {
            entity: "stock_out",
            id: Uuid::nil(),
            status: "approved".into(),
        };
        assert_eq!(err.error_code(), "ALREADY_PROCESSED");
        assert_eq!(err.http_status_code(), 409);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_insufficient_stock_lists_every_shortage() {
        let err = CoreError::InsufficientStock(vec![
            StockShortage {
                item_id: ItemId::new(),
                item_name: "Caustic Soda".into(),
                requested: Quantity::units(10),
                available: Quantity::units(5),
            },
            StockShortage {
                item_id: ItemId::new(),
                item_name: "Salt".into(),
                requested: Quantity::units(3),
                available: Quantity::ZERO,
            },
        ]);
        assert_eq!(
            err.to_string(),
            "Insufficient stock: Caustic Soda (requested 10, available 5), Salt (requested 3, available 0)"
        );
        assert_eq!(err.http_status_code(), 422);
    }

    #[test]
    fn test_storage_errors_are_retryable_only_when_transient() {
        assert!(CoreError::Storage(StoreError::Conflict("deadlock".into())).is_retryable());
        assert!(!CoreError::Storage(StoreError::Query("bad sql".into())).is_retryable());
    }

    #[test]
    fn test_into_app_error() {
        let app: AppError = CoreError::not_found("sale", "x").into();
        assert_eq!(app.status_code(), 404);

        let app: AppError = CoreError::ConsistencyViolation("income".into()).into();
        assert_eq!(app.error_code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_app_error_keeps_http_status() {
        let errors = [
            CoreError::Validation("bad".into()),
            CoreError::EmptySale(SaleId::new()),
            CoreError::not_found("item", "x"),
            CoreError::Duplicate {
                entity: "item",
                key: "Salt".into(),
            },
            CoreError::InsufficientStock(Vec::new()),
            CoreError::ConsistencyViolation("income".into()),
            CoreError::Storage(StoreError::Query("bad sql".into())),
        ];
        for err in errors {
            let status = err.http_status_code();
            assert_eq!(AppError::from(err).status_code(), status);
        }
    }
}
