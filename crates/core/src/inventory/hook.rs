//! Callback run when a sale-linked stock-out is decided.

use std::future::Future;

use crate::access::Actor;
use crate::audit::AuditBatch;
use crate::error::CoreError;
use crate::store::StoreTx;

use super::types::StockOut;

/// Invoked by the inventory service inside the approving or rejecting unit
/// of work, after the stock-out row has been updated. An error aborts that
/// unit of work, including the stock deduction.
pub trait StockOutHook: Send + Sync {
    /// The stock-out was approved and its stock deducted.
    fn stock_out_approved<T: StoreTx>(
        &self,
        tx: &mut T,
        stock_out: &StockOut,
        actor: &Actor,
        audit: &mut AuditBatch,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// The stock-out was rejected; no stock moved.
    fn stock_out_rejected<T: StoreTx>(
        &self,
        tx: &mut T,
        stock_out: &StockOut,
        actor: &Actor,
        audit: &mut AuditBatch,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;
}
