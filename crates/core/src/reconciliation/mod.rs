//! Sale → stock-out → income reconciliation.

pub mod reconciler;

#[cfg(test)]
mod tests;

pub use reconciler::{ReconcileOutcome, Reconciler, apply_approved, apply_rejected};
