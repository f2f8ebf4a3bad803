//! Sale aggregate: header, items, payments, totals, and the status machine.

pub mod service;
pub mod totals;
pub mod types;
pub mod workflow;

#[cfg(test)]
mod tests;
#[cfg(test)]
mod totals_props;
#[cfg(test)]
mod workflow_props;

pub use service::{NewCustomer, NewPayment, NewSale, NewSaleItem, SalesService};
pub use totals::SaleTotals;
pub use types::{Customer, CustomerType, Payment, Sale, SaleItem, SaleStatus, SaleSummary, SaleType};
pub use workflow::SaleWorkflow;
