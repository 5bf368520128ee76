//! Mock implementations for listora-payments testing.
//!
//! [`MockGateway`] scripts gateway verification outcomes per reference
//! and [`MemoryPaymentStore`] implements the full store contract in
//! memory, including the atomic guard-plus-fulfillment transaction and
//! injectable fulfillment failures for exercising rollback behavior.

mod gateway;
mod store;

pub use gateway::MockGateway;
pub use store::{AdRecord, MemoryPaymentStore};
