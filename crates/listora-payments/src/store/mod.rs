//! Payment record store.
//!
//! The store is the single serialization point of the subsystem: the
//! conditional transition is a row-level compare-and-swap, and
//! [`PaymentStore::complete_and_fulfill`] performs that swap together
//! with the fulfillment writes in one transaction. No payment state is
//! cached in memory across requests.

mod postgres;

pub use postgres::PgPaymentStore;

use crate::error::StoreError;
use crate::fulfillment::FulfillmentPlan;
use crate::types::{NewPayment, Payment, PaymentStatus, SubscriptionPlan};
use async_trait::async_trait;
use uuid::Uuid;

/// Persistent ledger of payment attempts and their terminal outcome.
#[async_trait]
pub trait PaymentStore: Send + Sync {
	/// Creates a pending payment record.
	///
	/// The reference is unique; inserting a duplicate fails with
	/// [`StoreError::DuplicateReference`].
	async fn create_payment(&self, new: NewPayment) -> Result<Payment, StoreError>;

	/// Looks up a payment by reference, optionally scoped to an owner.
	///
	/// With `owner` set, a payment owned by someone else is reported as
	/// absent rather than as a distinguishable record.
	async fn find_by_reference(
		&self,
		reference: &str,
		owner: Option<Uuid>,
	) -> Result<Option<Payment>, StoreError>;

	/// Looks up a subscription plan.
	async fn find_plan(&self, plan_id: Uuid) -> Result<Option<SubscriptionPlan>, StoreError>;

	/// Looks up the owner of an ad.
	async fn find_ad_owner(&self, ad_id: Uuid) -> Result<Option<Uuid>, StoreError>;

	/// Conditionally transitions a payment from one status to another.
	///
	/// Returns `true` and records the payload and verification time only
	/// if the row currently holds `from`; returns `false` without any
	/// mutation otherwise. This compare-and-swap is what makes duplicate
	/// and concurrent confirmations converge on one winner.
	async fn transition(
		&self,
		payment_id: Uuid,
		from: PaymentStatus,
		to: PaymentStatus,
		payload: Option<serde_json::Value>,
	) -> Result<bool, StoreError>;

	/// Completes a pending payment and applies its fulfillment plan in
	/// one transaction.
	///
	/// Returns `false` when the guard is lost (the row was no longer
	/// pending); nothing is written in that case. When any fulfillment
	/// write fails the whole transaction rolls back and the payment
	/// stays pending, never completed without its side effects.
	async fn complete_and_fulfill(
		&self,
		payment_id: Uuid,
		payload: serde_json::Value,
		plan: &FulfillmentPlan,
	) -> Result<bool, StoreError>;
}
