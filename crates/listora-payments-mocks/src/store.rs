//! In-memory payment store for testing the PaymentStore trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use listora_payments::{
	FulfillmentPlan, NewPayment, Payment, PaymentStatus, PaymentStore, StoreError,
	SubscriptionPlan, SubscriptionStatus, UserSubscription,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// An ad row with its entitlement fields, as the fulfillment writes see
/// them.
#[derive(Debug, Clone)]
pub struct AdRecord {
	/// Owning user
	pub user_id: Uuid,
	/// Last bump time
	pub bumped_at: Option<DateTime<Utc>>,
	/// End of the bump window
	pub bump_expires_at: Option<DateTime<Utc>>,
	/// Featured flag
	pub is_featured: bool,
	/// Start of the featured window
	pub featured_at: Option<DateTime<Utc>>,
	/// End of the featured window
	pub featured_until: Option<DateTime<Utc>>,
	/// Urgent flag
	pub is_urgent: bool,
	/// Start of the urgent window
	pub urgent_at: Option<DateTime<Utc>>,
	/// End of the urgent window
	pub urgent_until: Option<DateTime<Utc>>,
}

impl AdRecord {
	fn new(user_id: Uuid) -> Self {
		Self {
			user_id,
			bumped_at: None,
			bump_expires_at: None,
			is_featured: false,
			featured_at: None,
			featured_until: None,
			is_urgent: false,
			urgent_at: None,
			urgent_until: None,
		}
	}
}

#[derive(Default)]
struct State {
	payments: HashMap<Uuid, Payment>,
	by_reference: HashMap<String, Uuid>,
	plans: HashMap<Uuid, SubscriptionPlan>,
	ads: HashMap<Uuid, AdRecord>,
	subscriptions: Vec<UserSubscription>,
	fulfillment_applications: usize,
	fail_next_fulfillment: bool,
}

/// In-memory store implementing the full ledger contract.
///
/// All operations run under one mutex, so the guard-plus-fulfillment
/// step is atomic exactly like the production transaction. A scripted
/// fulfillment failure leaves every row untouched, mirroring rollback.
pub struct MemoryPaymentStore {
	state: Arc<Mutex<State>>,
}

impl MemoryPaymentStore {
	/// Creates an empty store.
	#[must_use]
	pub fn new() -> Self {
		Self {
			state: Arc::new(Mutex::new(State::default())),
		}
	}

	/// Seeds an ad owned by `user_id` and returns its id.
	pub async fn insert_ad(&self, user_id: Uuid) -> Uuid {
		let ad_id = Uuid::new_v4();
		self.state
			.lock()
			.await
			.ads
			.insert(ad_id, AdRecord::new(user_id));
		ad_id
	}

	/// Seeds a subscription plan.
	pub async fn insert_plan(&self, plan: SubscriptionPlan) {
		self.state.lock().await.plans.insert(plan.id, plan);
	}

	/// Current entitlement fields of an ad.
	pub async fn ad(&self, ad_id: Uuid) -> Option<AdRecord> {
		self.state.lock().await.ads.get(&ad_id).cloned()
	}

	/// Current payment record for a reference.
	pub async fn payment(&self, reference: &str) -> Option<Payment> {
		let state = self.state.lock().await;
		let id = state.by_reference.get(reference)?;
		state.payments.get(id).cloned()
	}

	/// All granted subscription periods.
	pub async fn subscriptions(&self) -> Vec<UserSubscription> {
		self.state.lock().await.subscriptions.clone()
	}

	/// Number of granted subscription periods.
	pub async fn subscription_count(&self) -> usize {
		self.state.lock().await.subscriptions.len()
	}

	/// How many times a fulfillment plan has been applied.
	pub async fn fulfillment_applications(&self) -> usize {
		self.state.lock().await.fulfillment_applications
	}

	/// Makes the next winning fulfillment fail, mimicking a write fault
	/// inside the transaction. The guard transition rolls back with it.
	pub async fn set_fail_next_fulfillment(&self, fail: bool) {
		self.state.lock().await.fail_next_fulfillment = fail;
	}

	fn apply_plan(state: &mut State, plan: &FulfillmentPlan) -> Result<(), StoreError> {
		match plan {
			FulfillmentPlan::Bump {
				ad_id,
				bumped_at,
				bump_expires_at,
			} => {
				let ad = state
					.ads
					.get_mut(ad_id)
					.ok_or_else(|| StoreError::Fulfillment(format!("ad {ad_id} not found")))?;
				ad.bumped_at = Some(*bumped_at);
				ad.bump_expires_at = Some(*bump_expires_at);
			}
			FulfillmentPlan::Feature {
				ad_id,
				featured_at,
				featured_until,
			} => {
				let ad = state
					.ads
					.get_mut(ad_id)
					.ok_or_else(|| StoreError::Fulfillment(format!("ad {ad_id} not found")))?;
				ad.is_featured = true;
				ad.featured_at = Some(*featured_at);
				ad.featured_until = Some(*featured_until);
			}
			FulfillmentPlan::Urgent {
				ad_id,
				urgent_at,
				urgent_until,
			} => {
				let ad = state
					.ads
					.get_mut(ad_id)
					.ok_or_else(|| StoreError::Fulfillment(format!("ad {ad_id} not found")))?;
				ad.is_urgent = true;
				ad.urgent_at = Some(*urgent_at);
				ad.urgent_until = Some(*urgent_until);
			}
			FulfillmentPlan::Subscription {
				user_id,
				plan_id,
				payment_reference,
				start_date,
				end_date,
			} => {
				if !state.plans.contains_key(plan_id) {
					return Err(StoreError::Fulfillment(format!("plan {plan_id} not found")));
				}
				state.subscriptions.push(UserSubscription {
					id: Uuid::new_v4(),
					user_id: *user_id,
					plan_id: *plan_id,
					payment_reference: payment_reference.clone(),
					start_date: *start_date,
					end_date: *end_date,
					status: SubscriptionStatus::Active,
				});
			}
		}
		state.fulfillment_applications += 1;
		Ok(())
	}
}

impl Default for MemoryPaymentStore {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl PaymentStore for MemoryPaymentStore {
	async fn create_payment(&self, new: NewPayment) -> Result<Payment, StoreError> {
		let mut state = self.state.lock().await;
		if state.by_reference.contains_key(&new.reference) {
			return Err(StoreError::DuplicateReference(new.reference));
		}

		let payment = Payment {
			id: Uuid::new_v4(),
			user_id: new.user_id,
			ad_id: new.ad_id,
			subscription_plan_id: new.subscription_plan_id,
			service: new.service,
			amount: new.amount,
			reference: new.reference,
			status: PaymentStatus::Pending,
			gateway_payload: None,
			verified_at: None,
			created_at: Utc::now(),
		};
		state
			.by_reference
			.insert(payment.reference.clone(), payment.id);
		state.payments.insert(payment.id, payment.clone());
		Ok(payment)
	}

	async fn find_by_reference(
		&self,
		reference: &str,
		owner: Option<Uuid>,
	) -> Result<Option<Payment>, StoreError> {
		let state = self.state.lock().await;
		let payment = state
			.by_reference
			.get(reference)
			.and_then(|id| state.payments.get(id));
		Ok(payment
			.filter(|p| owner.map_or(true, |user_id| p.user_id == user_id))
			.cloned())
	}

	async fn find_plan(&self, plan_id: Uuid) -> Result<Option<SubscriptionPlan>, StoreError> {
		Ok(self.state.lock().await.plans.get(&plan_id).cloned())
	}

	async fn find_ad_owner(&self, ad_id: Uuid) -> Result<Option<Uuid>, StoreError> {
		Ok(self
			.state
			.lock()
			.await
			.ads
			.get(&ad_id)
			.map(|ad| ad.user_id))
	}

	async fn transition(
		&self,
		payment_id: Uuid,
		from: PaymentStatus,
		to: PaymentStatus,
		payload: Option<serde_json::Value>,
	) -> Result<bool, StoreError> {
		let mut state = self.state.lock().await;
		let Some(payment) = state.payments.get_mut(&payment_id) else {
			return Ok(false);
		};
		if payment.status != from {
			return Ok(false);
		}

		payment.status = to;
		if payload.is_some() {
			payment.gateway_payload = payload;
		}
		payment.verified_at = Some(Utc::now());
		Ok(true)
	}

	async fn complete_and_fulfill(
		&self,
		payment_id: Uuid,
		payload: serde_json::Value,
		plan: &FulfillmentPlan,
	) -> Result<bool, StoreError> {
		let mut state = self.state.lock().await;

		let Some(payment) = state.payments.get(&payment_id) else {
			return Ok(false);
		};
		if payment.status != PaymentStatus::Pending {
			return Ok(false);
		}

		if std::mem::take(&mut state.fail_next_fulfillment) {
			// Rollback: no row was touched.
			return Err(StoreError::Fulfillment(
				"injected fulfillment failure".to_string(),
			));
		}

		Self::apply_plan(&mut state, plan)?;

		// The guard held and fulfillment applied; commit the transition.
		if let Some(payment) = state.payments.get_mut(&payment_id) {
			payment.status = PaymentStatus::Completed;
			payment.gateway_payload = Some(payload);
			payment.verified_at = Some(Utc::now());
		}
		Ok(true)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use listora_payments::ServiceKind;

	fn new_payment(reference: &str) -> NewPayment {
		NewPayment {
			user_id: Uuid::new_v4(),
			ad_id: None,
			subscription_plan_id: None,
			service: ServiceKind::Bump,
			amount: 50_000,
			reference: reference.to_string(),
		}
	}

	#[tokio::test]
	async fn test_duplicate_reference_is_rejected() {
		let store = MemoryPaymentStore::new();
		store.create_payment(new_payment("R1")).await.expect("first insert");
		let result = store.create_payment(new_payment("R1")).await;
		assert!(matches!(result, Err(StoreError::DuplicateReference(_))));
	}

	#[tokio::test]
	async fn test_owner_scoped_lookup_hides_foreign_payments() {
		let store = MemoryPaymentStore::new();
		let payment = store.create_payment(new_payment("R1")).await.expect("insert");

		let other = Uuid::new_v4();
		assert!(store
			.find_by_reference("R1", Some(other))
			.await
			.expect("lookup")
			.is_none());
		assert!(store
			.find_by_reference("R1", Some(payment.user_id))
			.await
			.expect("lookup")
			.is_some());
	}

	#[tokio::test]
	async fn test_conditional_transition_has_one_winner() {
		let store = MemoryPaymentStore::new();
		let payment = store.create_payment(new_payment("R1")).await.expect("insert");

		let first = store
			.transition(payment.id, PaymentStatus::Pending, PaymentStatus::Failed, None)
			.await
			.expect("transition");
		let second = store
			.transition(payment.id, PaymentStatus::Pending, PaymentStatus::Failed, None)
			.await
			.expect("transition");

		assert!(first);
		assert!(!second);
	}

	#[tokio::test]
	async fn test_completed_payment_rejects_further_pending_transitions() {
		let store = MemoryPaymentStore::new();
		let payment = store.create_payment(new_payment("R1")).await.expect("insert");

		store
			.transition(payment.id, PaymentStatus::Pending, PaymentStatus::Completed, None)
			.await
			.expect("transition");
		let failed_late = store
			.transition(payment.id, PaymentStatus::Pending, PaymentStatus::Failed, None)
			.await
			.expect("transition");
		assert!(!failed_late);

		let record = store.payment("R1").await.expect("record");
		assert_eq!(record.status, PaymentStatus::Completed);
	}
}
