//! Confirmation service: the two entry points that drive the payment
//! state machine.
//!
//! A payment can be confirmed by the client polling `verify` or by the
//! gateway pushing a webhook; both paths converge on the same guarded
//! transition plus fulfillment in `settle`. Losing the guard means
//! someone else already settled the payment and is treated as success.

use crate::config::PaymentsSettings;
use crate::error::PaymentError;
use crate::fulfillment::plan_fulfillment;
use crate::gateway::{GatewayStatus, InitializeParams, PaymentGateway};
use crate::pricing::PriceTable;
use crate::store::PaymentStore;
use crate::types::{NewPayment, Payment, PaymentStatus, ServiceKind};
use crate::webhook::{SignatureVerifier, WebhookEvent};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A request to start a payment attempt.
#[derive(Debug, Clone)]
pub struct InitializeRequest {
	/// Paying user
	pub user_id: Uuid,
	/// Customer email passed to the gateway
	pub email: String,
	/// Service being purchased
	pub service: ServiceKind,
	/// Target ad, required for boost services
	pub ad_id: Option<Uuid>,
	/// Plan, required for subscription payments
	pub subscription_plan_id: Option<Uuid>,
	/// Amount the client believes it is paying, in minor units.
	/// Only ever compared against the server-side derivation.
	pub amount: Option<i64>,
}

/// A started payment attempt, ready for checkout.
#[derive(Debug, Clone)]
pub struct InitializedPayment {
	/// Local payment record id
	pub payment_id: Uuid,
	/// Unique reference echoed by the gateway
	pub reference: String,
	/// Hosted checkout page for the customer
	pub authorization_url: String,
}

/// Outcome of an authenticated webhook delivery.
///
/// Every variant is acknowledged to the gateway as received; only a
/// signature failure or an internal fault is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookAck {
	/// This delivery won the guard and applied the entitlement
	Processed,
	/// The payment was already terminal; nothing was reapplied
	AlreadySettled,
	/// Non-actionable event or unknown reference
	Ignored,
}

/// Drives payment confirmation and entitlement fulfillment.
///
/// Built once at process start with its collaborators injected; holds
/// no mutable state of its own. All coordination between concurrent
/// confirmations happens at the store's conditional transition.
pub struct ConfirmationService {
	gateway: Arc<dyn PaymentGateway>,
	store: Arc<dyn PaymentStore>,
	signature: SignatureVerifier,
	prices: PriceTable,
	settings: PaymentsSettings,
}

impl ConfirmationService {
	/// Creates the service from its collaborators.
	pub fn new(
		gateway: Arc<dyn PaymentGateway>,
		store: Arc<dyn PaymentStore>,
		signature: SignatureVerifier,
		prices: PriceTable,
		settings: PaymentsSettings,
	) -> Self {
		Self {
			gateway,
			store,
			signature,
			prices,
			settings,
		}
	}

	/// Starts a payment attempt.
	///
	/// Validates the request shape and ad ownership, derives the amount
	/// server-side, creates the pending record and initializes the
	/// gateway transaction.
	///
	/// # Errors
	///
	/// * [`PaymentError::Validation`] - incoherent shape, unknown ad or
	///   plan, or a client amount that disagrees with the derived one
	/// * [`PaymentError::Unauthorized`] - ad owned by someone else
	/// * [`PaymentError::Gateway`] - gateway fault; the pending record
	///   exists and a later confirmation can still settle it
	pub async fn initialize(
		&self,
		request: InitializeRequest,
	) -> Result<InitializedPayment, PaymentError> {
		let amount = self.derive_amount(&request).await?;
		if let Some(claimed) = request.amount {
			if claimed != amount {
				return Err(PaymentError::Validation(format!(
					"amount mismatch: expected {amount}, got {claimed}"
				)));
			}
		}

		let reference = generate_reference();
		let payment = self
			.store
			.create_payment(NewPayment {
				user_id: request.user_id,
				ad_id: request.ad_id,
				subscription_plan_id: request.subscription_plan_id,
				service: request.service,
				amount,
				reference: reference.clone(),
			})
			.await?;

		let authorization = self
			.gateway
			.initialize_transaction(InitializeParams {
				email: request.email,
				amount,
				reference: reference.clone(),
				callback_url: self.settings.callback_url.clone(),
				metadata: serde_json::json!({
					"payment_id": payment.id,
					"service": request.service,
				}),
			})
			.await?;

		info!(%reference, service = %request.service, amount, "payment initialized");
		Ok(InitializedPayment {
			payment_id: payment.id,
			reference,
			authorization_url: authorization.authorization_url,
		})
	}

	/// Path A: client-initiated verification of a payment attempt.
	///
	/// Terminal records are returned as-is without a gateway call. For a
	/// pending record the gateway is asked for the transaction state; a
	/// success drives the guarded completion, a failure the guarded
	/// failure transition, and anything else leaves the record pending.
	///
	/// # Errors
	///
	/// * [`PaymentError::NotFound`] - no such reference for this caller
	/// * [`PaymentError::Gateway`] - gateway fault; retryable
	pub async fn verify(&self, reference: &str, caller: Uuid) -> Result<Payment, PaymentError> {
		let payment = self
			.store
			.find_by_reference(reference, Some(caller))
			.await?
			.ok_or_else(|| PaymentError::NotFound(reference.to_string()))?;

		if payment.status.is_terminal() {
			debug!(%reference, status = %payment.status, "verify on settled payment");
			return Ok(payment);
		}

		let verification = self.gateway.verify_transaction(reference).await?;
		match verification.status {
			GatewayStatus::Success => {
				self.settle(&payment, verification.raw).await?;
			}
			GatewayStatus::Failed => {
				// Losing this race is fine: the other path saw the same
				// gateway outcome.
				let won = self
					.store
					.transition(
						payment.id,
						PaymentStatus::Pending,
						PaymentStatus::Failed,
						Some(verification.raw),
					)
					.await?;
				if won {
					info!(%reference, "payment marked failed");
				}
			}
			GatewayStatus::Pending => {
				debug!(%reference, "gateway not settled yet");
				return Ok(payment);
			}
		}

		self.store
			.find_by_reference(reference, Some(caller))
			.await?
			.ok_or_else(|| PaymentError::NotFound(reference.to_string()))
	}

	/// Path B: gateway webhook delivery.
	///
	/// The signature is checked against the exact raw body before the
	/// JSON is even parsed; a rejected delivery mutates nothing. A valid
	/// but non-actionable event, or an actionable one for an unknown
	/// reference, is acknowledged and ignored so the gateway stops
	/// redelivering it.
	///
	/// # Errors
	///
	/// * [`PaymentError::Signature`] - digest mismatch; reject with no
	///   state change (the gateway will redeliver)
	/// * [`PaymentError::Serialization`] - authenticated body that is
	///   not a well-formed event
	pub async fn handle_webhook(
		&self,
		body: &[u8],
		signature_header: &str,
	) -> Result<WebhookAck, PaymentError> {
		if let Err(e) = self.signature.verify(body, signature_header) {
			warn!("webhook rejected: {e}");
			return Err(e.into());
		}

		let event = WebhookEvent::parse(body)?;
		if !event.is_actionable() {
			debug!(event = %event.event, "ignoring non-actionable webhook");
			return Ok(WebhookAck::Ignored);
		}

		let reference = event.data.reference.clone();
		let Some(payment) = self.store.find_by_reference(&reference, None).await? else {
			warn!(%reference, "webhook for unknown reference");
			return Ok(WebhookAck::Ignored);
		};

		if payment.status.is_terminal() {
			debug!(%reference, "webhook for settled payment acknowledged");
			return Ok(WebhookAck::AlreadySettled);
		}

		let raw = serde_json::to_value(&event)?;
		let won = self.settle(&payment, raw).await?;
		Ok(if won {
			WebhookAck::Processed
		} else {
			WebhookAck::AlreadySettled
		})
	}

	/// The shared guarded transition both paths converge on.
	///
	/// Plans the fulfillment first (pure, no writes), then asks the
	/// store to complete the payment and apply the plan in one
	/// transaction. Returns whether this caller won the guard.
	async fn settle(
		&self,
		payment: &Payment,
		raw: serde_json::Value,
	) -> Result<bool, PaymentError> {
		let plan_row = match payment.subscription_plan_id {
			Some(plan_id) => self.store.find_plan(plan_id).await?,
			None => None,
		};
		let plan = plan_fulfillment(payment, plan_row.as_ref(), Utc::now())?;

		let won = self
			.store
			.complete_and_fulfill(payment.id, raw, &plan)
			.await?;
		if won {
			info!(
				reference = %payment.reference,
				service = %payment.service,
				"payment completed and entitlement applied"
			);
		} else {
			debug!(
				reference = %payment.reference,
				"lost the completion guard; already settled"
			);
		}
		Ok(won)
	}

	async fn derive_amount(&self, request: &InitializeRequest) -> Result<i64, PaymentError> {
		match request.service {
			ServiceKind::Subscription => {
				let plan_id = request.subscription_plan_id.ok_or_else(|| {
					PaymentError::Validation("subscription payment requires a plan".to_string())
				})?;
				let plan = self
					.store
					.find_plan(plan_id)
					.await?
					.ok_or_else(|| {
						PaymentError::Validation(format!("unknown subscription plan: {plan_id}"))
					})?;
				Ok(plan.amount)
			}
			ServiceKind::Bump | ServiceKind::Feature | ServiceKind::Urgent => {
				let ad_id = request.ad_id.ok_or_else(|| {
					PaymentError::Validation(format!(
						"{} payment requires an ad",
						request.service
					))
				})?;
				let owner = self
					.store
					.find_ad_owner(ad_id)
					.await?
					.ok_or_else(|| PaymentError::Validation(format!("unknown ad: {ad_id}")))?;
				if owner != request.user_id {
					return Err(PaymentError::Unauthorized(format!(
						"ad {ad_id} is not owned by the caller"
					)));
				}
				// amount_for is Some for every boost kind.
				self.prices.amount_for(request.service).ok_or_else(|| {
					PaymentError::Validation(format!("no price for {}", request.service))
				})
			}
		}
	}
}

/// Generates a globally unique payment reference.
fn generate_reference() -> String {
	format!("LST-{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_references_are_unique_and_prefixed() {
		let a = generate_reference();
		let b = generate_reference();
		assert_ne!(a, b);
		assert!(a.starts_with("LST-"));
		assert_eq!(a.len(), "LST-".len() + 32);
	}
}
