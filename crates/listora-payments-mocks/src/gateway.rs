//! Mock payment gateway for testing the PaymentGateway trait.

use async_trait::async_trait;
use listora_payments::{
	GatewayAuthorization, GatewayError, GatewayStatus, GatewayVerification, InitializeParams,
	PaymentGateway,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Mock gateway for testing.
///
/// Verification outcomes are scripted per reference; unscripted
/// references behave like unknown transactions. The mock can be
/// configured to fail its next call for testing error paths, and it
/// counts calls so tests can assert that settled payments never reach
/// the gateway again.
pub struct MockGateway {
	verifications: Arc<RwLock<HashMap<String, GatewayVerification>>>,
	fail_next: Arc<RwLock<bool>>,
	initialize_calls: Arc<RwLock<usize>>,
	verify_calls: Arc<RwLock<usize>>,
}

impl MockGateway {
	/// Creates a mock with no scripted outcomes.
	#[must_use]
	pub fn new() -> Self {
		Self {
			verifications: Arc::new(RwLock::new(HashMap::new())),
			fail_next: Arc::new(RwLock::new(false)),
			initialize_calls: Arc::new(RwLock::new(0)),
			verify_calls: Arc::new(RwLock::new(0)),
		}
	}

	/// Scripts the verification outcome for a reference.
	pub async fn script_verification(&self, reference: &str, status: GatewayStatus) {
		let raw = serde_json::json!({
			"status": true,
			"data": {
				"reference": reference,
				"status": match status {
					GatewayStatus::Success => "success",
					GatewayStatus::Failed => "failed",
					GatewayStatus::Pending => "pending",
				},
			},
		});
		self.verifications
			.write()
			.await
			.insert(reference.to_string(), GatewayVerification { status, raw });
	}

	/// Configures whether the next call should fail with a network-like
	/// gateway error.
	pub async fn set_fail_next(&self, fail: bool) {
		*self.fail_next.write().await = fail;
	}

	/// Number of initialize calls made so far.
	pub async fn initialize_calls(&self) -> usize {
		*self.initialize_calls.read().await
	}

	/// Number of verify calls made so far.
	pub async fn verify_calls(&self) -> usize {
		*self.verify_calls.read().await
	}

	async fn take_failure(&self) -> bool {
		let mut fail = self.fail_next.write().await;
		std::mem::take(&mut *fail)
	}
}

impl Default for MockGateway {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl PaymentGateway for MockGateway {
	async fn initialize_transaction(
		&self,
		params: InitializeParams,
	) -> Result<GatewayAuthorization, GatewayError> {
		*self.initialize_calls.write().await += 1;
		if self.take_failure().await {
			return Err(GatewayError::Http {
				status: 503,
				message: "mock configured to fail".to_string(),
			});
		}

		Ok(GatewayAuthorization {
			authorization_url: format!("https://checkout.mockpay.test/{}", params.reference),
			access_code: format!("ac_mock_{}", Uuid::new_v4().simple()),
		})
	}

	async fn verify_transaction(
		&self,
		reference: &str,
	) -> Result<GatewayVerification, GatewayError> {
		*self.verify_calls.write().await += 1;
		if self.take_failure().await {
			return Err(GatewayError::Http {
				status: 503,
				message: "mock configured to fail".to_string(),
			});
		}

		self.verifications
			.read()
			.await
			.get(reference)
			.cloned()
			.ok_or_else(|| GatewayError::Http {
				status: 404,
				message: format!("transaction {reference} not found"),
			})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_unscripted_reference_is_not_found() {
		let gateway = MockGateway::new();
		let result = gateway.verify_transaction("LST-unknown").await;
		assert!(matches!(
			result,
			Err(GatewayError::Http { status: 404, .. })
		));
	}

	#[tokio::test]
	async fn test_scripted_verification_is_returned() {
		let gateway = MockGateway::new();
		gateway.script_verification("R1", GatewayStatus::Success).await;
		let verification = gateway.verify_transaction("R1").await.expect("scripted");
		assert_eq!(verification.status, GatewayStatus::Success);
		assert_eq!(gateway.verify_calls().await, 1);
	}

	#[tokio::test]
	async fn test_fail_next_fails_once() {
		let gateway = MockGateway::new();
		gateway.script_verification("R1", GatewayStatus::Success).await;
		gateway.set_fail_next(true).await;

		assert!(gateway.verify_transaction("R1").await.is_err());
		assert!(gateway.verify_transaction("R1").await.is_ok());
	}
}
