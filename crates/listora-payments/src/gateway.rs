//! Thin client for the external payment gateway.
//!
//! The client issues exactly one HTTP request per call and performs no
//! retries; callers decide retry policy from the [`GatewayError`] kind.
//! The production implementation is constructed once at process start
//! and injected wherever a [`PaymentGateway`] is needed.

use crate::config::GatewaySettings;
use crate::error::GatewayError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Parameters for initializing a gateway transaction.
#[derive(Debug, Clone)]
pub struct InitializeParams {
	/// Customer email, required by the gateway
	pub email: String,
	/// Amount in minor currency units
	pub amount: i64,
	/// Locally generated unique reference
	pub reference: String,
	/// URL the customer is redirected to after checkout
	pub callback_url: String,
	/// Opaque metadata echoed back in webhooks
	pub metadata: serde_json::Value,
}

/// Checkout handle returned by transaction initialization.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayAuthorization {
	/// Hosted checkout page for the customer
	pub authorization_url: String,
	/// Gateway access code for embedded checkout
	pub access_code: String,
}

/// Transaction state as reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayStatus {
	/// Charge went through
	Success,
	/// Charge failed or was abandoned by the customer
	Failed,
	/// Not settled yet on the gateway side
	Pending,
}

impl GatewayStatus {
	/// Map the gateway's status string onto the closed set.
	///
	/// Anything that is neither a success nor a known failure is treated
	/// as still pending, which leaves the local record untouched and
	/// retryable.
	#[must_use]
	pub fn from_raw(raw: &str) -> Self {
		match raw {
			"success" => GatewayStatus::Success,
			"failed" | "abandoned" => GatewayStatus::Failed,
			_ => GatewayStatus::Pending,
		}
	}
}

/// Result of a verify call: the mapped status plus the raw payload,
/// which is persisted verbatim on the payment record.
#[derive(Debug, Clone)]
pub struct GatewayVerification {
	/// Mapped transaction state
	pub status: GatewayStatus,
	/// Raw gateway response body
	pub raw: serde_json::Value,
}

/// Gateway client abstraction.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
	/// Initializes a transaction and returns the checkout handle.
	async fn initialize_transaction(
		&self,
		params: InitializeParams,
	) -> Result<GatewayAuthorization, GatewayError>;

	/// Fetches the current state of a transaction by reference.
	async fn verify_transaction(
		&self,
		reference: &str,
	) -> Result<GatewayVerification, GatewayError>;
}

/// REST implementation of [`PaymentGateway`].
///
/// Holds an explicitly constructed `reqwest::Client` with a bounded
/// timeout; there is no lazily initialized global transport.
pub struct RestGateway {
	http: reqwest::Client,
	base_url: String,
	secret_key: String,
}

impl RestGateway {
	/// Builds a gateway client from settings.
	///
	/// # Errors
	///
	/// Returns an error if the underlying HTTP client cannot be built.
	pub fn new(settings: &GatewaySettings) -> Result<Self, GatewayError> {
		let http = reqwest::Client::builder()
			.timeout(Duration::from_secs(settings.timeout_secs))
			.build()?;

		Ok(Self {
			http,
			base_url: settings.base_url.trim_end_matches('/').to_string(),
			secret_key: settings.secret_key.clone(),
		})
	}

	/// Extracts the `data` object from the gateway's response envelope.
	fn envelope_data(envelope: &serde_json::Value) -> Result<&serde_json::Value, GatewayError> {
		envelope
			.get("data")
			.ok_or_else(|| GatewayError::Malformed("response envelope has no data field".to_string()))
	}
}

#[async_trait]
impl PaymentGateway for RestGateway {
	async fn initialize_transaction(
		&self,
		params: InitializeParams,
	) -> Result<GatewayAuthorization, GatewayError> {
		let url = format!("{}/transaction/initialize", self.base_url);
		let body = serde_json::json!({
			"email": params.email,
			"amount": params.amount,
			"reference": params.reference,
			"callback_url": params.callback_url,
			"metadata": params.metadata,
		});

		debug!(reference = %params.reference, "initializing gateway transaction");
		let response = self
			.http
			.post(&url)
			.bearer_auth(&self.secret_key)
			.json(&body)
			.send()
			.await?;

		let status = response.status();
		if !status.is_success() {
			return Err(GatewayError::Http {
				status: status.as_u16(),
				message: response.text().await.unwrap_or_default(),
			});
		}

		let envelope: serde_json::Value = response.json().await?;
		let data = Self::envelope_data(&envelope)?;
		serde_json::from_value(data.clone())
			.map_err(|e| GatewayError::Malformed(e.to_string()))
	}

	async fn verify_transaction(
		&self,
		reference: &str,
	) -> Result<GatewayVerification, GatewayError> {
		let url = format!("{}/transaction/verify/{reference}", self.base_url);

		debug!(reference, "verifying gateway transaction");
		let response = self.http.get(&url).bearer_auth(&self.secret_key).send().await?;

		let status = response.status();
		if !status.is_success() {
			return Err(GatewayError::Http {
				status: status.as_u16(),
				message: response.text().await.unwrap_or_default(),
			});
		}

		let envelope: serde_json::Value = response.json().await?;
		let data = Self::envelope_data(&envelope)?;
		let raw_status = data
			.get("status")
			.and_then(|s| s.as_str())
			.ok_or_else(|| GatewayError::Malformed("data.status missing".to_string()))?;

		Ok(GatewayVerification {
			status: GatewayStatus::from_raw(raw_status),
			raw: envelope,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_status_mapping() {
		assert_eq!(GatewayStatus::from_raw("success"), GatewayStatus::Success);
		assert_eq!(GatewayStatus::from_raw("failed"), GatewayStatus::Failed);
		assert_eq!(GatewayStatus::from_raw("abandoned"), GatewayStatus::Failed);
		assert_eq!(GatewayStatus::from_raw("ongoing"), GatewayStatus::Pending);
		assert_eq!(GatewayStatus::from_raw(""), GatewayStatus::Pending);
	}

	#[test]
	fn test_base_url_trailing_slash_is_trimmed() {
		let settings = GatewaySettings {
			secret_key: "sk_test".to_string(),
			base_url: "https://api.gateway.test/".to_string(),
			timeout_secs: 5,
		};
		let gateway = RestGateway::new(&settings).expect("client should build");
		assert_eq!(gateway.base_url, "https://api.gateway.test");
	}

	#[test]
	fn test_envelope_without_data_is_malformed() {
		let envelope = serde_json::json!({ "status": true });
		assert!(RestGateway::envelope_data(&envelope).is_err());
	}
}
