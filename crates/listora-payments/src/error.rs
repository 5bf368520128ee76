//! Error types for payment operations.

use thiserror::Error;

/// Gateway client errors.
///
/// The client performs no retries; callers decide retry policy. Every
/// variant leaves the local payment record untouched, so retrying after
/// any of these is always safe.
#[derive(Debug, Error)]
pub enum GatewayError {
	/// Network fault or timeout reaching the gateway
	#[error("gateway request failed: {0}")]
	Network(#[from] reqwest::Error),

	/// Non-success HTTP response from the gateway
	#[error("gateway returned HTTP {status}: {message}")]
	Http {
		/// HTTP status code
		status: u16,
		/// Response body, as far as it could be read
		message: String,
	},

	/// Response parsed but did not have the expected shape
	#[error("malformed gateway response: {0}")]
	Malformed(String),
}

/// Webhook signature verification errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
	/// Signature header was not valid hex
	#[error("signature header is not valid hex")]
	MalformedHeader,

	/// Computed digest did not match the header value
	#[error("signature does not match payload digest")]
	Mismatch,

	/// Signing key could not be used
	#[error("invalid signing key")]
	InvalidKey,
}

/// Payment record store errors.
#[derive(Debug, Error)]
pub enum StoreError {
	/// Underlying database error
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),

	/// Payment reference already exists
	#[error("duplicate payment reference: {0}")]
	DuplicateReference(String),

	/// A row held a value the domain types reject
	#[error("corrupt row: {0}")]
	Corrupt(String),

	/// A fulfillment write failed after the guard was won; the whole
	/// transaction is rolled back and the payment stays pending
	#[error("fulfillment write failed: {0}")]
	Fulfillment(String),
}

/// Payment operation errors.
#[derive(Debug, Error)]
pub enum PaymentError {
	/// Request rejected before any gateway call or state change
	#[error("invalid request: {0}")]
	Validation(String),

	/// Caller does not own the referenced ad or payment
	#[error("not authorized: {0}")]
	Unauthorized(String),

	/// Gateway fault; the payment remains pending and is retryable
	#[error(transparent)]
	Gateway(#[from] GatewayError),

	/// Webhook authentication failure; nothing was mutated
	#[error(transparent)]
	Signature(#[from] SignatureError),

	/// No payment record for the given reference
	#[error("payment not found: {0}")]
	NotFound(String),

	/// Persistence fault
	#[error(transparent)]
	Store(#[from] StoreError),

	/// Payload (de)serialization error
	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

impl PaymentError {
	/// Whether the caller may retry the same operation unchanged.
	///
	/// Gateway and database faults leave the payment pending; validation,
	/// authorization and signature failures will fail the same way again.
	#[must_use]
	pub fn is_retryable(&self) -> bool {
		matches!(
			self,
			PaymentError::Gateway(_)
				| PaymentError::Store(StoreError::Database(_))
				| PaymentError::Store(StoreError::Fulfillment(_))
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_gateway_errors_are_retryable() {
		let err = PaymentError::Gateway(GatewayError::Http {
			status: 502,
			message: "bad gateway".to_string(),
		});
		assert!(err.is_retryable());
	}

	#[test]
	fn test_validation_errors_are_not_retryable() {
		let err = PaymentError::Validation("amount mismatch".to_string());
		assert!(!err.is_retryable());
	}

	#[test]
	fn test_signature_errors_are_not_retryable() {
		let err = PaymentError::Signature(SignatureError::Mismatch);
		assert!(!err.is_retryable());
	}

	#[test]
	fn test_fulfillment_failure_is_retryable() {
		let err = PaymentError::Store(StoreError::Fulfillment("injected".to_string()));
		assert!(err.is_retryable());
	}
}
