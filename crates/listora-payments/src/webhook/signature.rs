//! Webhook signature verification.

use crate::error::SignatureError;
use hmac::{Hmac, Mac};
use sha2::Sha512;
use subtle::ConstantTimeEq;

type HmacSha512 = Hmac<Sha512>;

/// Verifies inbound webhook deliveries.
///
/// The gateway signs the exact raw request body with HMAC-SHA512 keyed
/// by the shared secret and sends the hex digest in a header. The
/// comparison is constant-time to prevent timing attacks.
#[derive(Clone)]
pub struct SignatureVerifier {
	secret: String,
}

impl SignatureVerifier {
	/// Creates a verifier for the given shared secret.
	pub fn new(secret: impl Into<String>) -> Self {
		Self {
			secret: secret.into(),
		}
	}

	/// Verifies a delivery.
	///
	/// # Arguments
	///
	/// * `payload` - Exact raw request body bytes
	/// * `signature_hex` - Hex digest from the signature header
	///
	/// # Errors
	///
	/// Returns an error if the header is not hex or the digest does not
	/// match.
	pub fn verify(&self, payload: &[u8], signature_hex: &str) -> Result<(), SignatureError> {
		let supplied =
			hex::decode(signature_hex.trim()).map_err(|_| SignatureError::MalformedHeader)?;

		let mut mac = HmacSha512::new_from_slice(self.secret.as_bytes())
			.map_err(|_| SignatureError::InvalidKey)?;
		mac.update(payload);
		let expected = mac.finalize().into_bytes();

		if expected.as_slice().ct_eq(supplied.as_slice()).into() {
			Ok(())
		} else {
			Err(SignatureError::Mismatch)
		}
	}

	/// Computes the hex digest the gateway would send for a body.
	///
	/// Used by tests and tooling to build valid deliveries.
	#[must_use]
	pub fn sign(&self, payload: &[u8]) -> String {
		// The key length is unconstrained for HMAC, so this cannot fail.
		let mut mac = HmacSha512::new_from_slice(self.secret.as_bytes())
			.unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));
		mac.update(payload);
		hex::encode(mac.finalize().into_bytes())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const SECRET: &str = "sk_test_webhook_secret";

	#[test]
	fn test_valid_signature_is_accepted() {
		let verifier = SignatureVerifier::new(SECRET);
		let body = br#"{"event":"charge.success"}"#;
		let signature = verifier.sign(body);
		assert!(verifier.verify(body, &signature).is_ok());
	}

	#[test]
	fn test_tampered_body_is_rejected() {
		let verifier = SignatureVerifier::new(SECRET);
		let body = br#"{"event":"charge.success"}"#;
		let tampered = br#"{"event":"charge.success","extra":true}"#;
		let signature = verifier.sign(body);
		assert_eq!(
			verifier.verify(tampered, &signature),
			Err(SignatureError::Mismatch)
		);
	}

	#[test]
	fn test_wrong_secret_is_rejected() {
		let signer = SignatureVerifier::new("other_secret");
		let verifier = SignatureVerifier::new(SECRET);
		let body = br#"{"event":"charge.success"}"#;
		let signature = signer.sign(body);
		assert_eq!(
			verifier.verify(body, &signature),
			Err(SignatureError::Mismatch)
		);
	}

	#[test]
	fn test_non_hex_header_is_rejected() {
		let verifier = SignatureVerifier::new(SECRET);
		assert_eq!(
			verifier.verify(b"{}", "not-a-hex-digest"),
			Err(SignatureError::MalformedHeader)
		);
	}

	#[test]
	fn test_truncated_digest_is_rejected() {
		let verifier = SignatureVerifier::new(SECRET);
		let body = br#"{"event":"charge.success"}"#;
		let signature = verifier.sign(body);
		assert_eq!(
			verifier.verify(body, &signature[..32]),
			Err(SignatureError::Mismatch)
		);
	}
}
