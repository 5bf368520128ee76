//! Webhook event payloads.

use serde::{Deserialize, Serialize};

/// A gateway webhook delivery, parsed after signature verification.
///
/// The gateway pushes many event kinds; only a successful charge is
/// actionable for this subsystem. Everything else is acknowledged and
/// ignored so the gateway stops redelivering it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
	/// Event kind, e.g. `charge.success`
	pub event: String,
	/// Charge details
	pub data: ChargeData,
}

/// Charge details embedded in a webhook event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeData {
	/// The reference this subsystem generated at initialization
	pub reference: String,
	/// Gateway-side charge status string
	pub status: String,
	/// Charged amount in minor units, when present
	#[serde(default)]
	pub amount: Option<i64>,
	/// Human-readable gateway response, when present
	#[serde(default)]
	pub gateway_response: Option<String>,
}

impl WebhookEvent {
	/// Parses a raw body. Call only after signature verification.
	///
	/// # Errors
	///
	/// Returns an error if the body is not a well-formed event.
	pub fn parse(body: &[u8]) -> Result<Self, serde_json::Error> {
		serde_json::from_slice(body)
	}

	/// Whether this event should drive a completion transition.
	#[must_use]
	pub fn is_actionable(&self) -> bool {
		self.event == "charge.success" && self.data.status == "success"
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_charge_success_is_actionable() {
		let body = br#"{"event":"charge.success","data":{"reference":"R1","status":"success"}}"#;
		let event = WebhookEvent::parse(body).expect("should parse");
		assert!(event.is_actionable());
		assert_eq!(event.data.reference, "R1");
	}

	#[test]
	fn test_other_events_are_not_actionable() {
		let body = br#"{"event":"charge.dispute.create","data":{"reference":"R1","status":"success"}}"#;
		let event = WebhookEvent::parse(body).expect("should parse");
		assert!(!event.is_actionable());
	}

	#[test]
	fn test_success_event_with_failed_charge_is_not_actionable() {
		let body = br#"{"event":"charge.success","data":{"reference":"R1","status":"failed"}}"#;
		let event = WebhookEvent::parse(body).expect("should parse");
		assert!(!event.is_actionable());
	}

	#[test]
	fn test_extra_fields_are_tolerated() {
		let body = br#"{"event":"charge.success","data":{"reference":"R1","status":"success","amount":50000,"gateway_response":"Approved","channel":"card"}}"#;
		let event = WebhookEvent::parse(body).expect("should parse");
		assert_eq!(event.data.amount, Some(50_000));
	}

	#[test]
	fn test_malformed_body_is_an_error() {
		assert!(WebhookEvent::parse(b"not json").is_err());
	}
}
