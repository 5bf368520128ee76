//! Settings for the payments subsystem.
//!
//! Settings are plain structs with defaults, loadable from the
//! environment under the `LISTORA_` prefix. They are read once at
//! process start and handed to the service constructors; nothing in
//! this crate reads the environment after that.

use std::env;
use thiserror::Error;

/// Environment loading errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
	/// A required variable was not set
	#[error("missing environment variable: {0}")]
	MissingVariable(String),

	/// A variable was set but could not be parsed
	#[error("invalid value for {key}: {message}")]
	InvalidValue {
		/// Variable name
		key: String,
		/// Parse failure description
		message: String,
	},
}

fn required(key: &str) -> Result<String, ConfigError> {
	env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
}

fn optional(key: &str, default: &str) -> String {
	env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Connection settings for the external payment gateway.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
	/// Secret API key; also the webhook signing key
	pub secret_key: String,
	/// Gateway REST API base URL
	pub base_url: String,
	/// Request timeout in seconds for gateway calls
	pub timeout_secs: u64,
}

impl Default for GatewaySettings {
	fn default() -> Self {
		Self {
			secret_key: String::new(),
			base_url: "https://api.paystack.co".to_string(),
			timeout_secs: 30,
		}
	}
}

impl GatewaySettings {
	/// Load gateway settings from the environment.
	///
	/// Reads `LISTORA_GATEWAY_SECRET_KEY` (required),
	/// `LISTORA_GATEWAY_BASE_URL` and `LISTORA_GATEWAY_TIMEOUT_SECS`.
	///
	/// # Errors
	///
	/// Returns an error if the secret key is missing or the timeout does
	/// not parse as an integer.
	pub fn from_env() -> Result<Self, ConfigError> {
		let defaults = Self::default();
		let timeout_raw = optional(
			"LISTORA_GATEWAY_TIMEOUT_SECS",
			&defaults.timeout_secs.to_string(),
		);
		let timeout_secs = timeout_raw
			.parse::<u64>()
			.map_err(|e| ConfigError::InvalidValue {
				key: "LISTORA_GATEWAY_TIMEOUT_SECS".to_string(),
				message: e.to_string(),
			})?;

		Ok(Self {
			secret_key: required("LISTORA_GATEWAY_SECRET_KEY")?,
			base_url: optional("LISTORA_GATEWAY_BASE_URL", &defaults.base_url),
			timeout_secs,
		})
	}
}

/// Settings for the confirmation service.
#[derive(Debug, Clone)]
pub struct PaymentsSettings {
	/// Gateway connection settings
	pub gateway: GatewaySettings,
	/// URL the gateway redirects the customer to after checkout
	pub callback_url: String,
}

impl Default for PaymentsSettings {
	fn default() -> Self {
		Self {
			gateway: GatewaySettings::default(),
			callback_url: "https://listora.example/payments/callback".to_string(),
		}
	}
}

impl PaymentsSettings {
	/// Load payment settings from the environment.
	///
	/// # Errors
	///
	/// Returns an error if any required gateway variable is missing or
	/// unparseable.
	pub fn from_env() -> Result<Self, ConfigError> {
		let defaults = Self::default();
		Ok(Self {
			gateway: GatewaySettings::from_env()?,
			callback_url: optional("LISTORA_PAYMENT_CALLBACK_URL", &defaults.callback_url),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_gateway_defaults() {
		let settings = GatewaySettings::default();
		assert_eq!(settings.base_url, "https://api.paystack.co");
		assert_eq!(settings.timeout_secs, 30);
		assert!(settings.secret_key.is_empty());
	}

	#[test]
	fn test_missing_secret_key_is_reported() {
		// The variable is never set in the test environment.
		let result = GatewaySettings::from_env();
		assert_eq!(
			result.unwrap_err(),
			ConfigError::MissingVariable("LISTORA_GATEWAY_SECRET_KEY".to_string())
		);
	}
}
