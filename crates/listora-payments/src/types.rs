//! Domain types for payment attempts and purchased entitlements.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Purchasable service kinds.
///
/// This set is closed: every fulfillment call site matches exhaustively,
/// so adding a kind forces each one to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
	/// Re-rank an ad to the top of its listing for a week
	Bump,
	/// Show an ad in the featured strip for 30 days
	Feature,
	/// Mark an ad as urgent for a week
	Urgent,
	/// A recurring subscription period bought against a plan
	Subscription,
}

impl ServiceKind {
	/// Canonical lowercase name, as stored in the `service` column.
	#[must_use]
	pub fn as_str(&self) -> &'static str {
		match self {
			ServiceKind::Bump => "bump",
			ServiceKind::Feature => "feature",
			ServiceKind::Urgent => "urgent",
			ServiceKind::Subscription => "subscription",
		}
	}
}

impl fmt::Display for ServiceKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for ServiceKind {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"bump" => Ok(ServiceKind::Bump),
			"feature" => Ok(ServiceKind::Feature),
			"urgent" => Ok(ServiceKind::Urgent),
			"subscription" => Ok(ServiceKind::Subscription),
			other => Err(format!("unknown service kind: {other}")),
		}
	}
}

/// Lifecycle state of a payment attempt.
///
/// Transitions are monotonic: `Pending` moves to exactly one of
/// `Completed` or `Failed`, and terminal states are immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
	/// Initialized, awaiting confirmation from the gateway
	Pending,
	/// Confirmed successful; entitlement applied
	Completed,
	/// Confirmed unsuccessful; no entitlement
	Failed,
}

impl PaymentStatus {
	/// Whether this state accepts no further transitions.
	#[must_use]
	pub fn is_terminal(&self) -> bool {
		matches!(self, PaymentStatus::Completed | PaymentStatus::Failed)
	}

	/// Canonical lowercase name, as stored in the `status` column.
	#[must_use]
	pub fn as_str(&self) -> &'static str {
		match self {
			PaymentStatus::Pending => "pending",
			PaymentStatus::Completed => "completed",
			PaymentStatus::Failed => "failed",
		}
	}
}

impl fmt::Display for PaymentStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for PaymentStatus {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"pending" => Ok(PaymentStatus::Pending),
			"completed" => Ok(PaymentStatus::Completed),
			"failed" => Ok(PaymentStatus::Failed),
			other => Err(format!("unknown payment status: {other}")),
		}
	}
}

/// One payment attempt and its terminal outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
	/// Unique identifier
	pub id: Uuid,
	/// Owning user
	pub user_id: Uuid,
	/// Target ad for boost services
	pub ad_id: Option<Uuid>,
	/// Plan bought by subscription payments
	pub subscription_plan_id: Option<Uuid>,
	/// What was purchased
	pub service: ServiceKind,
	/// Amount in minor currency units, derived server-side
	pub amount: i64,
	/// Globally unique reference, generated locally and echoed by the gateway
	pub reference: String,
	/// Lifecycle state
	pub status: PaymentStatus,
	/// Raw gateway payload captured at confirmation time
	pub gateway_payload: Option<serde_json::Value>,
	/// When the terminal transition happened
	pub verified_at: Option<DateTime<Utc>>,
	/// Creation timestamp
	pub created_at: DateTime<Utc>,
}

/// Parameters for creating a pending payment record.
#[derive(Debug, Clone)]
pub struct NewPayment {
	/// Owning user
	pub user_id: Uuid,
	/// Target ad for boost services
	pub ad_id: Option<Uuid>,
	/// Plan bought by subscription payments
	pub subscription_plan_id: Option<Uuid>,
	/// What is being purchased
	pub service: ServiceKind,
	/// Amount in minor currency units
	pub amount: i64,
	/// Unique reference for the attempt
	pub reference: String,
}

/// Billing interval of a subscription plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanDuration {
	/// One calendar month per period
	Month,
	/// One calendar year per period
	Year,
}

impl PlanDuration {
	/// Canonical lowercase name, as stored in the `duration` column.
	#[must_use]
	pub fn as_str(&self) -> &'static str {
		match self {
			PlanDuration::Month => "month",
			PlanDuration::Year => "year",
		}
	}
}

impl FromStr for PlanDuration {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"month" => Ok(PlanDuration::Month),
			"year" => Ok(PlanDuration::Year),
			other => Err(format!("unknown plan duration: {other}")),
		}
	}
}

/// A purchasable subscription plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionPlan {
	/// Unique identifier
	pub id: Uuid,
	/// Display name
	pub name: String,
	/// Price per period in minor currency units
	pub amount: i64,
	/// Billing interval
	pub duration: PlanDuration,
}

/// State of a granted subscription period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
	/// Period is current
	Active,
	/// Cancelled by the user or an operator
	Cancelled,
}

impl SubscriptionStatus {
	/// Canonical lowercase name.
	#[must_use]
	pub fn as_str(&self) -> &'static str {
		match self {
			SubscriptionStatus::Active => "active",
			SubscriptionStatus::Cancelled => "cancelled",
		}
	}
}

impl FromStr for SubscriptionStatus {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"active" => Ok(SubscriptionStatus::Active),
			"cancelled" => Ok(SubscriptionStatus::Cancelled),
			other => Err(format!("unknown subscription status: {other}")),
		}
	}
}

/// A subscription period granted by a completed subscription payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSubscription {
	/// Unique identifier
	pub id: Uuid,
	/// Subscribed user
	pub user_id: Uuid,
	/// Plan the period was bought against
	pub plan_id: Uuid,
	/// Reference of the payment that granted the period
	pub payment_reference: String,
	/// Period start
	pub start_date: DateTime<Utc>,
	/// Period end, computed from the plan duration
	pub end_date: DateTime<Utc>,
	/// Period state
	pub status: SubscriptionStatus,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_service_kind_round_trips_through_str() {
		for kind in [
			ServiceKind::Bump,
			ServiceKind::Feature,
			ServiceKind::Urgent,
			ServiceKind::Subscription,
		] {
			assert_eq!(kind.as_str().parse::<ServiceKind>(), Ok(kind));
		}
	}

	#[test]
	fn test_unknown_service_kind_is_rejected() {
		assert!("premium".parse::<ServiceKind>().is_err());
	}

	#[test]
	fn test_terminal_statuses() {
		assert!(!PaymentStatus::Pending.is_terminal());
		assert!(PaymentStatus::Completed.is_terminal());
		assert!(PaymentStatus::Failed.is_terminal());
	}

	#[test]
	fn test_status_round_trips_through_str() {
		for status in [
			PaymentStatus::Pending,
			PaymentStatus::Completed,
			PaymentStatus::Failed,
		] {
			assert_eq!(status.as_str().parse::<PaymentStatus>(), Ok(status));
		}
	}

	#[test]
	fn test_plan_duration_parse() {
		assert_eq!("month".parse::<PlanDuration>(), Ok(PlanDuration::Month));
		assert_eq!("year".parse::<PlanDuration>(), Ok(PlanDuration::Year));
		assert!("week".parse::<PlanDuration>().is_err());
	}
}
