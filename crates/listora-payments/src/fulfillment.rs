//! Entitlement fulfillment planning.
//!
//! Fulfillment is split in two: this module computes the exact writes a
//! winning payment entitles its owner to (a [`FulfillmentPlan`]), and
//! the store applies those writes inside the same transaction as the
//! guarded status transition. Planning is pure and touches nothing, so
//! a failed plan rejects the confirmation before any write happens.

use crate::error::PaymentError;
use crate::types::{Payment, PlanDuration, ServiceKind, SubscriptionPlan};
use chrono::{DateTime, Duration, Months, Utc};
use uuid::Uuid;

/// Days a bump keeps an ad re-ranked.
pub const BUMP_DAYS: i64 = 7;
/// Days a featured placement lasts.
pub const FEATURE_DAYS: i64 = 30;
/// Days an urgent badge lasts.
pub const URGENT_DAYS: i64 = 7;

/// The writes a completed payment entitles its owner to.
///
/// Applied by the store in the same transaction as the pending to
/// completed transition, exactly once per payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FulfillmentPlan {
	/// Re-rank an ad for [`BUMP_DAYS`]
	Bump {
		/// Target ad
		ad_id: Uuid,
		/// Window start
		bumped_at: DateTime<Utc>,
		/// Window end
		bump_expires_at: DateTime<Utc>,
	},
	/// Feature an ad for [`FEATURE_DAYS`]
	Feature {
		/// Target ad
		ad_id: Uuid,
		/// Window start
		featured_at: DateTime<Utc>,
		/// Window end
		featured_until: DateTime<Utc>,
	},
	/// Badge an ad as urgent for [`URGENT_DAYS`]
	Urgent {
		/// Target ad
		ad_id: Uuid,
		/// Window start
		urgent_at: DateTime<Utc>,
		/// Window end
		urgent_until: DateTime<Utc>,
	},
	/// Grant one subscription period
	Subscription {
		/// Subscribed user
		user_id: Uuid,
		/// Plan the period is bought against
		plan_id: Uuid,
		/// Reference of the granting payment
		payment_reference: String,
		/// Period start
		start_date: DateTime<Utc>,
		/// Period end, one plan duration after the start
		end_date: DateTime<Utc>,
	},
}

impl PlanDuration {
	/// End of a period starting at `start`.
	///
	/// Calendar arithmetic: one month lands on the same day of the next
	/// month, clamped to its last day when shorter.
	///
	/// # Errors
	///
	/// Returns an error if the date would overflow chrono's range.
	pub fn period_end(&self, start: DateTime<Utc>) -> Result<DateTime<Utc>, PaymentError> {
		let months = match self {
			PlanDuration::Month => Months::new(1),
			PlanDuration::Year => Months::new(12),
		};
		start
			.checked_add_months(months)
			.ok_or_else(|| PaymentError::Validation("subscription end date out of range".to_string()))
	}
}

/// Computes the fulfillment plan for a payment about to complete.
///
/// Branches exhaustively on the service kind; the shape of the payment
/// row is validated here so the store only ever sees applicable plans.
///
/// # Arguments
///
/// * `payment` - The pending payment winning the transition
/// * `plan` - The subscription plan row, for subscription payments
/// * `now` - Transition timestamp; all windows are anchored to it
///
/// # Errors
///
/// Returns a validation error for impossible shapes: a boost payment
/// without an ad, or a subscription payment without a plan.
pub fn plan_fulfillment(
	payment: &Payment,
	plan: Option<&SubscriptionPlan>,
	now: DateTime<Utc>,
) -> Result<FulfillmentPlan, PaymentError> {
	let boost_ad = |service: ServiceKind| {
		payment.ad_id.ok_or_else(|| {
			PaymentError::Validation(format!("{service} payment {} has no ad", payment.reference))
		})
	};

	match payment.service {
		ServiceKind::Bump => Ok(FulfillmentPlan::Bump {
			ad_id: boost_ad(ServiceKind::Bump)?,
			bumped_at: now,
			bump_expires_at: now + Duration::days(BUMP_DAYS),
		}),
		ServiceKind::Feature => Ok(FulfillmentPlan::Feature {
			ad_id: boost_ad(ServiceKind::Feature)?,
			featured_at: now,
			featured_until: now + Duration::days(FEATURE_DAYS),
		}),
		ServiceKind::Urgent => Ok(FulfillmentPlan::Urgent {
			ad_id: boost_ad(ServiceKind::Urgent)?,
			urgent_at: now,
			urgent_until: now + Duration::days(URGENT_DAYS),
		}),
		ServiceKind::Subscription => {
			let plan = plan.ok_or_else(|| {
				PaymentError::Validation(format!(
					"subscription payment {} has no plan",
					payment.reference
				))
			})?;
			Ok(FulfillmentPlan::Subscription {
				user_id: payment.user_id,
				plan_id: plan.id,
				payment_reference: payment.reference.clone(),
				start_date: now,
				end_date: plan.duration.period_end(now)?,
			})
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::PaymentStatus;
	use chrono::TimeZone;

	fn payment(service: ServiceKind, ad_id: Option<Uuid>, plan_id: Option<Uuid>) -> Payment {
		Payment {
			id: Uuid::new_v4(),
			user_id: Uuid::new_v4(),
			ad_id,
			subscription_plan_id: plan_id,
			service,
			amount: 50_000,
			reference: "LST-test".to_string(),
			status: PaymentStatus::Pending,
			gateway_payload: None,
			verified_at: None,
			created_at: Utc::now(),
		}
	}

	fn monthly_plan() -> SubscriptionPlan {
		SubscriptionPlan {
			id: Uuid::new_v4(),
			name: "Seller Monthly".to_string(),
			amount: 200_000,
			duration: PlanDuration::Month,
		}
	}

	#[test]
	fn test_bump_window_is_seven_days() {
		let ad_id = Uuid::new_v4();
		let now = Utc::now();
		let plan = plan_fulfillment(&payment(ServiceKind::Bump, Some(ad_id), None), None, now)
			.expect("should plan");
		assert_eq!(
			plan,
			FulfillmentPlan::Bump {
				ad_id,
				bumped_at: now,
				bump_expires_at: now + Duration::days(7),
			}
		);
	}

	#[test]
	fn test_feature_window_is_thirty_days() {
		let ad_id = Uuid::new_v4();
		let now = Utc::now();
		let plan = plan_fulfillment(&payment(ServiceKind::Feature, Some(ad_id), None), None, now)
			.expect("should plan");
		match plan {
			FulfillmentPlan::Feature { featured_at, featured_until, .. } => {
				assert_eq!(featured_until - featured_at, Duration::days(30));
			}
			other => panic!("expected feature plan, got {other:?}"),
		}
	}

	#[test]
	fn test_urgent_window_is_seven_days() {
		let ad_id = Uuid::new_v4();
		let now = Utc::now();
		let plan = plan_fulfillment(&payment(ServiceKind::Urgent, Some(ad_id), None), None, now)
			.expect("should plan");
		match plan {
			FulfillmentPlan::Urgent { urgent_at, urgent_until, .. } => {
				assert_eq!(urgent_until - urgent_at, Duration::days(7));
			}
			other => panic!("expected urgent plan, got {other:?}"),
		}
	}

	#[test]
	fn test_boost_without_ad_is_rejected() {
		let result = plan_fulfillment(&payment(ServiceKind::Bump, None, None), None, Utc::now());
		assert!(matches!(result, Err(PaymentError::Validation(_))));
	}

	#[test]
	fn test_monthly_subscription_spans_one_calendar_month() {
		let plan_row = monthly_plan();
		let now = Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap();
		let plan = plan_fulfillment(
			&payment(ServiceKind::Subscription, None, Some(plan_row.id)),
			Some(&plan_row),
			now,
		)
		.expect("should plan");
		match plan {
			FulfillmentPlan::Subscription { start_date, end_date, .. } => {
				assert_eq!(start_date, now);
				assert_eq!(end_date, Utc.with_ymd_and_hms(2026, 4, 15, 12, 0, 0).unwrap());
			}
			other => panic!("expected subscription plan, got {other:?}"),
		}
	}

	#[test]
	fn test_month_end_is_clamped() {
		let plan_row = monthly_plan();
		let now = Utc.with_ymd_and_hms(2026, 1, 31, 9, 0, 0).unwrap();
		let plan = plan_fulfillment(
			&payment(ServiceKind::Subscription, None, Some(plan_row.id)),
			Some(&plan_row),
			now,
		)
		.expect("should plan");
		match plan {
			FulfillmentPlan::Subscription { end_date, .. } => {
				assert_eq!(end_date, Utc.with_ymd_and_hms(2026, 2, 28, 9, 0, 0).unwrap());
			}
			other => panic!("expected subscription plan, got {other:?}"),
		}
	}

	#[test]
	fn test_yearly_subscription_spans_one_year() {
		let plan_row = SubscriptionPlan {
			duration: PlanDuration::Year,
			..monthly_plan()
		};
		let now = Utc.with_ymd_and_hms(2026, 8, 30, 0, 0, 0).unwrap();
		let plan = plan_fulfillment(
			&payment(ServiceKind::Subscription, None, Some(plan_row.id)),
			Some(&plan_row),
			now,
		)
		.expect("should plan");
		match plan {
			FulfillmentPlan::Subscription { end_date, .. } => {
				assert_eq!(end_date, Utc.with_ymd_and_hms(2027, 8, 30, 0, 0, 0).unwrap());
			}
			other => panic!("expected subscription plan, got {other:?}"),
		}
	}

	#[test]
	fn test_subscription_without_plan_is_rejected() {
		let result = plan_fulfillment(
			&payment(ServiceKind::Subscription, None, None),
			None,
			Utc::now(),
		);
		assert!(matches!(result, Err(PaymentError::Validation(_))));
	}
}
