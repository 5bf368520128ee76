//! Postgres implementation of the payment record store.
//!
//! The conditional transition is an `UPDATE ... WHERE status = $from`;
//! `rows_affected` is the guard verdict. Fulfillment writes share the
//! transaction with that update, so a loss or a failure leaves no
//! partial state behind.

use crate::error::StoreError;
use crate::fulfillment::FulfillmentPlan;
use crate::store::PaymentStore;
use crate::types::{
	NewPayment, Payment, PaymentStatus, PlanDuration, ServiceKind, SubscriptionPlan,
	SubscriptionStatus,
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::debug;
use uuid::Uuid;

/// Payment record store backed by a Postgres pool.
#[derive(Clone)]
pub struct PgPaymentStore {
	pool: PgPool,
}

impl PgPaymentStore {
	/// Creates a store over an existing pool.
	#[must_use]
	pub fn new(pool: PgPool) -> Self {
		Self { pool }
	}

	fn row_to_payment(row: &PgRow) -> Result<Payment, StoreError> {
		let service: String = row.try_get("service")?;
		let status: String = row.try_get("status")?;
		Ok(Payment {
			id: row.try_get("id")?,
			user_id: row.try_get("user_id")?,
			ad_id: row.try_get("ad_id")?,
			subscription_plan_id: row.try_get("subscription_plan_id")?,
			service: service.parse::<ServiceKind>().map_err(StoreError::Corrupt)?,
			amount: row.try_get("amount")?,
			reference: row.try_get("reference")?,
			status: status.parse::<PaymentStatus>().map_err(StoreError::Corrupt)?,
			gateway_payload: row.try_get("gateway_payload")?,
			verified_at: row.try_get("verified_at")?,
			created_at: row.try_get("created_at")?,
		})
	}

	async fn apply_plan(
		tx: &mut Transaction<'_, Postgres>,
		plan: &FulfillmentPlan,
	) -> Result<(), StoreError> {
		match plan {
			FulfillmentPlan::Bump {
				ad_id,
				bumped_at,
				bump_expires_at,
			} => {
				let updated = sqlx::query(
					"UPDATE ads SET bumped_at = $1, bump_expires_at = $2 WHERE id = $3",
				)
				.bind(bumped_at)
				.bind(bump_expires_at)
				.bind(ad_id)
				.execute(&mut **tx)
				.await?
				.rows_affected();
				if updated == 0 {
					return Err(StoreError::Fulfillment(format!("ad {ad_id} not found")));
				}
			}
			FulfillmentPlan::Feature {
				ad_id,
				featured_at,
				featured_until,
			} => {
				let updated = sqlx::query(
					"UPDATE ads SET is_featured = TRUE, featured_at = $1, featured_until = $2 \
					 WHERE id = $3",
				)
				.bind(featured_at)
				.bind(featured_until)
				.bind(ad_id)
				.execute(&mut **tx)
				.await?
				.rows_affected();
				if updated == 0 {
					return Err(StoreError::Fulfillment(format!("ad {ad_id} not found")));
				}
			}
			FulfillmentPlan::Urgent {
				ad_id,
				urgent_at,
				urgent_until,
			} => {
				let updated = sqlx::query(
					"UPDATE ads SET is_urgent = TRUE, urgent_at = $1, urgent_until = $2 \
					 WHERE id = $3",
				)
				.bind(urgent_at)
				.bind(urgent_until)
				.bind(ad_id)
				.execute(&mut **tx)
				.await?
				.rows_affected();
				if updated == 0 {
					return Err(StoreError::Fulfillment(format!("ad {ad_id} not found")));
				}
			}
			FulfillmentPlan::Subscription {
				user_id,
				plan_id,
				payment_reference,
				start_date,
				end_date,
			} => {
				sqlx::query(
					"INSERT INTO user_subscriptions \
					 (id, user_id, plan_id, payment_reference, start_date, end_date, status) \
					 VALUES ($1, $2, $3, $4, $5, $6, $7)",
				)
				.bind(Uuid::new_v4())
				.bind(user_id)
				.bind(plan_id)
				.bind(payment_reference)
				.bind(start_date)
				.bind(end_date)
				.bind(SubscriptionStatus::Active.as_str())
				.execute(&mut **tx)
				.await?;
			}
		}
		Ok(())
	}
}

#[async_trait]
impl PaymentStore for PgPaymentStore {
	async fn create_payment(&self, new: NewPayment) -> Result<Payment, StoreError> {
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

		let result = sqlx::query(
			"INSERT INTO payments \
			 (id, user_id, ad_id, subscription_plan_id, service, amount, reference, status, created_at) \
			 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
		)
		.bind(payment.id)
		.bind(payment.user_id)
		.bind(payment.ad_id)
		.bind(payment.subscription_plan_id)
		.bind(payment.service.as_str())
		.bind(payment.amount)
		.bind(&payment.reference)
		.bind(payment.status.as_str())
		.bind(payment.created_at)
		.execute(&self.pool)
		.await;

		match result {
			Ok(_) => Ok(payment),
			Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
				Err(StoreError::DuplicateReference(payment.reference))
			}
			Err(e) => Err(e.into()),
		}
	}

	async fn find_by_reference(
		&self,
		reference: &str,
		owner: Option<Uuid>,
	) -> Result<Option<Payment>, StoreError> {
		let row = match owner {
			Some(user_id) => {
				sqlx::query("SELECT * FROM payments WHERE reference = $1 AND user_id = $2")
					.bind(reference)
					.bind(user_id)
					.fetch_optional(&self.pool)
					.await?
			}
			None => {
				sqlx::query("SELECT * FROM payments WHERE reference = $1")
					.bind(reference)
					.fetch_optional(&self.pool)
					.await?
			}
		};
		row.as_ref().map(Self::row_to_payment).transpose()
	}

	async fn find_plan(&self, plan_id: Uuid) -> Result<Option<SubscriptionPlan>, StoreError> {
		let row = sqlx::query(
			"SELECT id, name, amount, duration FROM subscription_plans WHERE id = $1",
		)
		.bind(plan_id)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|row| {
			let duration: String = row.try_get("duration")?;
			Ok(SubscriptionPlan {
				id: row.try_get("id")?,
				name: row.try_get("name")?,
				amount: row.try_get("amount")?,
				duration: duration.parse::<PlanDuration>().map_err(StoreError::Corrupt)?,
			})
		})
		.transpose()
	}

	async fn find_ad_owner(&self, ad_id: Uuid) -> Result<Option<Uuid>, StoreError> {
		let row = sqlx::query("SELECT user_id FROM ads WHERE id = $1")
			.bind(ad_id)
			.fetch_optional(&self.pool)
			.await?;
		row.map(|row| row.try_get("user_id").map_err(StoreError::from))
			.transpose()
	}

	async fn transition(
		&self,
		payment_id: Uuid,
		from: PaymentStatus,
		to: PaymentStatus,
		payload: Option<serde_json::Value>,
	) -> Result<bool, StoreError> {
		let updated = sqlx::query(
			"UPDATE payments \
			 SET status = $1, gateway_payload = COALESCE($2, gateway_payload), verified_at = $3 \
			 WHERE id = $4 AND status = $5",
		)
		.bind(to.as_str())
		.bind(payload)
		.bind(Utc::now())
		.bind(payment_id)
		.bind(from.as_str())
		.execute(&self.pool)
		.await?
		.rows_affected();

		debug!(%payment_id, %from, %to, won = updated > 0, "conditional transition");
		Ok(updated > 0)
	}

	async fn complete_and_fulfill(
		&self,
		payment_id: Uuid,
		payload: serde_json::Value,
		plan: &FulfillmentPlan,
	) -> Result<bool, StoreError> {
		let mut tx = self.pool.begin().await?;

		let updated = sqlx::query(
			"UPDATE payments SET status = $1, gateway_payload = $2, verified_at = $3 \
			 WHERE id = $4 AND status = $5",
		)
		.bind(PaymentStatus::Completed.as_str())
		.bind(payload)
		.bind(Utc::now())
		.bind(payment_id)
		.bind(PaymentStatus::Pending.as_str())
		.execute(&mut *tx)
		.await?
		.rows_affected();

		if updated == 0 {
			// Guard lost: another confirmation already settled this row.
			tx.rollback().await?;
			return Ok(false);
		}

		Self::apply_plan(&mut tx, plan).await?;
		tx.commit().await?;
		Ok(true)
	}
}
