//! Server-side price table for ad boost services.
//!
//! Amounts are always derived here (or from the subscription plan row),
//! never taken from the caller. A caller-supplied amount is only ever
//! compared against the derived one.

use crate::types::ServiceKind;

/// Prices for ad boost services in minor currency units.
#[derive(Debug, Clone)]
pub struct PriceTable {
	/// Price of a bump
	pub bump: i64,
	/// Price of a featured placement
	pub feature: i64,
	/// Price of an urgent badge
	pub urgent: i64,
}

impl Default for PriceTable {
	fn default() -> Self {
		Self {
			bump: 50_000,
			feature: 150_000,
			urgent: 75_000,
		}
	}
}

impl PriceTable {
	/// Price for a boost service.
	///
	/// Returns `None` for [`ServiceKind::Subscription`]: subscription
	/// amounts come from the plan row, not this table.
	#[must_use]
	pub fn amount_for(&self, service: ServiceKind) -> Option<i64> {
		match service {
			ServiceKind::Bump => Some(self.bump),
			ServiceKind::Feature => Some(self.feature),
			ServiceKind::Urgent => Some(self.urgent),
			ServiceKind::Subscription => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_boost_services_have_prices() {
		let prices = PriceTable::default();
		assert_eq!(prices.amount_for(ServiceKind::Bump), Some(50_000));
		assert_eq!(prices.amount_for(ServiceKind::Feature), Some(150_000));
		assert_eq!(prices.amount_for(ServiceKind::Urgent), Some(75_000));
	}

	#[test]
	fn test_subscription_is_priced_by_plan() {
		let prices = PriceTable::default();
		assert_eq!(prices.amount_for(ServiceKind::Subscription), None);
	}
}
