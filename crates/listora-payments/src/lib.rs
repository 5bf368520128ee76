//! # Listora Payments
//!
//! Payment confirmation and entitlement fulfillment for the Listora
//! marketplace: reconciles the payment gateway's notifications with the
//! application's own verification requests and applies purchased
//! effects (ad boosts, subscription periods) exactly once per payment
//! attempt.
//!
//! ## Architecture
//!
//! - [`gateway`]: thin REST client for the external payment processor
//! - [`webhook`]: HMAC authentication and parsing of inbound deliveries
//! - [`store`]: persistent payment ledger whose conditional transition
//!   is the single serialization point
//! - [`fulfillment`]: pure planning of the entitlement writes
//! - [`confirm`]: the two confirmation entry points (client verify and
//!   webhook push) converging on one guarded transition
//!
//! ## Correctness contract
//!
//! The guarded transition and the fulfillment writes commit in one
//! transaction. Duplicate or concurrent confirmations, arriving through
//! either path in any order, produce exactly one terminal state and
//! exactly one application of the purchased effect; a payment is never
//! completed without its side effects.

pub mod config;
pub mod confirm;
pub mod error;
pub mod fulfillment;
pub mod gateway;
pub mod pricing;
pub mod store;
pub mod types;
pub mod webhook;

pub use config::{ConfigError, GatewaySettings, PaymentsSettings};
pub use confirm::{ConfirmationService, InitializeRequest, InitializedPayment, WebhookAck};
pub use error::{GatewayError, PaymentError, SignatureError, StoreError};
pub use fulfillment::{plan_fulfillment, FulfillmentPlan, BUMP_DAYS, FEATURE_DAYS, URGENT_DAYS};
pub use gateway::{
	GatewayAuthorization, GatewayStatus, GatewayVerification, InitializeParams, PaymentGateway,
	RestGateway,
};
pub use pricing::PriceTable;
pub use store::{PaymentStore, PgPaymentStore};
pub use types::{
	NewPayment, Payment, PaymentStatus, PlanDuration, ServiceKind, SubscriptionPlan,
	SubscriptionStatus, UserSubscription,
};
pub use webhook::{ChargeData, SignatureVerifier, WebhookEvent};
