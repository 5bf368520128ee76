//! Inbound webhook authentication and event parsing.
//!
//! Deliveries arrive on an unauthenticated transport; the payload is
//! authenticated by a keyed digest over the raw body. Nothing in this
//! module inspects JSON before the signature check has succeeded.

mod event;
mod signature;

pub use event::{ChargeData, WebhookEvent};
pub use signature::SignatureVerifier;
