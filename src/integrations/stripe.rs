//! Stripe integration
//!
//! Stripe errors carry a `type` and usually a more specific `code`. Webhooks
//! are verified against a shared endpoint secret.

use super::descriptor::{Integration, WebhookSettings};
use super::webhooks::SignatureScheme;
use crate::error::{ClassificationTable, ErrorKind, TableError};

pub const NAME: &str = "stripe";

pub const SECRET_HEADER: &str = "Stripe-Webhook-Secret";

pub fn table() -> Result<ClassificationTable, TableError> {
    ClassificationTable::builder()
        .with_network_defaults()
        .kind("authentication_error", ErrorKind::Authentication)
        .kind("card_declined", ErrorKind::Validation)
        .kind("invalid_request_error", ErrorKind::Validation)
        .kind("resource_missing", ErrorKind::NotFound)
        .kind("rate_limit", ErrorKind::RateLimit)
        .kind("api_error", ErrorKind::Server)
        .entry("api_connection_error", ErrorKind::Network, true)
        // Another request holds the object's lock; safe to retry.
        .entry("lock_timeout", ErrorKind::Validation, true)
        .kind("idempotency_error", ErrorKind::Validation)
        .build()
}

pub fn integration() -> Result<Integration, TableError> {
    Ok(Integration::new(NAME, table()?)
        .with_webhook(WebhookSettings::new(SECRET_HEADER, SignatureScheme::SharedSecret)))
}
