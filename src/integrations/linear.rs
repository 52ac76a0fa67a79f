//! Linear integration
//!
//! Linear signs deliveries with a bare hex HMAC-SHA256 in `Linear-Signature`.
//! Its GraphQL API reports failures through extension codes.

use super::descriptor::{Integration, WebhookSettings};
use super::webhooks::SignatureScheme;
use crate::error::{ClassificationTable, ErrorKind, TableError};

pub const NAME: &str = "linear";

pub const SIGNATURE_HEADER: &str = "Linear-Signature";

pub fn table() -> Result<ClassificationTable, TableError> {
    ClassificationTable::builder()
        .with_network_defaults()
        .kind("RATELIMITED", ErrorKind::RateLimit)
        .kind("AUTHENTICATION_ERROR", ErrorKind::Authentication)
        .kind("FORBIDDEN", ErrorKind::Authorization)
        .kind("INVALID_INPUT", ErrorKind::Validation)
        .kind("GRAPHQL_VALIDATION_FAILED", ErrorKind::Validation)
        .kind("ENTITY_NOT_FOUND", ErrorKind::NotFound)
        .kind("INTERNAL_SERVER_ERROR", ErrorKind::Server)
        .build()
}

pub fn integration() -> Result<Integration, TableError> {
    Ok(Integration::new(NAME, table()?).with_webhook(WebhookSettings::new(
        SIGNATURE_HEADER,
        SignatureScheme::HmacSha256 { prefix: None },
    )))
}
