//! GitHub integration
//!
//! GitHub signs deliveries with HMAC-SHA256 in `X-Hub-Signature-256`
//! (`sha256=<hex>`). Its REST errors mostly carry only a status and a
//! message, so the table is small.

use super::descriptor::{Integration, WebhookSettings};
use super::webhooks::SignatureScheme;
use crate::error::{ClassificationTable, ErrorKind, TableError};

pub const NAME: &str = "github";

/// Header GitHub puts the payload signature in.
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

pub fn table() -> Result<ClassificationTable, TableError> {
    ClassificationTable::builder()
        .with_network_defaults()
        .entry("secondary_rate_limit", ErrorKind::RateLimit, true)
        .kind("bad_credentials", ErrorKind::Authentication)
        .kind("missing_field", ErrorKind::Validation)
        .kind("already_exists", ErrorKind::Validation)
        .kind("unprocessable", ErrorKind::Validation)
        .build()
}

pub fn integration() -> Result<Integration, TableError> {
    Ok(Integration::new(NAME, table()?).with_webhook(WebhookSettings::new(
        SIGNATURE_HEADER,
        SignatureScheme::HmacSha256 {
            prefix: Some("sha256=".to_string()),
        },
    )))
}
