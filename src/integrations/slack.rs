//! Slack integration
//!
//! Slack Web API failures come back as `{"ok": false, "error": "..."}`; the
//! request layer lifts `error` into `code` before classification.

use super::descriptor::{Integration, WebhookSettings};
use super::webhooks::SignatureScheme;
use crate::error::{ClassificationTable, ErrorKind, TableError};

pub const NAME: &str = "slack";

/// Header carrying the app's verification token.
pub const TOKEN_HEADER: &str = "X-Slack-Verification-Token";

pub fn table() -> Result<ClassificationTable, TableError> {
    ClassificationTable::builder()
        .with_network_defaults()
        .kind("not_authed", ErrorKind::Authentication)
        .kind("invalid_auth", ErrorKind::Authentication)
        .kind("token_revoked", ErrorKind::Authentication)
        .kind("token_expired", ErrorKind::Authentication)
        .kind("missing_scope", ErrorKind::Authorization)
        .kind("not_allowed_token_type", ErrorKind::Authorization)
        .kind("channel_not_found", ErrorKind::NotFound)
        .kind("user_not_found", ErrorKind::NotFound)
        .kind("invalid_arguments", ErrorKind::Validation)
        .kind("ratelimited", ErrorKind::RateLimit)
        .kind("internal_error", ErrorKind::Server)
        .kind("fatal_error", ErrorKind::Server)
        .build()
}

pub fn integration() -> Result<Integration, TableError> {
    Ok(Integration::new(NAME, table()?)
        .with_webhook(WebhookSettings::new(TOKEN_HEADER, SignatureScheme::SharedSecret)))
}
