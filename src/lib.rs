//! Hookwise - error classification and webhook routing for third-party integrations
//!
//! Two concerns every integration shares:
//! - turning a vendor's raw API failure into a [`ClassifiedError`] with a
//!   common [`ErrorKind`] and retry decision, driven by a per-integration
//!   [`ClassificationTable`];
//! - accepting that vendor's webhook deliveries: verifying the shared secret,
//!   parsing the envelope and dispatching to a registered handler.

pub mod config;
pub mod error;
pub mod integrations;
pub mod logging;
pub mod secrets;

pub use error::{ClassificationTable, ClassifiedError, ErrorClassifier, ErrorCode, ErrorKind};
pub use integrations::webhooks::{
    parse_event, EventRouter, WebhookError, WebhookEvent, WebhookVerifier,
};
pub use integrations::{Integration, IntegrationRegistry};
