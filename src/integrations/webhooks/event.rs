//! Webhook event envelope
//!
//! Every inbound delivery is parsed into the same minimal envelope:
//! `{ "type": string, "data": any, "timestamp": string, "id": string }`.
//! `type` and `data` are required; a payload missing either is rejected
//! rather than coerced into an empty event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{WebhookError, WebhookResult};

/// A parsed webhook event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Discriminant used to pick the handler
    #[serde(rename = "type")]
    pub event_type: String,
    /// Provider-specific payload
    pub data: Value,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub id: String,
}

impl WebhookEvent {
    pub fn new(
        id: impl Into<String>,
        event_type: impl Into<String>,
        data: Value,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            data,
            timestamp: timestamp.into(),
            id: id.into(),
        }
    }

    /// The timestamp as UTC, if it is valid RFC 3339.
    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Parse a raw payload into a [`WebhookEvent`].
///
/// # Errors
/// Returns `WebhookError::Parse` if the payload is not JSON, is not an
/// object, lacks `type` or `data`, or has a `type` that is not a non-empty
/// string.
pub fn parse_event(payload: &str) -> WebhookResult<WebhookEvent> {
    parse_event_slice(payload.as_bytes())
}

/// Byte-slice form of [`parse_event`], for raw request bodies.
pub fn parse_event_slice(payload: &[u8]) -> WebhookResult<WebhookEvent> {
    let value: Value =
        serde_json::from_slice(payload).map_err(|e| WebhookError::Parse(e.to_string()))?;

    let object = value
        .as_object()
        .ok_or_else(|| WebhookError::Parse("payload is not a JSON object".to_string()))?;

    // Checked by key so that an explicit `"data": null` still counts as present.
    for field in ["type", "data"] {
        if !object.contains_key(field) {
            return Err(WebhookError::Parse(format!(
                "missing required field `{}`",
                field
            )));
        }
    }

    let event: WebhookEvent =
        serde_json::from_value(value).map_err(|e| WebhookError::Parse(e.to_string()))?;

    if event.event_type.is_empty() {
        return Err(WebhookError::Parse("event type is empty".to_string()));
    }

    Ok(event)
}
