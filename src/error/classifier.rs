//! Upstream error classifier
//!
//! Turns an arbitrary, schema-less upstream error into a [`ClassifiedError`].
//! Classification is total: any input, including `null`, empty objects and
//! bare primitives, yields a usable value.
//!
//! Resolution order, first match wins:
//! 1. an exact table entry for the extracted code
//! 2. the HTTP status fallback ladder ([`ErrorKind::from_status_value`])

use serde_json::Value;

use super::classification::{ClassifiedError, ErrorCode, ErrorKind, DEFAULT_MESSAGE};
use super::table::ClassificationTable;

/// Fields searched for the error code, in priority order.
const CODE_FIELDS: [&str; 3] = ["code", "error_code", "type"];

/// Fields searched for the HTTP status, in priority order.
const STATUS_FIELDS: [&str; 2] = ["statusCode", "status"];

/// Classify a raw upstream error against an integration's table.
///
/// The raw error is always kept as the result's `cause`.
pub fn classify(raw: Value, table: &ClassificationTable) -> ClassifiedError {
    let code = extract_code(&raw);
    let status = extract_status(&raw);
    let message = extract_message(&raw);

    let (kind, retryable, source) = match table.get(&code) {
        Some(entry) => (entry.kind, entry.retryable, "table"),
        None => {
            let kind = ErrorKind::from_status_value(status);
            (kind, kind.is_retryable_by_default(), "status")
        }
    };

    tracing::debug!(
        kind = %kind,
        code = %code,
        status = ?status,
        retryable,
        source,
        "Classified upstream error"
    );

    ClassifiedError::from_parts(
        kind,
        retryable,
        code,
        message,
        status.and_then(http_status),
        Some(raw),
    )
}

/// Pull the first present code field.
///
/// Presence is what counts: `0` and `""` are valid codes. Values that are
/// neither strings nor numbers are skipped.
fn extract_code(raw: &Value) -> ErrorCode {
    CODE_FIELDS
        .iter()
        .find_map(|field| match raw.get(field)? {
            Value::String(s) => Some(ErrorCode::Text(s.clone())),
            Value::Number(n) => Some(ErrorCode::Number(n.clone())),
            _ => None,
        })
        .unwrap_or_else(ErrorCode::unknown)
}

/// The first numeric status, unnarrowed so the ladder sees its full value.
fn extract_status(raw: &Value) -> Option<f64> {
    STATUS_FIELDS
        .iter()
        .find_map(|field| status_from_value(raw.get(field)?))
}

fn status_from_value(value: &Value) -> Option<f64> {
    let status = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    status.filter(|s| s.is_finite())
}

/// The stored status code: whole numbers that fit in `u16`.
fn http_status(status: f64) -> Option<u16> {
    (status.fract() == 0.0 && (0.0..=f64::from(u16::MAX)).contains(&status))
        .then(|| status as u16)
}

/// The upstream message, or a bare string error itself, else the default.
fn extract_message(raw: &Value) -> String {
    let candidate = match raw {
        Value::String(s) => Some(s.as_str()),
        other => other.get("message").and_then(Value::as_str),
    };
    candidate
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(DEFAULT_MESSAGE)
        .to_string()
}

/// A classifier bound to one integration's table.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    integration: String,
    table: ClassificationTable,
}

impl ErrorClassifier {
    pub fn new(integration: impl Into<String>, table: ClassificationTable) -> Self {
        Self {
            integration: integration.into(),
            table,
        }
    }

    /// Name of the integration this classifier serves.
    pub fn integration(&self) -> &str {
        &self.integration
    }

    pub fn table(&self) -> &ClassificationTable {
        &self.table
    }

    /// Classify a raw upstream error from this integration.
    pub fn classify(&self, raw: Value) -> ClassifiedError {
        let _span = tracing::debug_span!("classify", integration = %self.integration).entered();
        classify(raw, &self.table)
    }
}
