//! Error classification types shared by every integration
//!
//! This module defines the closed error taxonomy ([`ErrorKind`]) and the
//! immutable value object ([`ClassifiedError`]) that the classifier produces
//! from an arbitrary upstream failure.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Message used when the upstream error carries no usable message.
pub const DEFAULT_MESSAGE: &str = "An unknown error occurred";

/// Abstract failure category, independent of any vendor's native codes.
///
/// Every classified error has exactly one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Credentials are missing, expired or invalid (HTTP 401).
    Authentication,
    /// Credentials are valid but lack permission (HTTP 403).
    Authorization,
    /// The request was rejected as malformed (HTTP 400/422).
    Validation,
    /// The addressed resource does not exist (HTTP 404).
    NotFound,
    /// The caller exceeded a rate limit or quota (HTTP 429).
    RateLimit,
    /// The upstream service failed (HTTP 5xx).
    Server,
    /// The request never completed at the transport level.
    Network,
    /// Nothing more specific could be determined.
    Unknown,
}

impl ErrorKind {
    /// All kinds, in declaration order.
    pub const ALL: [ErrorKind; 8] = [
        ErrorKind::Authentication,
        ErrorKind::Authorization,
        ErrorKind::Validation,
        ErrorKind::NotFound,
        ErrorKind::RateLimit,
        ErrorKind::Server,
        ErrorKind::Network,
        ErrorKind::Unknown,
    ];

    /// Whether errors of this kind are retryable when no table entry says otherwise.
    ///
    /// Only `RateLimit` and `Server` are.
    pub fn is_retryable_by_default(self) -> bool {
        matches!(self, ErrorKind::RateLimit | ErrorKind::Server)
    }

    /// Map an HTTP status to a kind using the fallback ladder.
    ///
    /// `>= 500` is a half-open range, so 500, 599 and anything above all map
    /// to `Server`. A missing status maps to `Unknown`.
    pub fn from_status(status: Option<u16>) -> ErrorKind {
        Self::from_status_value(status.map(f64::from))
    }

    /// The ladder over an unnarrowed numeric status.
    ///
    /// Exact codes must match exactly; 503.5 and 70000 still land in
    /// `Server`. Non-finite values map to `Unknown`.
    pub fn from_status_value(status: Option<f64>) -> ErrorKind {
        let Some(s) = status.filter(|s| s.is_finite()) else {
            return ErrorKind::Unknown;
        };
        if s >= 500.0 {
            return ErrorKind::Server;
        }
        match s {
            s if s == 401.0 => ErrorKind::Authentication,
            s if s == 403.0 => ErrorKind::Authorization,
            s if s == 404.0 => ErrorKind::NotFound,
            s if s == 400.0 || s == 422.0 => ErrorKind::Validation,
            s if s == 429.0 => ErrorKind::RateLimit,
            _ => ErrorKind::Unknown,
        }
    }

    /// The variant name, as used in serialized output and table files.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Authentication => "Authentication",
            ErrorKind::Authorization => "Authorization",
            ErrorKind::Validation => "Validation",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::RateLimit => "RateLimit",
            ErrorKind::Server => "Server",
            ErrorKind::Network => "Network",
            ErrorKind::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Largest magnitude below which every whole `f64` is an exact integer.
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

/// The code an upstream error was classified under.
///
/// Upstream APIs use both text and numeric codes; both are kept as given and
/// compared through their normalised string [`key`](ErrorCode::key).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    /// A numeric code such as an HTTP status or vendor error number.
    Number(serde_json::Number),
    /// A text code such as `"rate_limited"`.
    Text(String),
}

impl ErrorCode {
    /// Code used when the raw error carries none.
    pub fn unknown() -> Self {
        ErrorCode::Text("unknown".to_string())
    }

    /// The string form used for table lookups.
    ///
    /// Whole-number floats key as integers, so `401.0` finds `"401"`.
    pub fn key(&self) -> String {
        match self {
            ErrorCode::Number(n) => match n.as_f64() {
                Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < MAX_EXACT_FLOAT => {
                    format!("{}", f as i64)
                }
                _ => n.to_string(),
            },
            ErrorCode::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Number(n) => write!(f, "{}", n),
            ErrorCode::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ErrorCode {
    fn from(code: &str) -> Self {
        ErrorCode::Text(code.to_string())
    }
}

impl From<String> for ErrorCode {
    fn from(code: String) -> Self {
        ErrorCode::Text(code)
    }
}

impl From<i64> for ErrorCode {
    fn from(code: i64) -> Self {
        ErrorCode::Number(code.into())
    }
}

impl From<i32> for ErrorCode {
    fn from(code: i32) -> Self {
        ErrorCode::Number(code.into())
    }
}

impl From<u16> for ErrorCode {
    fn from(code: u16) -> Self {
        ErrorCode::Number(code.into())
    }
}

/// A classified upstream failure.
///
/// Built once per failure and never mutated. The serialized form omits
/// `cause`, since the raw upstream payload may carry sensitive data; use
/// [`cause`](ClassifiedError::cause) to recover it explicitly.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedError {
    message: String,
    code: ErrorCode,
    kind: ErrorKind,
    /// Only whole statuses within `u16`; the ladder still sees the rest.
    #[serde(skip_serializing_if = "Option::is_none")]
    status_code: Option<u16>,
    retryable: bool,
    #[serde(skip)]
    cause: Option<Value>,
}

impl ClassifiedError {
    /// Creates a classified error whose retryability follows the kind's default.
    pub fn new(kind: ErrorKind, code: impl Into<ErrorCode>, message: impl Into<String>) -> Self {
        Self::from_parts(
            kind,
            kind.is_retryable_by_default(),
            code.into(),
            message.into(),
            None,
            None,
        )
    }

    pub(crate) fn from_parts(
        kind: ErrorKind,
        retryable: bool,
        code: ErrorCode,
        message: String,
        status_code: Option<u16>,
        cause: Option<Value>,
    ) -> Self {
        let message = if message.trim().is_empty() {
            DEFAULT_MESSAGE.to_string()
        } else {
            message
        };
        Self {
            message,
            code,
            kind,
            status_code,
            retryable,
            cause,
        }
    }

    /// Attaches an HTTP status code.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    /// Attaches the original upstream error.
    pub fn with_cause(mut self, cause: Value) -> Self {
        self.cause = Some(cause);
        self
    }

    /// Human-readable message; never blank.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The code the error was classified under.
    pub fn code(&self) -> &ErrorCode {
        &self.code
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// Whether the failure is transient and safe to retry under backoff.
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    /// The raw upstream error this was classified from.
    pub fn cause(&self) -> Option<&Value> {
        self.cause.as_ref()
    }

    /// Consumes the error, returning the raw upstream error.
    pub fn into_cause(self) -> Option<Value> {
        self.cause
    }

    /// Serializes to JSON without the `cause` field.
    pub fn to_log_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| {
            serde_json::json!({
                "message": self.message,
                "code": self.code.key(),
                "kind": self.kind.as_str(),
                "retryable": self.retryable,
            })
        })
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ClassifiedError {}
