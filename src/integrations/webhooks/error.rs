//! Webhook error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Error returned by a webhook handler.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors on the inbound webhook path.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Invalid or missing signature
    #[error("Invalid or missing webhook signature")]
    InvalidSignature,

    /// The payload is not valid JSON or lacks a required envelope field
    #[error("Failed to parse webhook payload: {0}")]
    Parse(String),

    /// No handler is registered for the event type
    #[error("No handler registered for webhook event type: {event_type}")]
    NoHandler { event_type: String },

    /// The webhook path names an integration that is not registered
    #[error("Unknown integration: {0}")]
    UnknownIntegration(String),

    /// The registered handler failed
    #[error("Webhook handler failed: {0}")]
    Handler(#[source] HandlerError),
}

impl WebhookError {
    /// Wrap a handler failure, passing a `WebhookError` through unchanged.
    pub fn from_handler(err: HandlerError) -> Self {
        match err.downcast::<WebhookError>() {
            Ok(webhook_err) => *webhook_err,
            Err(other) => WebhookError::Handler(other),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,
            WebhookError::Parse(_) => StatusCode::BAD_REQUEST,
            WebhookError::NoHandler { .. } => StatusCode::BAD_REQUEST,
            WebhookError::UnknownIntegration(_) => StatusCode::NOT_FOUND,
            WebhookError::Handler(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Result type for webhook operations
pub type WebhookResult<T> = Result<T, WebhookError>;

/// Error response body
#[derive(Debug, Serialize)]
struct WebhookErrorResponse {
    error: String,
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(WebhookErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_error_display() {
        assert_eq!(
            WebhookError::InvalidSignature.to_string(),
            "Invalid or missing webhook signature"
        );
        assert_eq!(
            WebhookError::Parse("bad json".to_string()).to_string(),
            "Failed to parse webhook payload: bad json"
        );
        assert_eq!(
            WebhookError::NoHandler {
                event_type: "file.moved".to_string()
            }
            .to_string(),
            "No handler registered for webhook event type: file.moved"
        );
        assert_eq!(
            WebhookError::UnknownIntegration("acme".to_string()).to_string(),
            "Unknown integration: acme"
        );
    }

    #[test]
    fn test_from_handler_unwraps_webhook_errors() {
        let boxed: HandlerError = Box::new(WebhookError::Parse("missing id".to_string()));
        assert!(matches!(
            WebhookError::from_handler(boxed),
            WebhookError::Parse(msg) if msg == "missing id"
        ));

        let boxed: HandlerError = "downstream unavailable".into();
        let err = WebhookError::from_handler(boxed);
        assert!(matches!(err, WebhookError::Handler(_)));
        assert_eq!(
            err.to_string(),
            "Webhook handler failed: downstream unavailable"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            WebhookError::InvalidSignature.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            WebhookError::Parse(String::new()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WebhookError::UnknownIntegration(String::new()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            WebhookError::Handler("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
