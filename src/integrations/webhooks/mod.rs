//! Webhooks module
//!
//! This module contains the inbound webhook path: secret verification,
//! event parsing, handler routing and the HTTP server tying them together.

pub mod error;
pub mod event;
pub mod router;
pub mod server;
pub mod typed;
pub mod verifier;

pub use error::{HandlerError, WebhookError, WebhookResult};
pub use event::{parse_event, parse_event_slice, WebhookEvent};
pub use router::{EventHandler, EventRouter};
pub use server::{
    create_webhook_router, health_handler, serve_until, start_server, webhook_handler,
    AppState, WebhookEndpoint,
};
pub use typed::{FileEvent, TypedEvent, FILE_CREATED, FILE_DELETED, FILE_UPDATED};
pub use verifier::{verify, verify_bytes, SignatureScheme, WebhookVerifier};
