//! Typed handler registration
//!
//! These wrappers decode an event's `data` into a concrete type before the
//! handler runs. They sit on top of the same untyped registry: a typed
//! handler is an ordinary [`EventHandler`] that decodes first.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::marker::PhantomData;

use super::error::{HandlerError, WebhookError};
use super::event::WebhookEvent;
use super::router::{EventHandler, EventRouter};

/// Event type for a newly created file.
pub const FILE_CREATED: &str = "file.created";
/// Event type for a modified file.
pub const FILE_UPDATED: &str = "file.updated";
/// Event type for a removed file.
pub const FILE_DELETED: &str = "file.deleted";

/// An event whose `data` has been decoded into `T`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedEvent<T> {
    pub id: String,
    pub event_type: String,
    pub timestamp: String,
    pub data: T,
}

/// Payload of the `file.*` events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEvent {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

struct TypedHandler<T, F> {
    handler: F,
    _data: PhantomData<fn() -> T>,
}

#[async_trait]
impl<T, F, Fut> EventHandler for TypedHandler<T, F>
where
    T: DeserializeOwned + Send + 'static,
    F: Fn(TypedEvent<T>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    async fn handle(&self, event: WebhookEvent) -> Result<(), HandlerError> {
        let data: T = serde_json::from_value(event.data).map_err(|e| {
            Box::new(WebhookError::Parse(format!(
                "invalid `{}` payload: {}",
                event.event_type, e
            ))) as HandlerError
        })?;

        (self.handler)(TypedEvent {
            id: event.id,
            event_type: event.event_type,
            timestamp: event.timestamp,
            data,
        })
        .await
    }
}

impl EventRouter {
    /// Register a handler that receives `data` decoded as `T`.
    ///
    /// A payload that does not decode fails routing with `WebhookError::Parse`.
    pub fn on_typed<T, F, Fut>(&mut self, event_type: impl Into<String>, handler: F) -> &mut Self
    where
        T: DeserializeOwned + Send + 'static,
        F: Fn(TypedEvent<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.register_handler(
            event_type,
            TypedHandler {
                handler,
                _data: PhantomData,
            },
        )
    }

    pub fn on_file_created<F, Fut>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(TypedEvent<FileEvent>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.on_typed(FILE_CREATED, handler)
    }

    pub fn on_file_updated<F, Fut>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(TypedEvent<FileEvent>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.on_typed(FILE_UPDATED, handler)
    }

    pub fn on_file_deleted<F, Fut>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(TypedEvent<FileEvent>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.on_typed(FILE_DELETED, handler)
    }
}
