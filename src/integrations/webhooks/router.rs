//! Event router for parsed webhook events
//!
//! The router owns a handler registry mapping each event type to exactly one
//! handler. Registering a second handler for the same type replaces the
//! first; there is no fan-out. Registration takes `&mut self` and dispatch
//! takes `&self`, so a router is populated before it is shared for routing.
//! Callers that need to re-register under concurrent load must add their own
//! synchronization around the router.

use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use super::error::{HandlerError, WebhookError, WebhookResult};
use super::event::WebhookEvent;

/// A handler for one webhook event type.
///
/// Implemented for any `Fn(WebhookEvent) -> impl Future<Output = Result<(), HandlerError>>`,
/// so plain async closures can be registered directly.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: WebhookEvent) -> Result<(), HandlerError>;
}

#[async_trait]
impl<F, Fut> EventHandler for F
where
    F: Fn(WebhookEvent) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    async fn handle(&self, event: WebhookEvent) -> Result<(), HandlerError> {
        (self)(event).await
    }
}

/// Dispatches each event to the single handler registered for its type.
#[derive(Default, Clone)]
pub struct EventRouter {
    /// Registered handlers by event type
    handlers: HashMap<String, Arc<dyn EventHandler>>,
}

impl std::fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRouter")
            .field("event_types", &self.event_types())
            .finish()
    }
}

impl EventRouter {
    /// Create a router with an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an async closure as the handler for an event type.
    ///
    /// If a handler is already registered for the type, it is replaced.
    pub fn register<F, Fut>(&mut self, event_type: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(WebhookEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.register_handler(event_type, handler)
    }

    /// Alias for [`register`](EventRouter::register).
    pub fn on<F, Fut>(&mut self, event_type: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(WebhookEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.register_handler(event_type, handler)
    }

    /// Register any [`EventHandler`] implementation for an event type.
    ///
    /// If a handler is already registered for the type, it is replaced.
    pub fn register_handler<H>(&mut self, event_type: impl Into<String>, handler: H) -> &mut Self
    where
        H: EventHandler + 'static,
    {
        let event_type = event_type.into();
        if self
            .handlers
            .insert(event_type.clone(), Arc::new(handler))
            .is_some()
        {
            tracing::debug!(event_type = %event_type, "Replaced webhook handler");
        }
        self
    }

    /// Dispatch an event to its handler and wait for it to finish.
    ///
    /// # Errors
    /// * `WebhookError::NoHandler` if nothing is registered for the event type
    /// * the handler's own error, propagated via [`WebhookError::from_handler`]
    pub async fn route(&self, event: WebhookEvent) -> WebhookResult<()> {
        let handler = self
            .handlers
            .get(&event.event_type)
            .cloned()
            .ok_or_else(|| WebhookError::NoHandler {
                event_type: event.event_type.clone(),
            })?;

        tracing::debug!(event_type = %event.event_type, event_id = %event.id, "Routing webhook event");

        handler
            .handle(event)
            .await
            .map_err(WebhookError::from_handler)
    }

    pub fn has_handler(&self, event_type: &str) -> bool {
        self.handlers.contains_key(event_type)
    }

    /// Registered event types, sorted.
    pub fn event_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.handlers.keys().map(|s| s.as_str()).collect();
        types.sort_unstable();
        types
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn event(event_type: &str) -> WebhookEvent {
        WebhookEvent::new("evt_1", event_type, json!({}), "2024-01-01T00:00:00Z")
    }

    #[tokio::test]
    async fn test_route_to_registered_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut router = EventRouter::new();
        router.on("ping", move |event: WebhookEvent| {
            let counter = counter.clone();
            async move {
                assert_eq!(event.event_type, "ping");
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        router.route(event("ping")).await.unwrap();
        router.route(event("ping")).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_last_registration_wins() {
        let hits = Arc::new(AtomicUsize::new(0));
        let first = hits.clone();
        let second = hits.clone();

        let mut router = EventRouter::new();
        router
            .on("ping", move |_event: WebhookEvent| {
                let first = first.clone();
                async move {
                    first.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .on("ping", move |_event: WebhookEvent| {
                let second = second.clone();
                async move {
                    second.fetch_add(100, Ordering::SeqCst);
                    Ok(())
                }
            });

        router.route(event("ping")).await.unwrap();
        assert_eq!(router.len(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 100);
    }

    #[tokio::test]
    async fn test_unregistered_type_names_the_type() {
        let router = EventRouter::new();
        let err = router.route(event("file.moved")).await.unwrap_err();

        assert!(matches!(
            &err,
            WebhookError::NoHandler { event_type } if event_type == "file.moved"
        ));
        assert!(err.to_string().contains("file.moved"));
    }

    #[tokio::test]
    async fn test_handler_error_propagates() {
        let mut router = EventRouter::new();
        router.on("ping", |_event: WebhookEvent| async {
            Err::<(), HandlerError>("database offline".into())
        });

        let err = router.route(event("ping")).await.unwrap_err();
        assert!(matches!(err, WebhookError::Handler(ref source) if source.to_string() == "database offline"));
    }

    #[test]
    fn test_event_types_sorted() {
        let mut router = EventRouter::new();
        router
            .on("b", |_e: WebhookEvent| async { Ok(()) })
            .on("a", |_e: WebhookEvent| async { Ok(()) });

        assert_eq!(router.event_types(), vec!["a", "b"]);
        assert!(router.has_handler("a"));
        assert!(!router.has_handler("c"));
        assert!(!router.is_empty());
    }

    #[tokio::test]
    async fn test_independent_routers_do_not_share_handlers() {
        let mut tenant_a = EventRouter::new();
        tenant_a.on("ping", |_e: WebhookEvent| async { Ok(()) });
        let tenant_b = EventRouter::new();

        assert!(tenant_a.route(event("ping")).await.is_ok());
        assert!(tenant_b.route(event("ping")).await.is_err());
    }

    struct Recorder {
        seen: Arc<std::sync::Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl EventHandler for Recorder {
        async fn handle(&self, event: WebhookEvent) -> Result<(), HandlerError> {
            self.seen.lock().unwrap().push(event.id);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_struct_handler() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut router = EventRouter::new();
        router.register_handler("ping", Recorder { seen: seen.clone() });

        router.route(event("ping")).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["evt_1".to_string()]);
    }
}
