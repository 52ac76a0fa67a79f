//! Webhook server implementation
//!
//! Provides one HTTP endpoint per integration, `POST /webhooks/{integration}`.
//! Each delivery is verified, parsed into a `WebhookEvent` and dispatched
//! through that integration's [`EventRouter`].

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use super::error::{WebhookError, WebhookResult};
use super::event::parse_event_slice;
use super::router::EventRouter;
use super::verifier::WebhookVerifier;

/// Where deliveries for one integration go.
#[derive(Debug, Clone)]
pub struct WebhookEndpoint {
    /// `None` when no secret is configured; verification is then skipped
    verifier: Option<WebhookVerifier>,
    router: Arc<EventRouter>,
}

impl WebhookEndpoint {
    pub fn new(verifier: Option<WebhookVerifier>, router: EventRouter) -> Self {
        Self {
            verifier,
            router: Arc::new(router),
        }
    }

    pub fn verifier(&self) -> Option<&WebhookVerifier> {
        self.verifier.as_ref()
    }

    pub fn router(&self) -> &EventRouter {
        &self.router
    }
}

/// Shared application state for the webhook server
#[derive(Debug, Clone)]
pub struct AppState {
    /// Endpoints by integration name
    endpoints: Arc<HashMap<String, WebhookEndpoint>>,
    /// Indicates if the server is healthy
    pub healthy: Arc<RwLock<bool>>,
}

impl AppState {
    /// Create a new AppState serving the given endpoints
    pub fn new(endpoints: HashMap<String, WebhookEndpoint>) -> Self {
        Self {
            endpoints: Arc::new(endpoints),
            healthy: Arc::new(RwLock::new(true)),
        }
    }

    pub fn endpoint(&self, integration: &str) -> Option<&WebhookEndpoint> {
        self.endpoints.get(integration)
    }

    /// Integration names with an endpoint, sorted
    pub fn integrations(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.endpoints.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Set the health status
    pub async fn set_healthy(&self, healthy: bool) {
        let mut guard = self.healthy.write().await;
        *guard = healthy;
    }

    /// Check if the server is healthy
    pub async fn is_healthy(&self) -> bool {
        *self.healthy.read().await
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(HashMap::new())
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Response to an accepted delivery
#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub received: bool,
    pub event_type: String,
    pub event_id: String,
}

/// Create the webhook router with all routes
pub fn create_webhook_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/webhooks/{integration}", post(webhook_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint handler
///
/// GET /health
///
/// Returns the current health status of the webhook server.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.is_healthy().await {
        "healthy"
    } else {
        "unhealthy"
    };

    Json(HealthResponse {
        status: status.to_string(),
        service: "hookwise".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Verify a delivery against the integration's verifier.
///
/// Returns Ok(()) if the signature is valid or no secret is configured.
/// Returns Err(WebhookError::InvalidSignature) if the header is missing or wrong.
fn verify_signature(
    integration: &str,
    verifier: Option<&WebhookVerifier>,
    payload: &[u8],
    headers: &HeaderMap,
) -> WebhookResult<()> {
    let Some(verifier) = verifier else {
        tracing::warn!(
            integration = %integration,
            "No webhook secret configured, skipping verification"
        );
        return Ok(());
    };

    let provided = headers
        .get(verifier.header())
        .and_then(|v| v.to_str().ok())
        .ok_or(WebhookError::InvalidSignature)?;

    if verifier.verify_request(payload, provided) {
        Ok(())
    } else {
        Err(WebhookError::InvalidSignature)
    }
}

/// Webhook endpoint handler
///
/// POST /webhooks/{integration}
///
/// Returns 404 for an unknown integration, 401 on a bad signature, 400 for
/// an unparseable payload or an event type with no handler and 500 when the
/// handler fails.
pub async fn webhook_handler(
    State(state): State<AppState>,
    Path(integration): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> WebhookResult<Json<WebhookResponse>> {
    let endpoint = state
        .endpoint(&integration)
        .ok_or_else(|| WebhookError::UnknownIntegration(integration.clone()))?;

    if let Err(err) = verify_signature(&integration, endpoint.verifier(), &body, &headers) {
        tracing::warn!(integration = %integration, "Rejected webhook with invalid signature");
        return Err(err);
    }

    let event = parse_event_slice(&body)?;
    let event_type = event.event_type.clone();
    let event_id = event.id.clone();

    tracing::info!(
        integration = %integration,
        event_type = %event_type,
        event_id = %event_id,
        "Received webhook"
    );

    if let Err(err) = endpoint.router().route(event).await {
        if matches!(err, WebhookError::Handler(_)) {
            tracing::error!(
                integration = %integration,
                event_type = %event_type,
                error = %err,
                "Webhook handler failed"
            );
        }
        return Err(err);
    }

    Ok(Json(WebhookResponse {
        received: true,
        event_type,
        event_id,
    }))
}

/// Serve the webhook router until Ctrl+C or SIGTERM.
///
/// # Errors
///
/// Returns `std::io::Error` if the address cannot be bound.
pub async fn start_server(state: AppState, addr: &str) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "Webhook server listening");

    serve_until(state, listener, shutdown_signal()).await?;

    tracing::info!("Webhook server stopped");
    Ok(())
}

/// Serve on a bound listener until `shutdown` completes.
///
/// `/health` reports `unhealthy` from the moment shutdown begins while
/// in-flight deliveries drain.
pub async fn serve_until<F>(
    state: AppState,
    listener: TcpListener,
    shutdown: F,
) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_webhook_router(state.clone());

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            state.set_healthy(false).await;
            tracing::info!("Shutdown requested, draining connections");
        })
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::webhooks::{HandlerError, SignatureScheme, WebhookEvent};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Mutex;
    use tower::ServiceExt;

    const PAYLOAD: &str =
        r#"{"id":"evt_1","type":"file.created","data":{"id":"f_1","name":"a.txt"},"timestamp":"2024-01-01T00:00:00Z"}"#;

    fn github_verifier() -> WebhookVerifier {
        WebhookVerifier::new(
            "github-test-secret",
            SignatureScheme::HmacSha256 {
                prefix: Some("sha256=".to_string()),
            },
            "X-Hub-Signature-256",
        )
    }

    fn create_test_state(seen: Arc<Mutex<Vec<String>>>) -> AppState {
        let mut router = EventRouter::new();
        router
            .on("file.created", move |event: WebhookEvent| {
                let seen = seen.clone();
                async move {
                    seen.lock().unwrap().push(event.id);
                    Ok(())
                }
            })
            .on("file.deleted", |_event: WebhookEvent| async {
                Err::<(), HandlerError>("storage offline".into())
            });

        let mut endpoints = HashMap::new();
        endpoints.insert(
            "stripe".to_string(),
            WebhookEndpoint::new(
                Some(WebhookVerifier::shared_secret("whsec_test", "Stripe-Webhook-Secret")),
                router.clone(),
            ),
        );
        endpoints.insert(
            "github".to_string(),
            WebhookEndpoint::new(Some(github_verifier()), router.clone()),
        );
        endpoints.insert("open".to_string(), WebhookEndpoint::new(None, router));
        AppState::new(endpoints)
    }

    fn post(uri: &str, header: Option<(&str, &str)>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json");
        if let Some((name, value)) = header {
            builder = builder.header(name, value);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_app_state_health() {
        let state = AppState::default();
        assert!(state.is_healthy().await);

        state.set_healthy(false).await;
        assert!(!state.is_healthy().await);

        state.set_healthy(true).await;
        assert!(state.is_healthy().await);
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_webhook_router(AppState::default());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .unwrap();
        let health: HealthResponse = serde_json::from_slice(&body).unwrap();

        assert_eq!(health.status, "healthy");
        assert_eq!(health.service, "hookwise");
    }

    #[tokio::test]
    async fn test_shutdown_marks_unhealthy() {
        let state = AppState::default();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let server = tokio::spawn(serve_until(state.clone(), listener, async move {
            let _ = rx.await;
        }));
        assert!(state.is_healthy().await);

        tx.send(()).unwrap();
        server.await.unwrap().unwrap();
        assert!(!state.is_healthy().await);

        let response = create_webhook_router(state)
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .unwrap();
        let health: HealthResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(health.status, "unhealthy");
    }

    #[tokio::test]
    async fn test_shared_secret_delivery_is_routed() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let app = create_webhook_router(create_test_state(seen.clone()));

        let response = app
            .oneshot(post(
                "/webhooks/stripe",
                Some(("Stripe-Webhook-Secret", "whsec_test")),
                PAYLOAD,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .unwrap();
        let result: WebhookResponse = serde_json::from_slice(&body).unwrap();
        assert!(result.received);
        assert_eq!(result.event_type, "file.created");
        assert_eq!(result.event_id, "evt_1");
        assert_eq!(*seen.lock().unwrap(), vec!["evt_1".to_string()]);
    }

    #[tokio::test]
    async fn test_wrong_secret_is_unauthorized_and_not_routed() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let app = create_webhook_router(create_test_state(seen.clone()));

        let response = app
            .oneshot(post(
                "/webhooks/stripe",
                Some(("Stripe-Webhook-Secret", "whsec_nope")),
                PAYLOAD,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_signature_header() {
        let app = create_webhook_router(create_test_state(Arc::default()));

        let response = app
            .oneshot(post("/webhooks/stripe", None, PAYLOAD))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_hmac_delivery() {
        let app = create_webhook_router(create_test_state(Arc::default()));
        let signature = github_verifier().compute_signature(PAYLOAD.as_bytes());

        let response = app
            .clone()
            .oneshot(post(
                "/webhooks/github",
                Some(("X-Hub-Signature-256", signature.as_str())),
                PAYLOAD,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(post(
                "/webhooks/github",
                Some((
                    "X-Hub-Signature-256",
                    "sha256=0000000000000000000000000000000000000000000000000000000000000000",
                )),
                PAYLOAD,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_no_secret_skips_verification() {
        let app = create_webhook_router(create_test_state(Arc::default()));

        let response = app
            .oneshot(post("/webhooks/open", None, PAYLOAD))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_integration() {
        let app = create_webhook_router(create_test_state(Arc::default()));

        let response = app
            .oneshot(post("/webhooks/acme", None, PAYLOAD))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let app = create_webhook_router(create_test_state(Arc::default()));

        let response = app
            .oneshot(post("/webhooks/open", None, "not valid json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["error"]
            .as_str()
            .unwrap()
            .starts_with("Failed to parse webhook payload"));
    }

    #[tokio::test]
    async fn test_unhandled_event_type() {
        let app = create_webhook_router(create_test_state(Arc::default()));
        let payload = r#"{"id":"evt_2","type":"file.moved","data":{}}"#;

        let response = app
            .oneshot(post("/webhooks/open", None, payload))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_handler_failure_is_server_error() {
        let app = create_webhook_router(create_test_state(Arc::default()));
        let payload = r#"{"id":"evt_3","type":"file.deleted","data":{}}"#;

        let response = app
            .oneshot(post("/webhooks/open", None, payload))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_integrations_sorted() {
        let state = create_test_state(Arc::default());
        assert_eq!(state.integrations(), vec!["github", "open", "stripe"]);
    }
}
