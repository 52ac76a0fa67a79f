//! Integration descriptor
//!
//! An [`Integration`] bundles everything that differs between third-party
//! services: its name, its classification table and how it authenticates
//! webhook deliveries. All behaviour is shared; integrations are data.

use serde_json::Value;

use super::webhooks::{SignatureScheme, WebhookVerifier};
use crate::error::{ClassificationTable, ClassifiedError, ErrorClassifier};

/// How an integration delivers webhooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookSettings {
    /// Header carrying the secret or signature
    pub header: String,
    pub scheme: SignatureScheme,
}

impl WebhookSettings {
    pub fn new(header: impl Into<String>, scheme: SignatureScheme) -> Self {
        Self {
            header: header.into(),
            scheme,
        }
    }
}

/// A third-party integration.
#[derive(Debug, Clone)]
pub struct Integration {
    classifier: ErrorClassifier,
    webhook: Option<WebhookSettings>,
}

impl Integration {
    /// Create an integration with the given classification table and no webhooks.
    pub fn new(name: impl Into<String>, table: ClassificationTable) -> Self {
        Self {
            classifier: ErrorClassifier::new(name, table),
            webhook: None,
        }
    }

    /// Enable webhook delivery for this integration.
    pub fn with_webhook(mut self, settings: WebhookSettings) -> Self {
        self.webhook = Some(settings);
        self
    }

    /// Layer table overrides on top of the integration's table.
    pub fn with_table_overrides(self, overrides: &ClassificationTable) -> Self {
        let table = self.classifier.table().with_overrides(overrides);
        Self {
            classifier: ErrorClassifier::new(self.classifier.integration(), table),
            webhook: self.webhook,
        }
    }

    pub fn name(&self) -> &str {
        self.classifier.integration()
    }

    pub fn table(&self) -> &ClassificationTable {
        self.classifier.table()
    }

    pub fn classifier(&self) -> &ErrorClassifier {
        &self.classifier
    }

    pub fn webhook(&self) -> Option<&WebhookSettings> {
        self.webhook.as_ref()
    }

    /// Classify a raw error returned by this integration's API.
    pub fn classify(&self, raw: Value) -> ClassifiedError {
        self.classifier.classify(raw)
    }

    /// Build a verifier for this integration's deliveries.
    ///
    /// Returns `None` when the integration has no webhooks.
    pub fn verifier(&self, secret: impl Into<String>) -> Option<WebhookVerifier> {
        self.webhook.as_ref().map(|settings| {
            WebhookVerifier::new(secret, settings.scheme.clone(), settings.header.clone())
        })
    }
}
