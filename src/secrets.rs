//! Webhook secret lookup
//!
//! Credential storage lives outside this crate. Configuration consults a
//! [`SecretStore`] for any webhook secret it does not carry itself.

use std::collections::HashMap;

/// Source of webhook secrets, keyed by integration name.
pub trait SecretStore: Send + Sync {
    /// The webhook secret for an integration, if one is stored.
    fn webhook_secret(&self, integration: &str) -> Option<String>;
}

/// Reads `<NAME>_WEBHOOK_SECRET` from the environment.
///
/// The integration name is uppercased and `-` becomes `_`, so `github`
/// reads `GITHUB_WEBHOOK_SECRET`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecretStore;

impl EnvSecretStore {
    /// The environment variable consulted for an integration.
    pub fn variable_name(integration: &str) -> String {
        format!(
            "{}_WEBHOOK_SECRET",
            integration.to_uppercase().replace('-', "_")
        )
    }
}

impl SecretStore for EnvSecretStore {
    fn webhook_secret(&self, integration: &str) -> Option<String> {
        std::env::var(Self::variable_name(integration))
            .ok()
            .filter(|s| !s.is_empty())
    }
}

/// Fixed in-memory secrets.
#[derive(Debug, Clone, Default)]
pub struct StaticSecretStore {
    secrets: HashMap<String, String>,
}

impl StaticSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, integration: impl Into<String>, secret: impl Into<String>) -> Self {
        self.secrets.insert(integration.into(), secret.into());
        self
    }
}

impl SecretStore for StaticSecretStore {
    fn webhook_secret(&self, integration: &str) -> Option<String> {
        self.secrets.get(integration).cloned()
    }
}
