//! Configuration loading
//!
//! Configuration is read from a TOML file with `HOOKWISE__`-prefixed
//! environment overrides, e.g. `HOOKWISE__SERVER__PORT=8080`.
//!
//! ```toml
//! [server]
//! port = 3000
//!
//! [logging]
//! level = "debug"
//!
//! [integrations.stripe]
//! webhook_secret = "whsec_..."
//! events = ["invoice.paid"]
//!
//! [[integrations.stripe.codes]]
//! code = "card_declined"
//! kind = "Validation"
//! ```

use config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::error::{ClassificationTable, ErrorKind, TableEntry, TableError};
use crate::integrations::descriptor::WebhookSettings;
use crate::integrations::webhooks::SignatureScheme;
use crate::logging::LogLevel;
use crate::secrets::SecretStore;

/// Header used for integrations configured without one.
pub const DEFAULT_SECRET_HEADER: &str = "X-Webhook-Secret";

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// The configuration file could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(#[from] config::ConfigError),

    /// The configuration file path is invalid.
    #[error("invalid configuration path: {0}")]
    InvalidPath(String),
}

/// Webhook server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
        }
    }
}

impl ServerConfig {
    /// Get the full bind address (ip:port)
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

fn default_port() -> u16 {
    3000
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_true() -> bool {
    true
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default = "default_true")]
    pub timestamps: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            timestamps: true,
        }
    }
}

/// Which signature scheme an integration uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemeKind {
    SharedSecret,
    HmacSha256,
}

/// One classification override.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CodeOverride {
    pub code: String,
    pub kind: ErrorKind,
    /// Defaults to the kind's default retryability
    #[serde(default)]
    pub retryable: Option<bool>,
}

impl CodeOverride {
    pub fn entry(&self) -> TableEntry {
        match self.retryable {
            Some(retryable) => TableEntry::new(self.kind, retryable),
            None => TableEntry::of_kind(self.kind),
        }
    }
}

/// Settings for one `[integrations.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntegrationSettings {
    #[serde(default)]
    pub webhook_secret: Option<String>,
    #[serde(default)]
    pub signature_header: Option<String>,
    #[serde(default)]
    pub scheme: Option<SchemeKind>,
    #[serde(default)]
    pub signature_prefix: Option<String>,
    /// Event types the `serve` command registers logging handlers for
    #[serde(default)]
    pub events: Vec<String>,
    /// Classification overrides layered over the integration's table
    #[serde(default)]
    pub codes: Vec<CodeOverride>,
}

impl IntegrationSettings {
    /// The configured overrides as a table.
    pub fn overrides(&self) -> Result<ClassificationTable, TableError> {
        ClassificationTable::from_entries(
            self.codes
                .iter()
                .map(|code| (code.code.as_str(), code.entry())),
        )
    }

    /// Resolve webhook settings against those of the existing integration.
    ///
    /// Returns `None` only when there is no base and nothing webhook-related
    /// is configured.
    pub fn webhook_settings(&self, base: Option<&WebhookSettings>) -> Option<WebhookSettings> {
        let configured = self.webhook_secret.is_some()
            || self.signature_header.is_some()
            || self.scheme.is_some()
            || self.signature_prefix.is_some()
            || !self.events.is_empty();
        if base.is_none() && !configured {
            return None;
        }

        let header = self
            .signature_header
            .clone()
            .or_else(|| base.map(|b| b.header.clone()))
            .unwrap_or_else(|| DEFAULT_SECRET_HEADER.to_string());

        let scheme = match (self.scheme, base.map(|b| &b.scheme)) {
            (Some(SchemeKind::SharedSecret), _) => SignatureScheme::SharedSecret,
            (Some(SchemeKind::HmacSha256), _) => SignatureScheme::HmacSha256 {
                prefix: self.signature_prefix.clone(),
            },
            (None, Some(SignatureScheme::HmacSha256 { prefix })) => SignatureScheme::HmacSha256 {
                prefix: self.signature_prefix.clone().or_else(|| prefix.clone()),
            },
            (None, Some(scheme)) => scheme.clone(),
            (None, None) => SignatureScheme::default(),
        };

        Some(WebhookSettings::new(header, scheme))
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookwiseConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingSettings,
    /// Per-integration settings by integration name
    #[serde(default)]
    pub integrations: HashMap<String, IntegrationSettings>,
}

impl HookwiseConfig {
    /// Load configuration from a file path.
    ///
    /// Environment variables override file values using the format
    /// `HOOKWISE__<SECTION>__<KEY>`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration file does not exist
    /// - The configuration file cannot be parsed
    /// - The path is invalid
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let path_str = path
            .to_str()
            .ok_or_else(|| ConfigError::InvalidPath(format!("{:?}", path)))?;

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path_str.to_string()));
        }

        let config = Config::builder()
            .add_source(File::with_name(path_str))
            .add_source(
                Environment::with_prefix("HOOKWISE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Load from `path` if given, else use defaults with environment overrides.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let config = Config::builder()
                    .add_source(
                        Environment::with_prefix("HOOKWISE")
                            .prefix_separator("__")
                            .separator("__")
                            .try_parsing(true),
                    )
                    .build()?;
                Ok(config.try_deserialize()?)
            }
        }
    }

    /// The webhook secret for an integration.
    ///
    /// A secret in the configuration wins; otherwise the store is consulted.
    pub fn webhook_secret(&self, integration: &str, store: &dyn SecretStore) -> Option<String> {
        self.integrations
            .get(integration)
            .and_then(|settings| settings.webhook_secret.clone())
            .filter(|secret| !secret.is_empty())
            .or_else(|| store.webhook_secret(integration))
    }

    /// Event types configured for an integration.
    pub fn events(&self, integration: &str) -> &[String] {
        self.integrations
            .get(integration)
            .map(|settings| settings.events.as_slice())
            .unwrap_or(&[])
    }
}
