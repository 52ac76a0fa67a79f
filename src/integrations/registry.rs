//! Integration registry
//!
//! This module provides a registry of [`Integration`]s by name, pre-seeded
//! with the built-in integrations and adjustable from configuration.

use std::collections::HashMap;

use super::descriptor::Integration;
use super::{github, linear, slack, stripe};
use crate::config::HookwiseConfig;
use crate::error::{ClassificationTable, TableError};

/// Registry of integrations by name
#[derive(Debug, Clone, Default)]
pub struct IntegrationRegistry {
    /// Registered integrations by name
    integrations: HashMap<String, Integration>,
}

impl IntegrationRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in integrations.
    pub fn with_builtins() -> Result<Self, TableError> {
        let mut registry = Self::new();
        registry.register(github::integration()?);
        registry.register(linear::integration()?);
        registry.register(slack::integration()?);
        registry.register(stripe::integration()?);
        Ok(registry)
    }

    /// Register an integration
    ///
    /// If an integration with the same name already exists, it will be replaced.
    ///
    /// # Returns
    /// The name of the registered integration
    pub fn register(&mut self, integration: Integration) -> String {
        let name = integration.name().to_string();
        self.integrations.insert(name.clone(), integration);
        name
    }

    /// Get an integration by name
    pub fn get(&self, name: &str) -> Option<&Integration> {
        self.integrations.get(name)
    }

    /// Check if an integration is registered
    pub fn has(&self, name: &str) -> bool {
        self.integrations.contains_key(name)
    }

    /// Remove an integration from the registry
    pub fn remove(&mut self, name: &str) -> Option<Integration> {
        self.integrations.remove(name)
    }

    /// All registered integration names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.integrations.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = &Integration> {
        self.integrations.values()
    }

    pub fn len(&self) -> usize {
        self.integrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.integrations.is_empty()
    }

    /// Apply the `[integrations.*]` sections of a configuration.
    ///
    /// Table overrides are layered over the existing integration's table.
    /// A name with no existing integration defines a new one with an empty
    /// base table.
    ///
    /// # Errors
    /// Returns `TableError::DuplicateCode` if a section lists the same code twice.
    pub fn apply_config(&mut self, config: &HookwiseConfig) -> Result<(), TableError> {
        for (name, settings) in &config.integrations {
            let base = self
                .remove(name)
                .unwrap_or_else(|| Integration::new(name.clone(), ClassificationTable::new()));

            let overrides = settings.overrides()?;
            let webhook = settings.webhook_settings(base.webhook());
            let mut integration = base.with_table_overrides(&overrides);
            if let Some(webhook) = webhook {
                integration = integration.with_webhook(webhook);
            }

            tracing::debug!(
                integration = %name,
                overrides = overrides.len(),
                "Applied integration configuration"
            );
            self.register(integration);
        }
        Ok(())
    }
}
