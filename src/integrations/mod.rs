//! Integrations module
//!
//! Each third-party service is described by data: a classification table and
//! its webhook settings. The built-in integrations live in their own modules;
//! others can be defined entirely from configuration.

pub mod descriptor;
pub mod github;
pub mod linear;
pub mod registry;
pub mod slack;
pub mod stripe;
pub mod webhooks;

pub use descriptor::{Integration, WebhookSettings};
pub use registry::IntegrationRegistry;
