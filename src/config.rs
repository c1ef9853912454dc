//! Configuration management for Navstack

use crate::renderer::RendererConfig;
use crate::{Error, Result};
use serde::Deserialize;
use std::env;

/// Session configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application name, appended to the renderer's user agent
    pub application_name: String,

    /// User agent suffix identifying the navigation bridge
    pub user_agent_suffix: String,

    /// Name of the script message handler the content posts to
    pub bridge_handler_name: String,

    /// Capacity of the session event channel
    pub event_channel_capacity: usize,

    /// Hand link activations to the delegate as external locations
    pub open_external_links: bool,

    /// Log level
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            application_name: "navstack".to_string(),
            user_agent_suffix: "Navstack Native".to_string(),
            bridge_handler_name: "navstack".to_string(),
            event_channel_capacity: 256,
            open_external_links: true,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(name) = env::var("NAVSTACK_APPLICATION_NAME") {
            config.application_name = name;
        }

        if let Ok(suffix) = env::var("NAVSTACK_USER_AGENT_SUFFIX") {
            config.user_agent_suffix = suffix;
        }

        if let Ok(handler) = env::var("NAVSTACK_BRIDGE_HANDLER") {
            if handler.trim().is_empty() {
                return Err(Error::configuration("NAVSTACK_BRIDGE_HANDLER must not be empty"));
            }
            config.bridge_handler_name = handler;
        }

        if let Ok(capacity) = env::var("NAVSTACK_EVENT_CAPACITY") {
            config.event_channel_capacity = capacity
                .parse()
                .map_err(|_| Error::configuration("Invalid NAVSTACK_EVENT_CAPACITY"))?;
        }

        if let Ok(external) = env::var("NAVSTACK_OPEN_EXTERNAL_LINKS") {
            config.open_external_links = external
                .parse()
                .map_err(|_| Error::configuration("Invalid NAVSTACK_OPEN_EXTERNAL_LINKS"))?;
        }

        if let Ok(log_level) = env::var("NAVSTACK_LOG_LEVEL") {
            config.log_level = log_level;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| Error::configuration(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.event_channel_capacity == 0 {
            return Err(Error::configuration("event_channel_capacity must be positive"));
        }
        Ok(())
    }

    /// Renderer configuration derived from this config
    ///
    /// The session delegate gets a chance to amend it before the renderer is built.
    pub fn renderer_config(&self) -> RendererConfig {
        RendererConfig {
            user_agent_suffix: format!("{} ({})", self.user_agent_suffix, self.application_name),
            bridge_handler_name: self.bridge_handler_name.clone(),
            user_scripts: Vec::new(),
        }
    }
}
