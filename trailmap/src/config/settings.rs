//! Settings structs loaded from the config file.

use std::path::PathBuf;

use crate::controller::ControllerConfig;
use crate::provider::{hong_kong_defaults, ProviderRegistry, RegistryError, TileProvider};
use crate::session::SessionConfig;
use crate::viewport::ViewportConfig;

use super::file::config_directory;

/// Default log file (~/.trailmap/trailmap.log).
pub fn default_log_file() -> PathBuf {
    config_directory().join("trailmap.log")
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub file: PathBuf,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: default_log_file(),
        }
    }
}

/// Everything in `config.ini`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub controller: ControllerConfig,
    pub viewport: ViewportConfig,
    pub logging: LoggingSettings,
    /// Tile providers in fallback order.
    pub providers: Vec<TileProvider>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            controller: ControllerConfig::default(),
            viewport: ViewportConfig::default(),
            logging: LoggingSettings::default(),
            providers: hong_kong_defaults(),
        }
    }
}

impl ConfigFile {
    /// Component settings for a new session.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            controller: self.controller.clone(),
            viewport: self.viewport.clone(),
        }
    }

    /// Validated provider chain.
    pub fn registry(&self) -> Result<ProviderRegistry, RegistryError> {
        ProviderRegistry::new(self.providers.clone())
    }

    /// Look up a provider by name.
    pub fn provider(&self, name: &str) -> Option<&TileProvider> {
        self.providers.iter().find(|p| p.name == name)
    }
}
