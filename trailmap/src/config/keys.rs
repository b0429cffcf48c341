//! Configuration key access and validation.
//!
//! Typed get/set of the scalar settings by their `section.key` name, as used
//! by `trailmap config get|set`. Provider sections are edited in the file
//! directly.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use super::parser::expand_tilde;
use super::settings::ConfigFile;
use crate::coord::MAX_ZOOM;

/// Errors that can occur when getting or setting configuration values.
#[derive(Debug, Error)]
pub enum ConfigKeyError {
    /// Unknown configuration key.
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    /// Validation failed for the value.
    #[error("Invalid value for {key}: {reason}")]
    ValidationFailed { key: String, reason: String },
}

/// Supported configuration keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    // Controller settings
    ControllerPrimarySwitchDelayMs,
    ControllerBackupSwitchDelayMs,
    ControllerErrorSuppressionSecs,

    // Viewport settings
    ViewportDebounceMs,
    ViewportPreloadDebounceMs,
    ViewportLowZoom,
    ViewportHighDetailZoom,
    ViewportPreloadMarginDeg,
    ViewportShowRoutes,

    // Logging settings
    LoggingFile,
}

const ALL_KEYS: [ConfigKey; 10] = [
    ConfigKey::ControllerPrimarySwitchDelayMs,
    ConfigKey::ControllerBackupSwitchDelayMs,
    ConfigKey::ControllerErrorSuppressionSecs,
    ConfigKey::ViewportDebounceMs,
    ConfigKey::ViewportPreloadDebounceMs,
    ConfigKey::ViewportLowZoom,
    ConfigKey::ViewportHighDetailZoom,
    ConfigKey::ViewportPreloadMarginDeg,
    ConfigKey::ViewportShowRoutes,
    ConfigKey::LoggingFile,
];

impl FromStr for ConfigKey {
    type Err = ConfigKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ALL_KEYS
            .iter()
            .copied()
            .find(|key| key.name() == wanted)
            .ok_or_else(|| ConfigKeyError::UnknownKey(s.to_string()))
    }
}

impl ConfigKey {
    /// Get the canonical key name (e.g., "viewport.low_zoom").
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::ControllerPrimarySwitchDelayMs => "controller.primary_switch_delay_ms",
            ConfigKey::ControllerBackupSwitchDelayMs => "controller.backup_switch_delay_ms",
            ConfigKey::ControllerErrorSuppressionSecs => "controller.error_suppression_secs",
            ConfigKey::ViewportDebounceMs => "viewport.debounce_ms",
            ConfigKey::ViewportPreloadDebounceMs => "viewport.preload_debounce_ms",
            ConfigKey::ViewportLowZoom => "viewport.low_zoom",
            ConfigKey::ViewportHighDetailZoom => "viewport.high_detail_zoom",
            ConfigKey::ViewportPreloadMarginDeg => "viewport.preload_margin_deg",
            ConfigKey::ViewportShowRoutes => "viewport.show_routes",
            ConfigKey::LoggingFile => "logging.file",
        }
    }

    /// Get the section name (e.g., "viewport").
    pub fn section(&self) -> &'static str {
        self.name().split('.').next().unwrap_or("")
    }

    /// Get the key name within the section (e.g., "low_zoom").
    pub fn key_name(&self) -> &'static str {
        self.name().split('.').nth(1).unwrap_or(self.name())
    }

    /// All supported keys, in file order.
    pub fn all() -> &'static [ConfigKey] {
        &ALL_KEYS
    }

    /// Get the value from a config file as a string.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::ControllerPrimarySwitchDelayMs => {
                config.controller.primary_switch_delay.as_millis().to_string()
            }
            ConfigKey::ControllerBackupSwitchDelayMs => {
                config.controller.backup_switch_delay.as_millis().to_string()
            }
            ConfigKey::ControllerErrorSuppressionSecs => {
                config.controller.error_suppression.as_secs().to_string()
            }
            ConfigKey::ViewportDebounceMs => config.viewport.debounce.as_millis().to_string(),
            ConfigKey::ViewportPreloadDebounceMs => {
                config.viewport.preload_debounce.as_millis().to_string()
            }
            ConfigKey::ViewportLowZoom => config.viewport.low_zoom.to_string(),
            ConfigKey::ViewportHighDetailZoom => config.viewport.high_detail_zoom.to_string(),
            ConfigKey::ViewportPreloadMarginDeg => config.viewport.preload_margin.to_string(),
            ConfigKey::ViewportShowRoutes => config.viewport.show_routes.to_string(),
            ConfigKey::LoggingFile => config.logging.file.to_string_lossy().into_owned(),
        }
    }

    /// Set the value in a config file.
    ///
    /// The value is parsed and checked against the rest of the config; on
    /// error the config is left unchanged.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigKeyError> {
        let mut updated = config.clone();
        match self {
            ConfigKey::ControllerPrimarySwitchDelayMs => {
                updated.controller.primary_switch_delay = self.millis(value)?;
            }
            ConfigKey::ControllerBackupSwitchDelayMs => {
                updated.controller.backup_switch_delay = self.millis(value)?;
            }
            ConfigKey::ControllerErrorSuppressionSecs => {
                updated.controller.error_suppression =
                    Duration::from_secs(self.number(value, "must be a whole number of seconds")?);
            }
            ConfigKey::ViewportDebounceMs => updated.viewport.debounce = self.millis(value)?,
            ConfigKey::ViewportPreloadDebounceMs => {
                updated.viewport.preload_debounce = self.millis(value)?;
            }
            ConfigKey::ViewportLowZoom => updated.viewport.low_zoom = self.zoom(value)?,
            ConfigKey::ViewportHighDetailZoom => {
                updated.viewport.high_detail_zoom = self.zoom(value)?;
            }
            ConfigKey::ViewportPreloadMarginDeg => {
                let margin: f64 = self.number(value, "must be a number of degrees")?;
                if !(0.0..=1.0).contains(&margin) {
                    return Err(self.invalid("must be between 0 and 1 degree"));
                }
                updated.viewport.preload_margin = margin;
            }
            ConfigKey::ViewportShowRoutes => {
                updated.viewport.show_routes = self.number(value, "must be true or false")?;
            }
            ConfigKey::LoggingFile => {
                let value = value.trim();
                if value.is_empty() {
                    return Err(self.invalid("path cannot be empty"));
                }
                updated.logging.file = expand_tilde(value);
            }
        }

        updated
            .controller
            .validate()
            .map_err(|e| self.invalid(&e.to_string()))?;
        if updated.viewport.high_detail_zoom < updated.viewport.low_zoom {
            return Err(self.invalid("high_detail_zoom must not be below low_zoom"));
        }

        *config = updated;
        Ok(())
    }

    fn number<T: FromStr>(&self, value: &str, reason: &str) -> Result<T, ConfigKeyError> {
        value.trim().parse().map_err(|_| self.invalid(reason))
    }

    fn millis(&self, value: &str) -> Result<Duration, ConfigKeyError> {
        self.number(value, "must be a whole number of milliseconds")
            .map(Duration::from_millis)
    }

    fn zoom(&self, value: &str) -> Result<u8, ConfigKeyError> {
        let reason = format!("must be a zoom level between 0 and {MAX_ZOOM}");
        match self.number::<u8>(value, &reason)? {
            zoom if zoom <= MAX_ZOOM => Ok(zoom),
            _ => Err(self.invalid(&reason)),
        }
    }

    fn invalid(&self, reason: &str) -> ConfigKeyError {
        ConfigKeyError::ValidationFailed {
            key: self.name().to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_key_parsing() {
        assert_eq!(
            "viewport.low_zoom".parse::<ConfigKey>().unwrap(),
            ConfigKey::ViewportLowZoom
        );
        assert_eq!(
            "CONTROLLER.Backup_Switch_Delay_Ms".parse::<ConfigKey>().unwrap(),
            ConfigKey::ControllerBackupSwitchDelayMs
        );
        assert!(matches!(
            "viewport.nonsense".parse::<ConfigKey>(),
            Err(ConfigKeyError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_key_name_parts() {
        let key = ConfigKey::ViewportPreloadMarginDeg;
        assert_eq!(key.section(), "viewport");
        assert_eq!(key.key_name(), "preload_margin_deg");
    }

    #[test]
    fn test_get_and_set() {
        let mut config = ConfigFile::default();
        assert_eq!(ConfigKey::ViewportDebounceMs.get(&config), "50");

        ConfigKey::ViewportDebounceMs.set(&mut config, "80").unwrap();
        assert_eq!(config.viewport.debounce, Duration::from_millis(80));
        assert_eq!(ConfigKey::ViewportDebounceMs.get(&config), "80");
    }

    #[test]
    fn test_set_rejects_inverted_switch_delays() {
        let mut config = ConfigFile::default();
        let err = ConfigKey::ControllerBackupSwitchDelayMs
            .set(&mut config, "5000")
            .unwrap_err();

        assert!(matches!(err, ConfigKeyError::ValidationFailed { .. }));
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_set_rejects_bad_zoom() {
        let mut config = ConfigFile::default();
        assert!(ConfigKey::ViewportLowZoom.set(&mut config, "23").is_err());
        assert!(ConfigKey::ViewportLowZoom.set(&mut config, "-1").is_err());
        assert!(ConfigKey::ViewportLowZoom.set(&mut config, "16").is_err());
        assert!(ConfigKey::ViewportLowZoom.set(&mut config, "10").is_ok());
    }

    #[test]
    fn test_set_show_routes() {
        let mut config = ConfigFile::default();
        assert_eq!(ConfigKey::ViewportShowRoutes.get(&config), "true");

        ConfigKey::ViewportShowRoutes.set(&mut config, "false").unwrap();
        assert!(!config.viewport.show_routes);
        assert!(ConfigKey::ViewportShowRoutes.set(&mut config, "yes").is_err());
    }

    #[test]
    fn test_all_keys_round_trip_names() {
        for key in ConfigKey::all() {
            assert_eq!(key.name().parse::<ConfigKey>().unwrap(), *key);
        }
    }
}
