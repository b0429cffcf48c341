//! Controller timing configuration.

use std::time::Duration;

use thiserror::Error;

/// Default delay before abandoning the primary provider.
pub const DEFAULT_PRIMARY_SWITCH_DELAY: Duration = Duration::from_millis(1500);

/// Default delay before abandoning a backup provider.
pub const DEFAULT_BACKUP_SWITCH_DELAY: Duration = Duration::from_millis(500);

/// Default window during which a failing URL is counted only once.
pub const DEFAULT_ERROR_SUPPRESSION: Duration = Duration::from_secs(10);

/// Invalid controller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerConfigError {
    #[error(
        "primary switch delay ({primary:?}) must be longer than backup switch delay ({backup:?})"
    )]
    SwitchDelayOrder { primary: Duration, backup: Duration },
}

/// Timing knobs for [`TileProviderController`](super::TileProviderController).
///
/// Leaving the primary provider waits longer than leaving a backup, giving
/// the preferred source more chance to recover from a transient blip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Delay before switching away from a `Primary` provider.
    pub primary_switch_delay: Duration,

    /// Delay before switching away from any other provider.
    pub backup_switch_delay: Duration,

    /// How long a failed URL is ignored after it was first counted.
    pub error_suppression: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            primary_switch_delay: DEFAULT_PRIMARY_SWITCH_DELAY,
            backup_switch_delay: DEFAULT_BACKUP_SWITCH_DELAY,
            error_suppression: DEFAULT_ERROR_SUPPRESSION,
        }
    }
}

impl ControllerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_switch_delays(mut self, primary: Duration, backup: Duration) -> Self {
        self.primary_switch_delay = primary;
        self.backup_switch_delay = backup;
        self
    }

    pub fn with_error_suppression(mut self, window: Duration) -> Self {
        self.error_suppression = window;
        self
    }

    /// Switch immediately on every failure, with no URL suppression.
    ///
    /// Useful for tests that only care about the state sequence.
    pub fn immediate() -> Self {
        Self {
            primary_switch_delay: Duration::ZERO,
            backup_switch_delay: Duration::ZERO,
            error_suppression: Duration::ZERO,
        }
    }

    /// Check the delay ordering.
    ///
    /// Two zero delays are accepted; otherwise the primary delay must be
    /// strictly longer.
    pub fn validate(&self) -> Result<(), ControllerConfigError> {
        let both_zero =
            self.primary_switch_delay.is_zero() && self.backup_switch_delay.is_zero();
        if !both_zero && self.primary_switch_delay <= self.backup_switch_delay {
            return Err(ControllerConfigError::SwitchDelayOrder {
                primary: self.primary_switch_delay,
                backup: self.backup_switch_delay,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(ControllerConfig::default().validate().is_ok());
        assert!(ControllerConfig::immediate().validate().is_ok());
    }

    #[test]
    fn test_backup_delay_must_be_shorter() {
        let config = ControllerConfig::new()
            .with_switch_delays(Duration::from_millis(500), Duration::from_millis(2000));
        assert!(matches!(
            config.validate(),
            Err(ControllerConfigError::SwitchDelayOrder { .. })
        ));
    }
}
