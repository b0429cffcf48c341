//! Point-in-time telemetry snapshot.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// An immutable copy of [`MapMetrics`](super::MapMetrics).
#[derive(Clone, Debug, Default, Serialize)]
pub struct TelemetrySnapshot {
    /// How long the session has been running
    #[serde(serialize_with = "serialize_millis")]
    pub uptime: Duration,

    pub tiles_loaded: u64,
    pub tile_errors: u64,
    pub errors_suppressed: u64,
    pub stale_events: u64,
    pub load_timeouts: u64,

    pub provider_switches: u64,
    pub fallback_activations: u64,

    pub renders: u64,
    pub viewport_changes: u64,
    pub markers_attached: u64,
    pub markers_detached: u64,
    pub preloads: u64,
}

impl TelemetrySnapshot {
    /// Share of tile outcomes that were failures (0.0 - 1.0).
    pub fn tile_error_rate(&self) -> f64 {
        let total = self.tiles_loaded + self.tile_errors;
        if total == 0 {
            0.0
        } else {
            self.tile_errors as f64 / total as f64
        }
    }

    /// Renders avoided by debouncing, as a share of viewport changes.
    pub fn debounce_savings(&self) -> f64 {
        if self.viewport_changes == 0 {
            0.0
        } else {
            1.0 - (self.renders.min(self.viewport_changes) as f64 / self.viewport_changes as f64)
        }
    }
}

fn serialize_millis<S: serde::Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_millis() as u64)
}

impl fmt::Display for TelemetrySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Uptime:            {:.1}s", self.uptime.as_secs_f64())?;
        writeln!(
            f,
            "Tiles:             {} loaded, {} failed ({:.1}% errors)",
            self.tiles_loaded,
            self.tile_errors,
            self.tile_error_rate() * 100.0
        )?;
        writeln!(
            f,
            "Ignored events:    {} suppressed, {} stale",
            self.errors_suppressed, self.stale_events
        )?;
        writeln!(
            f,
            "Providers:         {} switches, {} timeouts, {} offline activations",
            self.provider_switches, self.load_timeouts, self.fallback_activations
        )?;
        write!(
            f,
            "Viewport:          {} changes, {} renders, +{}/-{} markers, {} preloads",
            self.viewport_changes,
            self.renders,
            self.markers_attached,
            self.markers_detached,
            self.preloads
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates() {
        let snapshot = TelemetrySnapshot {
            tiles_loaded: 3,
            tile_errors: 1,
            viewport_changes: 10,
            renders: 2,
            ..Default::default()
        };
        assert!((snapshot.tile_error_rate() - 0.25).abs() < f64::EPSILON);
        assert!((snapshot.debounce_savings() - 0.8).abs() < 1e-9);
        assert_eq!(TelemetrySnapshot::default().tile_error_rate(), 0.0);
    }

    #[test]
    fn test_serializes_uptime_as_millis() {
        let snapshot = TelemetrySnapshot {
            uptime: Duration::from_millis(1500),
            ..Default::default()
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["uptime"], 1500);
    }
}
