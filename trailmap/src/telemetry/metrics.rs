//! Lock-free atomic counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use super::TelemetrySnapshot;

/// Counters for one map session.
///
/// All operations use `Relaxed` ordering; the counters are independent
/// measurements and are only read together through [`MapMetrics::snapshot`].
#[derive(Debug)]
pub struct MapMetrics {
    start_time: Instant,

    // === Tile metrics ===
    /// Tiles delivered by the active provider
    tiles_loaded: AtomicU64,
    /// Tile failures reported by the active provider
    tile_errors: AtomicU64,
    /// Failures not counted because the URL was already counted
    errors_suppressed: AtomicU64,
    /// Events dropped because they belonged to an abandoned provider
    stale_events: AtomicU64,
    /// Load watchdog expiries
    load_timeouts: AtomicU64,

    // === Provider metrics ===
    /// Providers activated after the first one
    provider_switches: AtomicU64,
    /// Times offline mode was entered
    fallback_activations: AtomicU64,

    // === Viewport metrics ===
    /// Debounced renders performed
    renders: AtomicU64,
    /// Viewport changes received
    viewport_changes: AtomicU64,
    /// Markers attached to the map
    markers_attached: AtomicU64,
    /// Markers detached from the map
    markers_detached: AtomicU64,
    /// Preload requests forwarded to the tile layer
    preloads: AtomicU64,
}

impl Default for MapMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MapMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            tiles_loaded: AtomicU64::new(0),
            tile_errors: AtomicU64::new(0),
            errors_suppressed: AtomicU64::new(0),
            stale_events: AtomicU64::new(0),
            load_timeouts: AtomicU64::new(0),
            provider_switches: AtomicU64::new(0),
            fallback_activations: AtomicU64::new(0),
            renders: AtomicU64::new(0),
            viewport_changes: AtomicU64::new(0),
            markers_attached: AtomicU64::new(0),
            markers_detached: AtomicU64::new(0),
            preloads: AtomicU64::new(0),
        }
    }

    // === Tile tracking ===

    pub fn tile_loaded(&self) {
        self.tiles_loaded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn tile_failed(&self) {
        self.tile_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn error_suppressed(&self) {
        self.errors_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stale_event(&self) {
        self.stale_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn load_timeout(&self) {
        self.load_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    // === Provider tracking ===

    pub fn provider_switched(&self) {
        self.provider_switches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fallback_activated(&self) {
        self.fallback_activations.fetch_add(1, Ordering::Relaxed);
    }

    // === Viewport tracking ===

    pub fn viewport_changed(&self) {
        self.viewport_changes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a render and the marker churn it caused.
    pub fn rendered(&self, attached: usize, detached: usize) {
        self.renders.fetch_add(1, Ordering::Relaxed);
        self.markers_attached
            .fetch_add(attached as u64, Ordering::Relaxed);
        self.markers_detached
            .fetch_add(detached as u64, Ordering::Relaxed);
    }

    pub fn preloaded(&self) {
        self.preloads.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy every counter into an immutable snapshot.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            uptime: self.start_time.elapsed(),
            tiles_loaded: self.tiles_loaded.load(Ordering::Relaxed),
            tile_errors: self.tile_errors.load(Ordering::Relaxed),
            errors_suppressed: self.errors_suppressed.load(Ordering::Relaxed),
            stale_events: self.stale_events.load(Ordering::Relaxed),
            load_timeouts: self.load_timeouts.load(Ordering::Relaxed),
            provider_switches: self.provider_switches.load(Ordering::Relaxed),
            fallback_activations: self.fallback_activations.load(Ordering::Relaxed),
            renders: self.renders.load(Ordering::Relaxed),
            viewport_changes: self.viewport_changes.load(Ordering::Relaxed),
            markers_attached: self.markers_attached.load(Ordering::Relaxed),
            markers_detached: self.markers_detached.load(Ordering::Relaxed),
            preloads: self.preloads.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_accumulates_marker_churn() {
        let metrics = MapMetrics::new();
        metrics.rendered(3, 0);
        metrics.rendered(1, 2);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.renders, 2);
        assert_eq!(snapshot.markers_attached, 4);
        assert_eq!(snapshot.markers_detached, 2);
    }

    #[test]
    fn test_counters_start_at_zero() {
        let snapshot = MapMetrics::default().snapshot();
        assert_eq!(snapshot.tiles_loaded, 0);
        assert_eq!(snapshot.provider_switches, 0);
        assert_eq!(snapshot.fallback_activations, 0);
    }
}
