//! Map telemetry for observability and the CLI.
//!
//! Counters are lock-free atomics updated by the session as events are
//! handled, and copied out into an immutable snapshot for display.
//!
//! # Architecture
//!
//! ```text
//! MapSession ─────► MapMetrics ─────► TelemetrySnapshot ─────► Views
//!                  (atomic counters)  (point-in-time copy)     (CLI, logs)
//! ```
//!
//! # Example
//!
//! ```
//! use trailmap::telemetry::MapMetrics;
//!
//! let metrics = MapMetrics::new();
//! metrics.tile_loaded();
//! metrics.tile_failed();
//! metrics.tile_failed();
//!
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.tiles_loaded, 1);
//! assert_eq!(snapshot.tile_errors, 2);
//! ```

mod metrics;
mod snapshot;

pub use metrics::MapMetrics;
pub use snapshot::TelemetrySnapshot;
