//! Debounced viewport rendering and marker culling.
//!
//! Panning and zooming emit a stream of viewport changes. Rendering markers
//! on every one of them is wasteful, so the [`ViewportRenderScheduler`]
//! waits for the stream to go quiet and then renders once against the
//! final viewport:
//!
//! ```text
//! change ──┬── change ──┬── change ──[debounce]──► render
//!          └ cancelled  └ cancelled
//! ```
//!
//! A second, longer quiet period triggers preloading of the tiles around
//! the viewport.
//!
//! Routes with a trail also get a path polyline and start/end markers,
//! culled alongside the route markers and switchable as a group.

mod config;
mod marker;
mod route_path;
mod scheduler;

pub use config::{
    ViewportConfig, DEFAULT_DEBOUNCE, DEFAULT_HIGH_DETAIL_ZOOM, DEFAULT_LOW_ZOOM,
    DEFAULT_PRELOAD_DEBOUNCE, DEFAULT_PRELOAD_MARGIN,
};
pub use marker::{cull, IconDetailLevel, MarkerRecord};
pub use route_path::{cull_paths, RoutePath};
pub use scheduler::{RenderSummary, ViewportOutcome, ViewportRenderScheduler};
