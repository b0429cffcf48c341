//! Viewport scheduling configuration.

use std::time::Duration;

/// Default quiet period before a viewport change is rendered.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(50);

/// Default quiet period before nearby tiles are preloaded.
pub const DEFAULT_PRELOAD_DEBOUNCE: Duration = Duration::from_millis(200);

/// Below this zoom no route markers are shown.
pub const DEFAULT_LOW_ZOOM: u8 = 12;

/// At or above this zoom markers use the detailed icon.
pub const DEFAULT_HIGH_DETAIL_ZOOM: u8 = 15;

/// Degrees added around the viewport when preloading.
pub const DEFAULT_PRELOAD_MARGIN: f64 = 0.01;

/// Configuration for [`ViewportRenderScheduler`](super::ViewportRenderScheduler).
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportConfig {
    /// Quiet period after the last viewport change before rendering.
    pub debounce: Duration,

    /// Quiet period after the last viewport change before preloading
    /// neighbouring tiles.
    pub preload_debounce: Duration,

    /// Zoom below which every marker is hidden.
    pub low_zoom: u8,

    /// Zoom at or above which markers get the high-detail icon.
    pub high_detail_zoom: u8,

    /// Margin in degrees added to the viewport bounds for preloading.
    pub preload_margin: f64,

    /// Whether route paths and their start/end markers are drawn.
    pub show_routes: bool,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            preload_debounce: DEFAULT_PRELOAD_DEBOUNCE,
            low_zoom: DEFAULT_LOW_ZOOM,
            high_detail_zoom: DEFAULT_HIGH_DETAIL_ZOOM,
            preload_margin: DEFAULT_PRELOAD_MARGIN,
            show_routes: true,
        }
    }
}

impl ViewportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_preload_debounce(mut self, preload_debounce: Duration) -> Self {
        self.preload_debounce = preload_debounce;
        self
    }

    /// Set both zoom thresholds.
    pub fn with_zoom_thresholds(mut self, low_zoom: u8, high_detail_zoom: u8) -> Self {
        self.low_zoom = low_zoom;
        self.high_detail_zoom = high_detail_zoom;
        self
    }

    pub fn with_preload_margin(mut self, margin: f64) -> Self {
        self.preload_margin = margin;
        self
    }

    pub fn with_show_routes(mut self, show_routes: bool) -> Self {
        self.show_routes = show_routes;
        self
    }
}
