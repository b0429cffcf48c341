//! Route marker records and visibility culling.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::coord::{GeoBounds, LatLon};
use crate::event::RouteId;

use super::ViewportConfig;

/// Which icon a marker is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IconDetailLevel {
    High,
    Low,
}

impl IconDetailLevel {
    /// Icon level for markers shown at `zoom`.
    pub fn for_zoom(zoom: u8, config: &ViewportConfig) -> Self {
        if zoom >= config.high_detail_zoom {
            IconDetailLevel::High
        } else {
            IconDetailLevel::Low
        }
    }
}

/// One route pinned on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerRecord {
    pub route_id: RouteId,
    pub position: LatLon,
    pub icon_detail_level: IconDetailLevel,
}

impl MarkerRecord {
    /// Create a marker with the low-detail icon.
    pub fn new(route_id: RouteId, position: LatLon) -> Self {
        Self {
            route_id,
            position,
            icon_detail_level: IconDetailLevel::Low,
        }
    }
}

/// Decide which markers should be visible, and with which icon.
///
/// Pure function of the viewport bounds, the zoom and the marker positions.
/// Below `config.low_zoom` nothing is visible.
pub fn cull(
    markers: &[MarkerRecord],
    bounds: &GeoBounds,
    zoom: u8,
    config: &ViewportConfig,
) -> BTreeMap<RouteId, IconDetailLevel> {
    if zoom < config.low_zoom {
        return BTreeMap::new();
    }

    let level = IconDetailLevel::for_zoom(zoom, config);
    markers
        .iter()
        .filter(|marker| bounds.contains(marker.position))
        .map(|marker| (marker.route_id.clone(), level))
        .collect()
}
