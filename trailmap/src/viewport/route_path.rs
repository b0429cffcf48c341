//! Route path polylines and their start/end markers.

use std::collections::BTreeSet;

use crate::coord::{GeoBounds, LatLon};
use crate::event::{RouteId, RouteSummary};

use super::ViewportConfig;

/// A trail drawn as a polyline, pinned at both ends.
///
/// Always holds at least two points.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePath {
    route_id: RouteId,
    points: Vec<LatLon>,
    bounds: GeoBounds,
}

impl RoutePath {
    /// Path for a route, or `None` when its trail has fewer than two points.
    pub fn from_route(route: &RouteSummary) -> Option<Self> {
        if route.path.len() < 2 {
            return None;
        }
        let bounds = GeoBounds::enclosing(&route.path)?;
        Some(Self {
            route_id: route.id.clone(),
            points: route.path.clone(),
            bounds,
        })
    }

    pub fn route_id(&self) -> &RouteId {
        &self.route_id
    }

    pub fn points(&self) -> &[LatLon] {
        &self.points
    }

    pub fn bounds(&self) -> GeoBounds {
        self.bounds
    }

    /// Where the start marker goes.
    pub fn start(&self) -> LatLon {
        self.points[0]
    }

    /// Where the end marker goes.
    pub fn end(&self) -> LatLon {
        self.points[self.points.len() - 1]
    }
}

/// Decide which route paths should be drawn.
///
/// A path is drawn when the zoom is at least `config.low_zoom` and its
/// bounding box overlaps the viewport. A path's start and end markers
/// follow the path.
pub fn cull_paths(
    paths: &[RoutePath],
    bounds: &GeoBounds,
    zoom: u8,
    config: &ViewportConfig,
) -> BTreeSet<RouteId> {
    if zoom < config.low_zoom {
        return BTreeSet::new();
    }
    paths
        .iter()
        .filter(|path| path.bounds.intersects(bounds))
        .map(|path| path.route_id.clone())
        .collect()
}
