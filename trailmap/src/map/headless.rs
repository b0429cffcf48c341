//! In-memory map view.

use std::collections::{BTreeMap, BTreeSet};

use crate::coord::{viewport_bounds, GeoBounds, LatLon};
use crate::event::RouteId;
use crate::fallback::Landmark;
use crate::viewport::{IconDetailLevel, MarkerRecord, RoutePath};

use super::MapView;

/// Default viewport size, matching a typical desktop map pane.
pub const DEFAULT_VIEWPORT_PX: (u32, u32) = (1024, 768);

/// A map with no renderer behind it.
///
/// Bounds are derived from the centre, zoom and pixel size exactly as a
/// slippy map would compute them. Attached markers, route paths, endpoints and
/// landmarks are kept in memory. Marker attach/detach calls are counted so
/// callers can verify that no redundant work was requested.
#[derive(Debug, Clone)]
pub struct HeadlessMap {
    center: LatLon,
    zoom: u8,
    width_px: u32,
    height_px: u32,
    attached: BTreeMap<RouteId, IconDetailLevel>,
    paths: BTreeSet<RouteId>,
    endpoints: BTreeMap<RouteId, (LatLon, LatLon)>,
    landmarks: Vec<Landmark>,
    attach_calls: usize,
    detach_calls: usize,
}

impl HeadlessMap {
    pub fn new(center: LatLon, zoom: u8) -> Self {
        Self::with_size(center, zoom, DEFAULT_VIEWPORT_PX.0, DEFAULT_VIEWPORT_PX.1)
    }

    pub fn with_size(center: LatLon, zoom: u8, width_px: u32, height_px: u32) -> Self {
        Self {
            center,
            zoom,
            width_px,
            height_px,
            attached: BTreeMap::new(),
            paths: BTreeSet::new(),
            endpoints: BTreeMap::new(),
            landmarks: Vec::new(),
            attach_calls: 0,
            detach_calls: 0,
        }
    }

    /// Pan and zoom.
    pub fn set_view(&mut self, center: LatLon, zoom: u8) {
        self.center = center;
        self.zoom = zoom;
    }

    pub fn set_zoom(&mut self, zoom: u8) {
        self.zoom = zoom;
    }

    /// Route ids currently shown, in order.
    pub fn attached_ids(&self) -> Vec<RouteId> {
        self.attached.keys().cloned().collect()
    }

    pub fn is_attached(&self, route_id: &RouteId) -> bool {
        self.attached.contains_key(route_id)
    }

    /// Icon level of an attached marker.
    pub fn icon_of(&self, route_id: &RouteId) -> Option<IconDetailLevel> {
        self.attached.get(route_id).copied()
    }

    /// Route ids whose path polyline is drawn, in order.
    pub fn path_ids(&self) -> Vec<RouteId> {
        self.paths.iter().cloned().collect()
    }

    /// Start and end marker positions of a route.
    pub fn endpoints_of(&self, route_id: &RouteId) -> Option<(LatLon, LatLon)> {
        self.endpoints.get(route_id).copied()
    }

    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    pub fn attach_calls(&self) -> usize {
        self.attach_calls
    }

    pub fn detach_calls(&self) -> usize {
        self.detach_calls
    }
}

impl MapView for HeadlessMap {
    fn bounds(&self) -> GeoBounds {
        viewport_bounds(self.center, self.zoom, self.width_px, self.height_px)
    }

    fn zoom(&self) -> u8 {
        self.zoom
    }

    fn center(&self) -> LatLon {
        self.center
    }

    fn attach(&mut self, marker: &MarkerRecord) {
        self.attach_calls += 1;
        self.attached
            .insert(marker.route_id.clone(), marker.icon_detail_level);
    }

    fn detach(&mut self, route_id: &RouteId) {
        self.detach_calls += 1;
        self.attached.remove(route_id);
    }

    fn set_icon(&mut self, route_id: &RouteId, level: IconDetailLevel) {
        if let Some(current) = self.attached.get_mut(route_id) {
            *current = level;
        }
    }

    fn attach_path(&mut self, path: &RoutePath) {
        self.paths.insert(path.route_id().clone());
    }

    fn detach_path(&mut self, route_id: &RouteId) {
        self.paths.remove(route_id);
    }

    fn attach_endpoints(&mut self, path: &RoutePath) {
        self.endpoints
            .insert(path.route_id().clone(), (path.start(), path.end()));
    }

    fn detach_endpoints(&mut self, route_id: &RouteId) {
        self.endpoints.remove(route_id);
    }

    fn attach_landmark(&mut self, landmark: &Landmark) {
        self.landmarks.push(landmark.clone());
    }
}
