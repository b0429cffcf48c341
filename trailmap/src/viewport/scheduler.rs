//! The viewport render scheduler state machine.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::coord::GeoBounds;
use crate::event::{RouteId, RouteSummary, Wakeup};
use crate::map::MapView;
use crate::timer::{Timer, TimerId};

use super::{cull, cull_paths, IconDetailLevel, MarkerRecord, RoutePath, ViewportConfig};

/// What a render changed on the map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub attached: usize,
    pub detached: usize,
    pub icons_changed: usize,
    /// Route paths drawn, each with its start/end markers.
    pub paths_drawn: usize,
    pub paths_removed: usize,
}

impl RenderSummary {
    pub fn is_noop(&self) -> bool {
        self.attached == 0
            && self.detached == 0
            && self.icons_changed == 0
            && self.paths_drawn == 0
            && self.paths_removed == 0
    }
}

/// Result of handing a wakeup to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportOutcome {
    /// The debounced render ran.
    Rendered(RenderSummary),
    /// Tiles inside these bounds should be preloaded.
    Preload(GeoBounds),
    /// The wakeup was superseded by a later viewport change.
    Superseded,
}

/// Debounces viewport changes and keeps the attached markers in sync with
/// the visible area.
///
/// The scheduler tracks which markers and route paths it attached, so it only
/// asks the map to attach, detach or swap icons when something actually
/// changes.
pub struct ViewportRenderScheduler {
    config: ViewportConfig,
    timer: Arc<dyn Timer>,

    /// Markers built from the latest route list, in input order.
    markers: Vec<MarkerRecord>,

    /// Markers currently attached to the map, with their icon level.
    attached: BTreeMap<RouteId, IconDetailLevel>,

    /// Paths built from the latest route list, in input order.
    paths: Vec<RoutePath>,

    /// Routes whose path and start/end markers are on the map.
    drawn_paths: BTreeSet<RouteId>,

    show_routes: bool,

    /// Sequence number of the latest viewport change.
    seq: u64,

    settle_timer: Option<TimerId>,
    preload_timer: Option<TimerId>,

    /// Bounds the most recent render acted on.
    bounds_active: Option<GeoBounds>,
}

impl ViewportRenderScheduler {
    pub fn new(config: ViewportConfig, timer: Arc<dyn Timer>) -> Self {
        Self {
            show_routes: config.show_routes,
            config,
            timer,
            markers: Vec::new(),
            attached: BTreeMap::new(),
            paths: Vec::new(),
            drawn_paths: BTreeSet::new(),
            seq: 0,
            settle_timer: None,
            preload_timer: None,
            bounds_active: None,
        }
    }

    /// Record a viewport change.
    ///
    /// Cancels any pending render and preload and schedules new ones, so only
    /// the last change in a burst is acted on.
    pub fn on_viewport_change(&mut self) {
        self.seq += 1;

        if let Some(id) = self.settle_timer.take() {
            self.timer.cancel(id);
        }
        if let Some(id) = self.preload_timer.take() {
            self.timer.cancel(id);
        }

        self.settle_timer = Some(
            self.timer
                .after(self.config.debounce, Wakeup::ViewportSettled { seq: self.seq }),
        );
        self.preload_timer = Some(self.timer.after(
            self.config.preload_debounce,
            Wakeup::Preload { seq: self.seq },
        ));
        trace!(seq = self.seq, "Viewport change debounced");
    }

    /// Handle a viewport wakeup.
    ///
    /// Wakeups from a superseded change are ignored. Non-viewport wakeups are
    /// reported as superseded too; the session never routes them here.
    pub fn handle_wakeup(&mut self, wakeup: Wakeup, view: &mut dyn MapView) -> ViewportOutcome {
        match wakeup {
            Wakeup::ViewportSettled { seq } if seq == self.seq && self.settle_timer.is_some() => {
                self.settle_timer = None;
                ViewportOutcome::Rendered(self.render(view))
            }
            Wakeup::Preload { seq } if seq == self.seq && self.preload_timer.is_some() => {
                self.preload_timer = None;
                ViewportOutcome::Preload(view.bounds().expanded(self.config.preload_margin))
            }
            _ => {
                debug!(?wakeup, current_seq = self.seq, "Ignoring superseded viewport wakeup");
                ViewportOutcome::Superseded
            }
        }
    }

    /// Bring the attached markers and route paths in line with the current
    /// viewport.
    pub fn render(&mut self, view: &mut dyn MapView) -> RenderSummary {
        let bounds = view.bounds();
        let zoom = view.zoom();
        let visible = cull(&self.markers, &bounds, zoom, &self.config);

        let mut summary = RenderSummary::default();

        let hidden: Vec<RouteId> = self
            .attached
            .keys()
            .filter(|id| !visible.contains_key(*id))
            .cloned()
            .collect();
        for id in hidden {
            view.detach(&id);
            self.attached.remove(&id);
            summary.detached += 1;
        }

        for marker in &mut self.markers {
            let Some(&level) = visible.get(&marker.route_id) else {
                continue;
            };
            marker.icon_detail_level = level;
            match self.attached.get(&marker.route_id).copied() {
                None => {
                    view.attach(marker);
                    self.attached.insert(marker.route_id.clone(), level);
                    summary.attached += 1;
                }
                Some(current) if current != level => {
                    view.set_icon(&marker.route_id, level);
                    self.attached.insert(marker.route_id.clone(), level);
                    summary.icons_changed += 1;
                }
                Some(_) => {}
            }
        }

        self.sync_paths(view, &bounds, zoom, &mut summary);

        self.bounds_active = Some(bounds);
        debug!(
            zoom,
            visible = self.attached.len(),
            attached = summary.attached,
            detached = summary.detached,
            icons_changed = summary.icons_changed,
            paths_drawn = summary.paths_drawn,
            paths_removed = summary.paths_removed,
            "Viewport rendered"
        );
        summary
    }

    fn sync_paths(
        &mut self,
        view: &mut dyn MapView,
        bounds: &GeoBounds,
        zoom: u8,
        summary: &mut RenderSummary,
    ) {
        let visible = if self.show_routes {
            cull_paths(&self.paths, bounds, zoom, &self.config)
        } else {
            BTreeSet::new()
        };

        let hidden: Vec<RouteId> = self.drawn_paths.difference(&visible).cloned().collect();
        for id in hidden {
            view.detach_path(&id);
            view.detach_endpoints(&id);
            self.drawn_paths.remove(&id);
            summary.paths_removed += 1;
        }

        for path in &self.paths {
            if visible.contains(path.route_id()) && self.drawn_paths.insert(path.route_id().clone()) {
                view.attach_path(path);
                view.attach_endpoints(path);
                summary.paths_drawn += 1;
            }
        }
    }

    /// Replace every marker and route path with one per route, then cull
    /// against the current viewport.
    ///
    /// Everything previously attached is removed first: markers, then path
    /// polylines, then start/end markers. Repeated route ids are collapsed;
    /// the first occurrence wins.
    pub fn rebuild_markers(&mut self, routes: &[RouteSummary], view: &mut dyn MapView) -> RenderSummary {
        let removed = std::mem::take(&mut self.attached);
        for id in removed.keys() {
            view.detach(id);
        }
        let removed_paths = std::mem::take(&mut self.drawn_paths);
        for id in &removed_paths {
            view.detach_path(id);
        }
        for id in &removed_paths {
            view.detach_endpoints(id);
        }

        let mut seen = HashSet::with_capacity(routes.len());
        let unique: Vec<&RouteSummary> = routes
            .iter()
            .filter(|route| {
                let first = seen.insert(route.id.clone());
                if !first {
                    warn!(route = %route.id, "Duplicate route id, keeping first occurrence");
                }
                first
            })
            .collect();

        self.markers = unique
            .iter()
            .map(|route| MarkerRecord::new(route.id.clone(), route.position))
            .collect();
        self.paths = unique
            .iter()
            .filter_map(|route| RoutePath::from_route(route))
            .collect();

        let mut summary = self.render(view);
        summary.detached += removed.len();
        summary.paths_removed += removed_paths.len();
        summary
    }

    /// Turn route paths and their start/end markers on or off.
    pub fn set_show_routes(&mut self, show: bool, view: &mut dyn MapView) -> RenderSummary {
        if self.show_routes == show {
            return RenderSummary::default();
        }
        self.show_routes = show;
        debug!(show, "Route paths toggled");
        self.render(view)
    }

    /// True while a debounced render is pending.
    pub fn is_rendering(&self) -> bool {
        self.settle_timer.is_some()
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn attached_count(&self) -> usize {
        self.attached.len()
    }

    pub fn markers(&self) -> &[MarkerRecord] {
        &self.markers
    }

    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    pub fn drawn_path_count(&self) -> usize {
        self.drawn_paths.len()
    }

    pub fn show_routes(&self) -> bool {
        self.show_routes
    }

    /// Ids of the markers currently attached, in order.
    pub fn attached_ids(&self) -> impl Iterator<Item = &RouteId> {
        self.attached.keys()
    }

    pub fn bounds_active(&self) -> Option<GeoBounds> {
        self.bounds_active
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::LatLon;
    use crate::map::HeadlessMap;
    use crate::timer::ManualTimer;
    use std::time::Duration;

    const PEAK: LatLon = LatLon::new(22.2711, 114.1492);
    const AIRPORT: LatLon = LatLon::new(22.3080, 113.9150);

    fn setup() -> (ManualTimer, ViewportRenderScheduler, HeadlessMap) {
        let timer = ManualTimer::new();
        let scheduler = ViewportRenderScheduler::new(ViewportConfig::default(), Arc::new(timer.clone()));
        let map = HeadlessMap::new(PEAK, 14);
        (timer, scheduler, map)
    }

    fn routes() -> Vec<RouteSummary> {
        vec![
            RouteSummary::new("peak-circle", PEAK),
            RouteSummary::new("lantau-trail", AIRPORT),
        ]
    }

    #[test]
    fn test_rebuild_attaches_only_visible() {
        let (_timer, mut scheduler, mut map) = setup();

        let summary = scheduler.rebuild_markers(&routes(), &mut map);

        assert_eq!(summary.attached, 1);
        assert_eq!(scheduler.marker_count(), 2);
        assert_eq!(map.attached_ids(), vec![RouteId::from("peak-circle")]);
        assert_eq!(map.icon_of(&"peak-circle".into()), Some(IconDetailLevel::Low));
    }

    #[test]
    fn test_rebuild_collapses_duplicates() {
        let (_timer, mut scheduler, mut map) = setup();
        let mut input = routes();
        input.push(RouteSummary::new("peak-circle", AIRPORT));

        scheduler.rebuild_markers(&input, &mut map);

        assert_eq!(scheduler.marker_count(), 2);
        assert_eq!(scheduler.markers()[0].position, PEAK);
    }

    #[test]
    fn test_rebuild_detaches_previous_markers() {
        let (_timer, mut scheduler, mut map) = setup();
        scheduler.rebuild_markers(&routes(), &mut map);

        let summary = scheduler.rebuild_markers(&[], &mut map);

        assert_eq!(summary.detached, 1);
        assert!(map.attached_ids().is_empty());
        assert_eq!(scheduler.attached_count(), 0);
    }

    #[test]
    fn test_debounce_renders_once_after_quiet_period() {
        let (timer, mut scheduler, mut map) = setup();
        scheduler.rebuild_markers(&routes(), &mut map);
        map.set_zoom(16);

        let mut outcomes = Vec::new();
        for _ in 0..5 {
            scheduler.on_viewport_change();
            timer.run_for(Duration::from_millis(20), |w| {
                outcomes.push(scheduler.handle_wakeup(w, &mut map))
            });
        }
        assert!(outcomes.is_empty());
        assert!(scheduler.is_rendering());

        timer.run_for(Duration::from_millis(50), |w| {
            outcomes.push(scheduler.handle_wakeup(w, &mut map))
        });

        assert_eq!(outcomes.len(), 1);
        assert!(matches!(
            outcomes[0],
            ViewportOutcome::Rendered(RenderSummary { icons_changed: 1, .. })
        ));
        assert!(!scheduler.is_rendering());
        assert_eq!(map.icon_of(&"peak-circle".into()), Some(IconDetailLevel::High));
    }

    #[test]
    fn test_preload_follows_settle() {
        let (timer, mut scheduler, mut map) = setup();
        scheduler.on_viewport_change();

        let mut outcomes = Vec::new();
        timer.run_for(Duration::from_millis(250), |w| {
            outcomes.push(scheduler.handle_wakeup(w, &mut map))
        });

        assert_eq!(outcomes.len(), 2);
        let ViewportOutcome::Preload(bounds) = outcomes[1] else {
            panic!("expected preload, got {:?}", outcomes[1]);
        };
        let view = map.bounds();
        assert!((view.min_lat - bounds.min_lat - 0.01).abs() < 1e-9);
        assert!((bounds.max_lon - view.max_lon - 0.01).abs() < 1e-9);
    }

    #[test]
    fn test_stale_wakeup_is_superseded() {
        let (_timer, mut scheduler, mut map) = setup();
        scheduler.on_viewport_change();
        scheduler.on_viewport_change();

        let outcome = scheduler.handle_wakeup(Wakeup::ViewportSettled { seq: 1 }, &mut map);
        assert_eq!(outcome, ViewportOutcome::Superseded);
        assert!(scheduler.is_rendering());
    }

    #[test]
    fn test_zoom_out_detaches_all() {
        let (_timer, mut scheduler, mut map) = setup();
        scheduler.rebuild_markers(&routes(), &mut map);

        map.set_zoom(11);
        let summary = scheduler.render(&mut map);

        assert_eq!(summary.detached, 1);
        assert!(map.attached_ids().is_empty());
    }

    fn routes_with_paths() -> Vec<RouteSummary> {
        vec![
            RouteSummary::new("peak-circle", PEAK).with_path(vec![PEAK, LatLon::new(22.2600, 114.1600)]),
            RouteSummary::new("lantau-trail", AIRPORT).with_path(vec![AIRPORT, LatLon::new(22.2900, 113.9300)]),
            RouteSummary::new("summit-only", PEAK).with_path(vec![PEAK]),
        ]
    }

    /// Delegates to a headless map and logs the order of every change.
    struct OrderedMap {
        inner: HeadlessMap,
        calls: Vec<String>,
    }

    impl MapView for OrderedMap {
        fn bounds(&self) -> GeoBounds {
            self.inner.bounds()
        }
        fn zoom(&self) -> u8 {
            self.inner.zoom()
        }
        fn center(&self) -> LatLon {
            self.inner.center()
        }
        fn attach(&mut self, marker: &MarkerRecord) {
            self.calls.push(format!("attach {}", marker.route_id));
            self.inner.attach(marker);
        }
        fn detach(&mut self, route_id: &RouteId) {
            self.calls.push(format!("detach {route_id}"));
            self.inner.detach(route_id);
        }
        fn set_icon(&mut self, route_id: &RouteId, level: IconDetailLevel) {
            self.inner.set_icon(route_id, level);
        }
        fn attach_path(&mut self, path: &RoutePath) {
            self.calls.push(format!("attach_path {}", path.route_id()));
            self.inner.attach_path(path);
        }
        fn detach_path(&mut self, route_id: &RouteId) {
            self.calls.push(format!("detach_path {route_id}"));
            self.inner.detach_path(route_id);
        }
        fn attach_endpoints(&mut self, path: &RoutePath) {
            self.calls.push(format!("attach_endpoints {}", path.route_id()));
            self.inner.attach_endpoints(path);
        }
        fn detach_endpoints(&mut self, route_id: &RouteId) {
            self.calls.push(format!("detach_endpoints {route_id}"));
            self.inner.detach_endpoints(route_id);
        }
        fn attach_landmark(&mut self, landmark: &crate::fallback::Landmark) {
            self.inner.attach_landmark(landmark);
        }
    }

    #[test]
    fn test_rebuild_draws_visible_paths_with_endpoints() {
        let (_timer, mut scheduler, mut map) = setup();

        let summary = scheduler.rebuild_markers(&routes_with_paths(), &mut map);

        assert_eq!(summary.paths_drawn, 1);
        assert_eq!(scheduler.path_count(), 2);
        assert_eq!(map.path_ids(), vec![RouteId::from("peak-circle")]);
        assert_eq!(
            map.endpoints_of(&"peak-circle".into()),
            Some((PEAK, LatLon::new(22.2600, 114.1600)))
        );
        assert_eq!(map.endpoint_count(), 1);
        assert!(map.is_attached(&"summit-only".into()));
    }

    #[test]
    fn test_rebuild_removes_everything_before_attaching() {
        let (_timer, mut scheduler, map) = setup();
        let mut map = OrderedMap {
            inner: map,
            calls: Vec::new(),
        };
        scheduler.rebuild_markers(&routes_with_paths()[..1], &mut map);
        map.calls.clear();

        let summary = scheduler.rebuild_markers(&routes_with_paths()[..1], &mut map);

        assert_eq!(
            map.calls,
            vec![
                "detach peak-circle",
                "detach_path peak-circle",
                "detach_endpoints peak-circle",
                "attach peak-circle",
                "attach_path peak-circle",
                "attach_endpoints peak-circle",
            ]
        );
        assert_eq!(summary.paths_removed, 1);
        assert_eq!(summary.paths_drawn, 1);
    }

    #[test]
    fn test_rebuild_with_no_routes_clears_paths() {
        let (_timer, mut scheduler, mut map) = setup();
        scheduler.rebuild_markers(&routes_with_paths(), &mut map);

        let summary = scheduler.rebuild_markers(&[], &mut map);

        assert_eq!(summary.paths_removed, 1);
        assert!(map.path_ids().is_empty());
        assert_eq!(map.endpoint_count(), 0);
        assert_eq!(scheduler.drawn_path_count(), 0);
    }

    #[test]
    fn test_hiding_routes_keeps_markers() {
        let (_timer, mut scheduler, mut map) = setup();
        scheduler.rebuild_markers(&routes_with_paths(), &mut map);
        let markers = map.attached_ids();

        let hidden = scheduler.set_show_routes(false, &mut map);
        assert_eq!(hidden.paths_removed, 1);
        assert_eq!(hidden.detached, 0);
        assert!(map.path_ids().is_empty());
        assert_eq!(map.endpoint_count(), 0);
        assert_eq!(map.attached_ids(), markers);

        // Rebuilding while hidden draws no paths.
        scheduler.rebuild_markers(&routes_with_paths(), &mut map);
        assert!(map.path_ids().is_empty());

        let shown = scheduler.set_show_routes(true, &mut map);
        assert_eq!(shown.paths_drawn, 1);
        assert_eq!(map.path_ids(), vec![RouteId::from("peak-circle")]);
        assert!(scheduler.set_show_routes(true, &mut map).is_noop());
    }

    #[test]
    fn test_show_routes_default_comes_from_config() {
        let timer = ManualTimer::new();
        let config = ViewportConfig::default().with_show_routes(false);
        let mut scheduler = ViewportRenderScheduler::new(config, Arc::new(timer));
        let mut map = HeadlessMap::new(PEAK, 14);

        let summary = scheduler.rebuild_markers(&routes_with_paths(), &mut map);

        assert!(!scheduler.show_routes());
        assert_eq!(summary.paths_drawn, 0);
        assert_eq!(summary.attached, 2);
    }

    #[test]
    fn test_zoom_out_removes_paths() {
        let (_timer, mut scheduler, mut map) = setup();
        scheduler.rebuild_markers(&routes_with_paths(), &mut map);

        map.set_zoom(11);
        let summary = scheduler.render(&mut map);

        assert_eq!(summary.paths_removed, 1);
        assert!(map.path_ids().is_empty());
    }

    #[test]
    fn test_render_is_idempotent() {
        let (_timer, mut scheduler, mut map) = setup();
        scheduler.rebuild_markers(&routes(), &mut map);
        let attaches = map.attach_calls();

        assert!(scheduler.render(&mut map).is_noop());
        assert_eq!(map.attach_calls(), attaches);
    }
}
