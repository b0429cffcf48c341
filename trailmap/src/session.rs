//! Composition root for one map.
//!
//! A [`MapSession`] owns the provider controller, the viewport scheduler,
//! the offline synthesizer and the map view, and routes every
//! [`MapEvent`] to the component that cares about it. The host feeds events
//! in through [`MapSession::handle_event`] and reads status back out; no
//! other code mutates the tile layer or the markers.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::controller::{
    ControllerConfig, ControllerState, IgnoreReason, TileProviderController, Transition,
};
use crate::coord::{GeoBounds, LatLon};
use crate::event::{MapEvent, RouteSummary, TileEvent, Wakeup};
use crate::fallback::FallbackTileSynthesizer;
use crate::map::{MapView, TileLayer};
use crate::notify::Notifier;
use crate::provider::ProviderRegistry;
use crate::telemetry::{MapMetrics, TelemetrySnapshot};
use crate::timer::Timer;
use crate::viewport::{RenderSummary, ViewportConfig, ViewportOutcome, ViewportRenderScheduler};

/// Tunables for every component of a session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionConfig {
    pub controller: ControllerConfig,
    pub viewport: ViewportConfig,
}

/// Read-only view of the map's rendering state, for debug panels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    pub zoom: u8,
    pub center: LatLon,
    /// Bounds the most recent render acted on.
    pub bounds_active: Option<GeoBounds>,
    pub marker_count: usize,
    pub attached_marker_count: usize,
    /// Route paths drawn, each with its start/end markers.
    pub drawn_path_count: usize,
    pub show_routes: bool,
    /// True while a debounced render is pending.
    pub is_rendering: bool,
    pub tile_layer_active: bool,
}

/// What handling one event did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HandledEvent {
    /// A tile event or controller wakeup went through the provider
    /// controller.
    Controller(Transition),
    /// A viewport wakeup went through the scheduler.
    Viewport(ViewportOutcome),
    /// A viewport change was debounced.
    ViewportQueued,
    /// The route list was replaced and markers rebuilt.
    MarkersRebuilt(RenderSummary),
    /// Route paths were switched on or off.
    RoutesToggled(RenderSummary),
}

/// One map: its tile provider chain, its markers and its view.
pub struct MapSession<V: MapView> {
    controller: TileProviderController,
    scheduler: ViewportRenderScheduler,
    synthesizer: FallbackTileSynthesizer,
    view: V,
    notifier: Arc<dyn Notifier>,
    metrics: Arc<MapMetrics>,
}

impl<V: MapView> MapSession<V> {
    pub fn new(
        registry: ProviderRegistry,
        config: SessionConfig,
        layer: Box<dyn TileLayer>,
        view: V,
        timer: Arc<dyn Timer>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            controller: TileProviderController::new(
                registry,
                config.controller,
                layer,
                Arc::clone(&timer),
            ),
            scheduler: ViewportRenderScheduler::new(config.viewport, timer),
            synthesizer: FallbackTileSynthesizer::new(),
            view,
            notifier,
            metrics: Arc::new(MapMetrics::new()),
        }
    }

    /// Activate the first tile provider.
    pub fn start(&mut self) -> Transition {
        let transition = self.controller.start();
        if transition.is_offline() {
            self.activate_offline();
        }
        transition
    }

    /// Route one event to its component.
    pub fn handle_event(&mut self, event: MapEvent) -> HandledEvent {
        match event {
            MapEvent::Tile(event) => HandledEvent::Controller(self.handle_tile(event)),
            MapEvent::Timer(wakeup) => self.handle_wakeup(wakeup),
            MapEvent::ViewportChanged => {
                self.metrics.viewport_changed();
                self.scheduler.on_viewport_change();
                HandledEvent::ViewportQueued
            }
            MapEvent::RoutesChanged(routes) => {
                HandledEvent::MarkersRebuilt(self.rebuild_markers(&routes))
            }
            MapEvent::ShowRoutes(show) => HandledEvent::RoutesToggled(self.set_show_routes(show)),
        }
    }

    /// Replace the route list immediately, without waiting for an event.
    pub fn rebuild_markers(&mut self, routes: &[RouteSummary]) -> RenderSummary {
        let summary = self.scheduler.rebuild_markers(routes, &mut self.view);
        self.metrics.rendered(summary.attached, summary.detached);
        summary
    }

    /// Show or hide route paths and their start/end markers.
    pub fn set_show_routes(&mut self, show: bool) -> RenderSummary {
        let summary = self.scheduler.set_show_routes(show, &mut self.view);
        self.metrics.rendered(summary.attached, summary.detached);
        summary
    }

    pub fn is_ready(&self) -> bool {
        self.controller.is_ready()
    }

    pub fn is_offline(&self) -> bool {
        self.controller.is_offline()
    }

    pub fn current_provider_index(&self) -> usize {
        self.controller.current_provider_index()
    }

    pub fn controller_state(&self) -> ControllerState {
        self.controller.state()
    }

    pub fn performance_metrics(&self) -> PerformanceMetrics {
        PerformanceMetrics {
            zoom: self.view.zoom(),
            center: self.view.center(),
            bounds_active: self.scheduler.bounds_active(),
            marker_count: self.scheduler.marker_count(),
            attached_marker_count: self.scheduler.attached_count(),
            drawn_path_count: self.scheduler.drawn_path_count(),
            show_routes: self.scheduler.show_routes(),
            is_rendering: self.scheduler.is_rendering(),
            tile_layer_active: self.controller.tile_layer_active(),
        }
    }

    pub fn telemetry(&self) -> TelemetrySnapshot {
        self.metrics.snapshot()
    }

    /// Shared handle to the live counters.
    pub fn metrics(&self) -> Arc<MapMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn controller(&self) -> &TileProviderController {
        &self.controller
    }

    pub fn scheduler(&self) -> &ViewportRenderScheduler {
        &self.scheduler
    }

    pub fn synthesizer(&self) -> &FallbackTileSynthesizer {
        &self.synthesizer
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    /// Mutable access for panning and zooming. Follow any change with
    /// [`MapEvent::ViewportChanged`].
    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    fn handle_tile(&mut self, event: TileEvent) -> Transition {
        let loaded = matches!(event, TileEvent::Loaded { .. });
        let transition = self.controller.handle_event(event);

        match transition {
            Transition::Ignored(_) => {}
            _ if loaded => self.metrics.tile_loaded(),
            _ => self.metrics.tile_failed(),
        }
        self.record_transition(transition);
        transition
    }

    fn handle_wakeup(&mut self, wakeup: Wakeup) -> HandledEvent {
        match wakeup {
            Wakeup::ViewportSettled { .. } | Wakeup::Preload { .. } => {
                let outcome = self.scheduler.handle_wakeup(wakeup, &mut self.view);
                match outcome {
                    ViewportOutcome::Rendered(summary) => {
                        self.metrics.rendered(summary.attached, summary.detached);
                    }
                    ViewportOutcome::Preload(bounds) => {
                        if self.controller.preload(bounds) {
                            self.metrics.preloaded();
                        }
                    }
                    ViewportOutcome::Superseded => {}
                }
                HandledEvent::Viewport(outcome)
            }
            Wakeup::SwitchProvider { .. } | Wakeup::LoadTimeout { .. } => {
                let transition = self.controller.handle_event(wakeup);
                if matches!(wakeup, Wakeup::LoadTimeout { .. })
                    && !matches!(transition, Transition::Ignored(_))
                {
                    self.metrics.load_timeout();
                }
                self.record_transition(transition);
                HandledEvent::Controller(transition)
            }
        }
    }

    fn record_transition(&mut self, transition: Transition) {
        match transition {
            Transition::Ignored(IgnoreReason::Stale) => self.metrics.stale_event(),
            Transition::Ignored(IgnoreReason::Suppressed) => self.metrics.error_suppressed(),
            Transition::Activated { .. } => self.metrics.provider_switched(),
            Transition::Offline => self.activate_offline(),
            _ => {}
        }
    }

    fn activate_offline(&mut self) {
        if self.synthesizer.activate(&mut self.view, self.notifier.as_ref()) {
            self.metrics.fallback_activated();
        } else {
            debug!("Offline fallback already active");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Generation;
    use crate::map::{HeadlessMap, RecordingTileLayer};
    use crate::notify::{RecordingNotifier, Severity};
    use crate::provider::{ProviderRole, TileProvider};
    use crate::timer::ManualTimer;
    use std::time::Duration;

    const CENTRAL: LatLon = LatLon::new(22.2816, 114.1583);

    fn session(
        tolerances: &[u32],
    ) -> (MapSession<HeadlessMap>, ManualTimer, Arc<RecordingNotifier>) {
        let providers = tolerances
            .iter()
            .enumerate()
            .map(|(i, &tol)| {
                let role = if i == 0 {
                    ProviderRole::Primary
                } else {
                    ProviderRole::Backup
                };
                TileProvider::new(format!("p{i}"), format!("https://p{i}.test/{{z}}/{{x}}/{{y}}.png"), role)
                    .with_error_tolerance(tol)
                    .with_timeout(Duration::ZERO)
            })
            .collect();
        let timer = ManualTimer::new();
        let notifier = Arc::new(RecordingNotifier::new());
        let session = MapSession::new(
            ProviderRegistry::new(providers).unwrap(),
            SessionConfig::default(),
            Box::new(RecordingTileLayer::new()),
            HeadlessMap::new(CENTRAL, 14),
            Arc::new(timer.clone()),
            notifier.clone(),
        );
        (session, timer, notifier)
    }

    fn failed(session: &MapSession<HeadlessMap>, url: &str) -> MapEvent {
        MapEvent::Tile(TileEvent::Failed {
            generation: session.controller().generation(),
            url: url.to_string(),
        })
    }

    #[test]
    fn test_ready_after_first_tile() {
        let (mut session, _timer, _) = session(&[1]);
        session.start();
        assert!(!session.is_ready());

        session.handle_event(MapEvent::Tile(TileEvent::Loaded {
            generation: Generation::new(1),
            url: "https://p0.test/14/1/1.png".to_string(),
        }));

        assert!(session.is_ready());
        assert_eq!(session.telemetry().tiles_loaded, 1);
    }

    #[test]
    fn test_offline_places_landmarks_and_notifies() {
        let (mut session, _timer, notifier) = session(&[0]);
        session.start();

        let event = failed(&session, "https://p0.test/1");
        session.handle_event(event);

        assert!(session.is_offline());
        assert_eq!(session.view().landmarks().len(), 5);
        assert_eq!(notifier.messages().len(), 1);
        assert_eq!(notifier.messages()[0].1, Severity::Info);
        assert_eq!(session.telemetry().fallback_activations, 1);
        assert!(session.performance_metrics().tile_layer_active);
    }

    #[test]
    fn test_viewport_change_renders_after_debounce() {
        let (mut session, timer, _) = session(&[1]);
        session.start();
        session.rebuild_markers(&[RouteSummary::new("central-walk", CENTRAL)]);
        session.view_mut().set_zoom(16);

        session.handle_event(MapEvent::ViewportChanged);
        assert!(session.performance_metrics().is_rendering);

        timer.run_for(Duration::from_millis(250), |w| {
            session.handle_event(MapEvent::Timer(w));
        });

        let metrics = session.performance_metrics();
        assert!(!metrics.is_rendering);
        assert_eq!(metrics.zoom, 16);
        assert_eq!(metrics.attached_marker_count, 1);
        assert!(metrics.bounds_active.is_some());
        assert_eq!(session.telemetry().preloads, 1);
    }

    #[test]
    fn test_show_routes_event_toggles_paths() {
        let (mut session, _timer, _) = session(&[1]);
        let happy_valley = LatLon::new(22.2700, 114.1830);
        let route = RouteSummary::new("central-walk", CENTRAL).with_path(vec![CENTRAL, happy_valley]);
        session.handle_event(MapEvent::RoutesChanged(vec![route]));
        assert_eq!(session.performance_metrics().drawn_path_count, 1);

        let handled = session.handle_event(MapEvent::ShowRoutes(false));

        assert!(matches!(
            handled,
            HandledEvent::RoutesToggled(RenderSummary { paths_removed: 1, .. })
        ));
        let metrics = session.performance_metrics();
        assert!(!metrics.show_routes);
        assert_eq!(metrics.drawn_path_count, 0);
        assert_eq!(metrics.attached_marker_count, 1);
        assert_eq!(session.view().endpoint_count(), 0);
    }

    #[test]
    fn test_performance_metrics_serialize() {
        let (session, _timer, _) = session(&[1]);
        let json = serde_json::to_value(session.performance_metrics()).unwrap();
        assert_eq!(json["zoom"], 14);
        assert_eq!(json["marker_count"], 0);
        assert!(json["bounds_active"].is_null());
    }
}
