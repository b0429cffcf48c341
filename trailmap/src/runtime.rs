//! Async driver for a [`MapSession`].
//!
//! The session is single-threaded by construction. [`MapRuntime::spawn`]
//! moves it into one tokio task that drains an event channel, so tile
//! fetchers, timers and UI code can all post [`MapEvent`]s from anywhere.
//! After every event the task publishes a [`MapStatus`] on a `watch`
//! channel.
//!
//! ```text
//! HttpTileLayer ─┐
//! TokioTimer ────┼──► mpsc ──► session task ──► watch<MapStatus>
//! MapHandle ─────┘
//! ```

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::event::MapEvent;
use crate::map::MapView;
use crate::session::{MapSession, PerformanceMetrics};
use crate::telemetry::TelemetrySnapshot;
use crate::timer::{Timer, TokioTimer};

/// Errors talking to a running session.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Map session has stopped")]
    Stopped,

    #[error("Map session task failed: {0}")]
    Join(String),
}

/// Snapshot of a running session.
#[derive(Debug, Clone, Serialize)]
pub struct MapStatus {
    /// Controller state, e.g. `ready(0)` or `offline`.
    pub state: String,
    pub provider_index: usize,
    pub provider: Option<String>,
    pub is_ready: bool,
    pub is_offline: bool,
    pub metrics: PerformanceMetrics,
    pub telemetry: TelemetrySnapshot,
}

impl MapStatus {
    fn of<V: MapView>(session: &MapSession<V>) -> Self {
        let controller = session.controller();
        Self {
            state: controller.state().to_string(),
            provider_index: controller.current_provider_index(),
            provider: controller.current_provider().map(|p| p.name.clone()),
            is_ready: session.is_ready(),
            is_offline: session.is_offline(),
            metrics: session.performance_metrics(),
            telemetry: session.telemetry(),
        }
    }
}

/// What a session builder gets to wire its components with.
pub struct RuntimeContext {
    /// Sender for posting events into the session task.
    pub events: mpsc::UnboundedSender<MapEvent>,
    /// Timer whose wakeups arrive on `events`.
    pub timer: Arc<dyn Timer>,
    /// Cancelled when the runtime shuts down.
    pub shutdown: CancellationToken,
}

/// Spawns map sessions onto the current tokio runtime.
pub struct MapRuntime;

impl MapRuntime {
    /// Build a session with `build` and run it on a new task.
    ///
    /// The session is started before the first event is processed. Must be
    /// called from within a tokio runtime.
    pub fn spawn<V, F>(build: F) -> MapHandle<V>
    where
        V: MapView + Send + 'static,
        F: FnOnce(&RuntimeContext) -> MapSession<V>,
    {
        let (events, mut receiver) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let context = RuntimeContext {
            events: events.clone(),
            timer: Arc::new(TokioTimer::new(events.clone(), shutdown.clone())),
            shutdown: shutdown.clone(),
        };

        let mut session = build(&context);
        let (status_tx, status_rx) = watch::channel(MapStatus::of(&session));
        let token = shutdown.clone();

        let task = tokio::spawn(async move {
            session.start();
            status_tx.send_replace(MapStatus::of(&session));
            info!(status = %session.controller().display_status(), "Map session started");

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    event = receiver.recv() => match event {
                        Some(event) => {
                            session.handle_event(event);
                            status_tx.send_replace(MapStatus::of(&session));
                        }
                        None => break,
                    },
                }
            }

            debug!(status = %session.controller().display_status(), "Map session stopped");
            session
        });

        MapHandle {
            events,
            status: status_rx,
            shutdown,
            task,
        }
    }
}

/// Handle to a running session.
pub struct MapHandle<V: MapView> {
    events: mpsc::UnboundedSender<MapEvent>,
    status: watch::Receiver<MapStatus>,
    shutdown: CancellationToken,
    task: JoinHandle<MapSession<V>>,
}

impl<V: MapView> MapHandle<V> {
    /// Post an event to the session.
    pub fn send(&self, event: MapEvent) -> Result<(), RuntimeError> {
        self.events.send(event).map_err(|_| RuntimeError::Stopped)
    }

    /// Sender for code that posts events on its own.
    pub fn sender(&self) -> mpsc::UnboundedSender<MapEvent> {
        self.events.clone()
    }

    /// Latest published status.
    pub fn status(&self) -> MapStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MapStatus> {
        self.status.clone()
    }

    /// Wait until a published status satisfies `predicate`.
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&MapStatus) -> bool,
    ) -> Result<MapStatus, RuntimeError> {
        let mut status = self.status.clone();
        let matched = status
            .wait_for(predicate)
            .await
            .map_err(|_| RuntimeError::Stopped)?;
        Ok(matched.clone())
    }

    /// Stop the session and hand it back.
    pub async fn shutdown(self) -> Result<MapSession<V>, RuntimeError> {
        self.shutdown.cancel();
        self.task
            .await
            .map_err(|e| RuntimeError::Join(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::LatLon;
    use crate::event::{RouteSummary, TileEvent};
    use crate::map::{HeadlessMap, RecordingTileLayer};
    use crate::notify::RecordingNotifier;
    use crate::provider::ProviderRegistry;
    use crate::session::SessionConfig;
    use std::time::Duration;

    const CENTRAL: LatLon = LatLon::new(22.2816, 114.1583);

    fn spawn(layer: RecordingTileLayer) -> MapHandle<HeadlessMap> {
        MapRuntime::spawn(|context| {
            MapSession::new(
                ProviderRegistry::hong_kong(),
                SessionConfig::default(),
                Box::new(layer),
                HeadlessMap::new(CENTRAL, 14),
                Arc::clone(&context.timer),
                Arc::new(RecordingNotifier::new()),
            )
        })
    }

    fn failure(generation: crate::event::Generation, n: u32) -> MapEvent {
        MapEvent::Tile(TileEvent::Failed {
            generation,
            url: format!("https://tile.openstreetmap.org/14/{n}/0.png"),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_becomes_ready() {
        let layer = RecordingTileLayer::new();
        let handle = spawn(layer.clone());

        let status = handle.wait_for(|s| s.state == "loading(0)").await.unwrap();
        assert_eq!(status.provider.as_deref(), Some("osm"));

        let generation = layer.last_generation().unwrap();
        handle
            .send(MapEvent::Tile(TileEvent::Loaded {
                generation,
                url: "https://tile.openstreetmap.org/14/1/1.png".to_string(),
            }))
            .unwrap();

        let status = handle.wait_for(|s| s.is_ready).await.unwrap();
        assert_eq!(status.state, "ready(0)");
        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_switch_fires_on_tokio_clock() {
        let layer = RecordingTileLayer::new();
        let handle = spawn(layer.clone());
        handle.wait_for(|s| s.state == "loading(0)").await.unwrap();

        let generation = layer.last_generation().unwrap();
        for n in 0..4 {
            handle.send(failure(generation, n)).unwrap();
        }

        let status = handle.wait_for(|s| s.provider_index == 1).await.unwrap();
        assert_eq!(status.provider.as_deref(), Some("carto-light"));
        assert_eq!(status.telemetry.provider_switches, 1);

        let session = handle.shutdown().await.unwrap();
        assert_eq!(session.controller().error_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounced_render_publishes_metrics() {
        let handle = spawn(RecordingTileLayer::new());
        handle
            .send(MapEvent::RoutesChanged(vec![RouteSummary::new("central", CENTRAL)]))
            .unwrap();
        handle.send(MapEvent::ViewportChanged).unwrap();

        let status = handle
            .wait_for(|s| s.telemetry.renders >= 2 && !s.metrics.is_rendering)
            .await
            .unwrap();
        assert_eq!(status.metrics.attached_marker_count, 1);

        tokio::time::sleep(Duration::from_millis(300)).await;
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_send_after_shutdown_fails() {
        let handle = spawn(RecordingTileLayer::new());
        let sender = handle.sender();
        handle.shutdown().await.unwrap();

        // The receiver was dropped with the session task.
        assert!(sender.send(MapEvent::ViewportChanged).is_err());
    }
}
