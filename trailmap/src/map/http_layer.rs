//! Tile layer that fetches over HTTP.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::coord::{tiles_covering, GeoBounds, TileCoord, TILE_SIZE_PX};
use crate::event::{Generation, MapEvent, TileEvent};
use crate::fallback::{error_tile, synthesize_tile};
use crate::provider::{HttpClient, TileProvider};

use super::{LayerSource, TileLayer};

/// Tile images held by an [`HttpTileLayer`], keyed by tile address.
///
/// Holds fetched bytes, the error tile for failed fetches, and rendered
/// fallback PNGs once offline. Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct TileStore {
    tiles: Arc<Mutex<HashMap<TileCoord, Vec<u8>>>>,
}

impl TileStore {
    pub fn get(&self, tile: &TileCoord) -> Option<Vec<u8>> {
        self.tiles.lock().get(tile).cloned()
    }

    pub fn contains(&self, tile: &TileCoord) -> bool {
        self.tiles.lock().contains_key(tile)
    }

    pub fn len(&self) -> usize {
        self.tiles.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.lock().is_empty()
    }

    /// All stored tiles, unordered.
    pub fn snapshot(&self) -> Vec<(TileCoord, Vec<u8>)> {
        self.tiles
            .lock()
            .iter()
            .map(|(tile, bytes)| (*tile, bytes.clone()))
            .collect()
    }

    fn insert(&self, tile: TileCoord, bytes: Vec<u8>) {
        self.tiles.lock().insert(tile, bytes);
    }
}

struct ActiveProvider {
    provider: TileProvider,
    generation: Generation,
    cancel: CancellationToken,
}

/// Fetches a working set of tiles from the active provider.
///
/// Each fetch runs the blocking [`HttpClient`] on tokio's blocking pool and
/// posts a [`TileEvent`] tagged with the load generation into the session's
/// event channel. Unloading cancels every fetch still in flight, so no
/// outcome is reported for a layer that is gone.
pub struct HttpTileLayer {
    client: Arc<dyn HttpClient>,
    events: UnboundedSender<MapEvent>,
    runtime: Handle,
    tiles: Vec<TileCoord>,
    store: TileStore,
    active: Option<ActiveProvider>,
    fallback_size: u32,
}

impl HttpTileLayer {
    pub fn new(client: Arc<dyn HttpClient>, events: UnboundedSender<MapEvent>, runtime: Handle) -> Self {
        Self {
            client,
            events,
            runtime,
            tiles: Vec::new(),
            store: TileStore::default(),
            active: None,
            fallback_size: TILE_SIZE_PX,
        }
    }

    /// Tiles fetched on every load.
    pub fn with_tiles(mut self, tiles: Vec<TileCoord>) -> Self {
        self.tiles = tiles;
        self
    }

    /// Pixel size of rendered fallback tiles.
    pub fn with_fallback_size(mut self, size: u32) -> Self {
        self.fallback_size = size;
        self
    }

    pub fn set_tiles(&mut self, tiles: Vec<TileCoord>) {
        self.tiles = tiles;
    }

    /// Handle to the tile images, shared with the layer.
    pub fn store(&self) -> TileStore {
        self.store.clone()
    }

    fn fetch(&self, active: &ActiveProvider, tile: TileCoord) {
        if !active.provider.supports_zoom(tile.zoom) {
            trace!(provider = %active.provider.name, tile = %tile, "Zoom beyond provider maximum, skipping");
            return;
        }

        let url = active.provider.tile_url(tile);
        let generation = active.generation;
        let client = Arc::clone(&self.client);
        let events = self.events.clone();
        let store = self.store.clone();
        let cancel = active.cancel.clone();

        self.runtime.spawn(async move {
            let request_url = url.clone();
            let joined = tokio::select! {
                _ = cancel.cancelled() => return,
                joined = tokio::task::spawn_blocking(move || client.get(&request_url)) => joined,
            };
            if cancel.is_cancelled() {
                return;
            }

            let event = match joined {
                Ok(Ok(bytes)) => {
                    store.insert(tile, bytes);
                    TileEvent::Loaded { generation, url }
                }
                Ok(Err(e)) => {
                    debug!(tile = %tile, error = %e, "Tile fetch failed");
                    store.insert(tile, error_tile().to_vec());
                    TileEvent::Failed { generation, url }
                }
                Err(e) => {
                    warn!(tile = %tile, error = %e, "Tile fetch task aborted");
                    store.insert(tile, error_tile().to_vec());
                    TileEvent::Failed { generation, url }
                }
            };

            // The session may already be gone during shutdown.
            let _ = events.send(MapEvent::Tile(event));
        });
    }

    fn render_fallback(&self) {
        for tile in &self.tiles {
            match synthesize_tile(*tile).to_png(self.fallback_size) {
                Ok(png) => self.store.insert(*tile, png),
                Err(e) => warn!(tile = %tile, error = %e, "Failed to render fallback tile"),
            }
        }
        debug!(tiles = self.tiles.len(), "Rendered fallback tiles");
    }
}

impl TileLayer for HttpTileLayer {
    fn load(&mut self, source: LayerSource<'_>) {
        self.unload();

        match source {
            LayerSource::Network {
                provider,
                generation,
            } => {
                let active = ActiveProvider {
                    provider: provider.clone(),
                    generation,
                    cancel: CancellationToken::new(),
                };
                for tile in &self.tiles {
                    self.fetch(&active, *tile);
                }
                self.active = Some(active);
            }
            LayerSource::Fallback => self.render_fallback(),
        }
    }

    fn unload(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
        }
    }

    fn preload(&mut self, bounds: GeoBounds) {
        let (Some(active), Some(zoom)) = (&self.active, self.tiles.first().map(|t| t.zoom)) else {
            return;
        };

        let nearby = match tiles_covering(&bounds, zoom) {
            Ok(tiles) => tiles,
            Err(e) => {
                debug!(error = %e, "Cannot preload around viewport");
                return;
            }
        };

        let mut requested = 0;
        for tile in nearby {
            if !self.store.contains(&tile) && !self.tiles.contains(&tile) {
                self.fetch(active, tile);
                requested += 1;
            }
        }
        debug!(requested, "Preloading nearby tiles");
    }
}

impl Drop for HttpTileLayer {
    fn drop(&mut self) {
        self.unload();
    }
}
