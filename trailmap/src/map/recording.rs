//! Tile layer that records calls instead of fetching.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::coord::GeoBounds;
use crate::event::Generation;

use super::{LayerSource, TileLayer};

/// One call made against a [`RecordingTileLayer`].
#[derive(Debug, Clone, PartialEq)]
pub enum LayerCall {
    LoadNetwork {
        provider: String,
        generation: Generation,
    },
    LoadFallback,
    Unload,
    Preload(GeoBounds),
}

/// A tile layer that only records what it was asked to do.
///
/// Clones share the same log, so a test can hand one clone to the session
/// and keep another to inspect.
#[derive(Debug, Clone, Default)]
pub struct RecordingTileLayer {
    calls: Arc<Mutex<Vec<LayerCall>>>,
}

impl RecordingTileLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<LayerCall> {
        self.calls.lock().clone()
    }

    /// Names of the providers loaded so far, in load order.
    pub fn loaded_providers(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                LayerCall::LoadNetwork { provider, .. } => Some(provider.clone()),
                _ => None,
            })
            .collect()
    }

    /// Generation of the most recent network load.
    pub fn last_generation(&self) -> Option<Generation> {
        self.calls.lock().iter().rev().find_map(|call| match call {
            LayerCall::LoadNetwork { generation, .. } => Some(*generation),
            _ => None,
        })
    }

    pub fn fallback_loads(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, LayerCall::LoadFallback))
            .count()
    }

    pub fn preload_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, LayerCall::Preload(_)))
            .count()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

impl TileLayer for RecordingTileLayer {
    fn load(&mut self, source: LayerSource<'_>) {
        let call = match source {
            LayerSource::Network {
                provider,
                generation,
            } => LayerCall::LoadNetwork {
                provider: provider.name.clone(),
                generation,
            },
            LayerSource::Fallback => LayerCall::LoadFallback,
        };
        self.calls.lock().push(call);
    }

    fn unload(&mut self) {
        self.calls.lock().push(LayerCall::Unload);
    }

    fn preload(&mut self, bounds: GeoBounds) {
        self.calls.lock().push(LayerCall::Preload(bounds));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ProviderRole, TileProvider};

    #[test]
    fn test_clones_share_log() {
        let observer = RecordingTileLayer::new();
        let mut layer = observer.clone();
        let osm = TileProvider::new(
            "osm",
            "https://tile.example.org/{z}/{x}/{y}.png",
            ProviderRole::Primary,
        );

        layer.load(LayerSource::Network {
            provider: &osm,
            generation: Generation::new(3),
        });
        layer.unload();
        layer.load(LayerSource::Fallback);

        assert_eq!(observer.loaded_providers(), vec!["osm".to_string()]);
        assert_eq!(observer.last_generation(), Some(Generation::new(3)));
        assert_eq!(observer.fallback_loads(), 1);
        assert_eq!(observer.calls().len(), 3);
    }
}
