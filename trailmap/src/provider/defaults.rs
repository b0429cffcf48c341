//! Built-in provider chain for the Hong Kong trail map.

use std::time::Duration;

use super::registry::ProviderRegistry;
use super::types::{ProviderRole, TileProvider};

/// OpenStreetMap standard tiles, tried first.
pub fn openstreetmap() -> TileProvider {
    TileProvider::new(
        "osm",
        "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
        ProviderRole::Primary,
    )
    .with_attribution("© OpenStreetMap contributors")
    .with_max_zoom(19)
    .with_error_tolerance(3)
    .with_timeout(Duration::from_secs(10))
}

/// CARTO light basemap, used when OpenStreetMap is unreachable.
pub fn carto_light() -> TileProvider {
    TileProvider::new(
        "carto-light",
        "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}.png",
        ProviderRole::Backup,
    )
    .with_attribution("© OpenStreetMap contributors © CARTO")
    .with_subdomains(["a", "b", "c", "d"])
    .with_max_zoom(19)
    .with_error_tolerance(2)
    .with_timeout(Duration::from_secs(8))
}

/// Offline sentinel: never requested over the network.
pub fn offline_sentinel() -> TileProvider {
    TileProvider::new(
        "offline",
        "offline://hk-map/{z}/{x}/{y}.png",
        ProviderRole::Offline,
    )
    .with_attribution("Hong Kong Trails - offline mode")
    .with_max_zoom(15)
    .with_error_tolerance(0)
}

/// The default chain: OpenStreetMap, CARTO, then offline.
pub fn hong_kong_defaults() -> Vec<TileProvider> {
    vec![openstreetmap(), carto_light(), offline_sentinel()]
}

impl ProviderRegistry {
    /// Registry built from [`hong_kong_defaults`].
    pub fn hong_kong() -> Self {
        Self {
            providers: hong_kong_defaults(),
        }
    }
}
