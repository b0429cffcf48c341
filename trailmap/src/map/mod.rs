//! Narrow capability interfaces over the underlying map library.
//!
//! The controller and scheduler never touch a concrete mapping library.
//! They see the map through two traits:
//!
//! - [`TileLayer`] - the single tile layer slot (load a source, unload it,
//!   preload tiles around the viewport). Tile outcomes come back later as
//!   [`TileEvent`](crate::event::TileEvent)s tagged with the generation
//!   passed to `load`.
//! - [`MapView`] - viewport queries, marker attachment and route paths.
//!
//! Adapters shipped with the crate:
//!
//! - [`HeadlessMap`] - an in-memory map that derives bounds from a centre,
//!   zoom and pixel size
//! - [`HttpTileLayer`] - fetches tiles over HTTP and reports outcomes on the
//!   session's event channel
//! - [`RecordingTileLayer`] - records every call, for tests and dry runs

mod headless;
mod http_layer;
mod recording;

pub use headless::HeadlessMap;
pub use http_layer::{HttpTileLayer, TileStore};
pub use recording::{LayerCall, RecordingTileLayer};

use crate::coord::{GeoBounds, LatLon};
use crate::event::{Generation, RouteId};
use crate::fallback::Landmark;
use crate::provider::TileProvider;
use crate::viewport::{IconDetailLevel, MarkerRecord, RoutePath};

/// What the tile layer slot should display.
#[derive(Debug, Clone, Copy)]
pub enum LayerSource<'a> {
    /// Tiles fetched from a network provider. Outcomes must be reported with
    /// `generation`.
    Network {
        provider: &'a TileProvider,
        generation: Generation,
    },
    /// Locally synthesized tiles from [`crate::fallback::synthesize_tile`].
    Fallback,
}

/// The map's single tile layer.
pub trait TileLayer: Send {
    /// Replace whatever is displayed with `source`.
    fn load(&mut self, source: LayerSource<'_>);

    /// Remove the current layer. Outcomes still in flight for it must not be
    /// reported afterwards; if they are, the controller drops them as stale.
    fn unload(&mut self);

    /// Warm tiles around the viewport. Optional.
    fn preload(&mut self, _bounds: GeoBounds) {}
}

/// Viewport queries and marker attachment on the rendered map.
pub trait MapView {
    fn bounds(&self) -> GeoBounds;

    fn zoom(&self) -> u8;

    fn center(&self) -> LatLon;

    /// Show a marker. Only called for markers not already attached.
    fn attach(&mut self, marker: &MarkerRecord);

    /// Hide a marker. Only called for markers currently attached.
    fn detach(&mut self, route_id: &RouteId);

    /// Swap the icon of an attached marker.
    fn set_icon(&mut self, route_id: &RouteId, level: IconDetailLevel);

    /// Draw a route's path polyline. Only called for paths not already drawn.
    fn attach_path(&mut self, path: &RoutePath);

    /// Remove a route's path polyline.
    fn detach_path(&mut self, route_id: &RouteId);

    /// Pin markers at the start and end of a route's path.
    fn attach_endpoints(&mut self, path: &RoutePath);

    fn detach_endpoints(&mut self, route_id: &RouteId);

    /// Pin an offline landmark.
    fn attach_landmark(&mut self, landmark: &Landmark);
}
