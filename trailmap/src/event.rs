//! Events flowing into a [`MapSession`](crate::session::MapSession).
//!
//! Everything the session reacts to arrives as a value: raw tile outcomes
//! from the tile layer, viewport changes from the map, new route lists from
//! the filtering UI, and timer wakeups scheduled earlier by the session
//! itself.

use std::fmt;

use crate::coord::LatLon;

/// Identifies one activation of a tile provider.
///
/// Bumped every time the controller loads a provider. Tile events and timer
/// wakeups carry the generation they were issued under, so anything that
/// arrives after a switch can be recognised as stale and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Generation(u64);

impl Generation {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen#{}", self.0)
    }
}

/// Outcome of a single tile request, as reported by the tile layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileEvent {
    Loaded { generation: Generation, url: String },
    Failed { generation: Generation, url: String },
}

impl TileEvent {
    pub fn generation(&self) -> Generation {
        match self {
            TileEvent::Loaded { generation, .. } | TileEvent::Failed { generation, .. } => {
                *generation
            }
        }
    }

    pub fn url(&self) -> &str {
        match self {
            TileEvent::Loaded { url, .. } | TileEvent::Failed { url, .. } => url,
        }
    }
}

/// Deferred continuation delivered by a [`Timer`](crate::timer::Timer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wakeup {
    /// Delay before activating the next provider has elapsed.
    SwitchProvider { generation: Generation },
    /// The active provider produced neither a tile nor an error in time.
    LoadTimeout { generation: Generation },
    /// Viewport changes have been quiet for the debounce window.
    ViewportSettled { seq: u64 },
    /// Viewport changes have been quiet long enough to preload neighbours.
    Preload { seq: u64 },
}

/// Unique key of a route in the externally owned route list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(String);

impl RouteId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RouteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RouteId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The part of a filtered route the map needs: its key, where to pin it and
/// the trail it follows.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSummary {
    pub id: RouteId,
    pub position: LatLon,
    /// Trail geometry. Drawn only when it has at least two points.
    pub path: Vec<LatLon>,
}

impl RouteSummary {
    pub fn new(id: impl Into<RouteId>, position: LatLon) -> Self {
        Self {
            id: id.into(),
            position,
            path: Vec::new(),
        }
    }

    pub fn with_path(mut self, path: Vec<LatLon>) -> Self {
        self.path = path;
        self
    }
}

/// Everything a map session can be asked to handle.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    Tile(TileEvent),
    Timer(Wakeup),
    /// The map was panned or zoomed.
    ViewportChanged,
    /// The filtered route list was replaced.
    RoutesChanged(Vec<RouteSummary>),
    /// Route paths and their start/end markers were toggled on or off.
    ShowRoutes(bool),
}

impl From<TileEvent> for MapEvent {
    fn from(event: TileEvent) -> Self {
        MapEvent::Tile(event)
    }
}

impl From<Wakeup> for MapEvent {
    fn from(wakeup: Wakeup) -> Self {
        MapEvent::Timer(wakeup)
    }
}
