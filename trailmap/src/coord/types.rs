//! Coordinate value types.

use serde::Serialize;
use thiserror::Error;

/// Maximum latitude representable in Web Mercator.
pub const MAX_LAT: f64 = 85.05112878;

/// Minimum latitude representable in Web Mercator.
pub const MIN_LAT: f64 = -85.05112878;

/// Minimum longitude.
pub const MIN_LON: f64 = -180.0;

/// Maximum longitude.
pub const MAX_LON: f64 = 180.0;

/// Lowest zoom level.
pub const MIN_ZOOM: u8 = 0;

/// Highest zoom level any provider can serve.
pub const MAX_ZOOM: u8 = 22;

/// Side length of a raster tile in pixels.
pub const TILE_SIZE_PX: u32 = 256;

/// Errors from coordinate conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    #[error("Latitude {0} is outside the Web Mercator range")]
    InvalidLatitude(f64),

    #[error("Longitude {0} is outside -180..=180")]
    InvalidLongitude(f64),

    #[error("Zoom level {0} exceeds maximum {MAX_ZOOM}")]
    InvalidZoom(u8),
}

/// A Web Mercator XYZ tile address.
///
/// - `x`: column, 0 to 2^zoom - 1, west to east
/// - `y`: row, 0 to 2^zoom - 1, north to south
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, zoom: u8) -> Self {
        Self { x, y, zoom }
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// A WGS84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl std::fmt::Display for LatLon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.5}, {:.5}", self.lat, self.lon)
    }
}

/// Geographic bounding box.
///
/// Bounds are inclusive on every edge, so a marker sitting exactly on the
/// viewport edge is considered visible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoBounds {
    /// Minimum (southernmost) latitude
    pub min_lat: f64,
    /// Maximum (northernmost) latitude
    pub max_lat: f64,
    /// Minimum (westernmost) longitude
    pub min_lon: f64,
    /// Maximum (easternmost) longitude
    pub max_lon: f64,
}

impl GeoBounds {
    /// Create a new bounding box.
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    /// Check whether a position lies inside the box.
    pub fn contains(&self, position: LatLon) -> bool {
        position.lat >= self.min_lat
            && position.lat <= self.max_lat
            && position.lon >= self.min_lon
            && position.lon <= self.max_lon
    }

    /// Grow the box by `margin` degrees on every side, clamped to the
    /// Web Mercator world.
    pub fn expanded(&self, margin: f64) -> Self {
        Self {
            min_lat: (self.min_lat - margin).max(MIN_LAT),
            max_lat: (self.max_lat + margin).min(MAX_LAT),
            min_lon: (self.min_lon - margin).max(MIN_LON),
            max_lon: (self.max_lon + margin).min(MAX_LON),
        }
    }

    /// Smallest box holding every point, or `None` for no points.
    pub fn enclosing(points: &[LatLon]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let start = Self::new(first.lat, first.lat, first.lon, first.lon);
        Some(rest.iter().fold(start, |b, p| Self {
            min_lat: b.min_lat.min(p.lat),
            max_lat: b.max_lat.max(p.lat),
            min_lon: b.min_lon.min(p.lon),
            max_lon: b.max_lon.max(p.lon),
        }))
    }

    /// Check whether two boxes overlap. Shared edges count as overlap.
    pub fn intersects(&self, other: &GeoBounds) -> bool {
        self.min_lat <= other.max_lat
            && other.min_lat <= self.max_lat
            && self.min_lon <= other.max_lon
            && other.min_lon <= self.max_lon
    }

    /// Centre point of the box.
    pub fn center(&self) -> LatLon {
        LatLon::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }
}
