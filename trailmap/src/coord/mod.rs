//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude),
//! Web Mercator tile addresses, and viewport bounds derived from a map
//! centre and pixel size.

mod types;

pub use types::{
    CoordError, GeoBounds, LatLon, TileCoord, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON,
    MIN_ZOOM, TILE_SIZE_PX,
};

use std::f64::consts::PI;

/// Upper bound on the tiles returned by [`tiles_covering`].
pub const MAX_COVERING_TILES: usize = 64;

/// Converts geographic coordinates to tile coordinates.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees (-85.05112878 to 85.05112878)
/// * `lon` - Longitude in degrees (-180.0 to 180.0)
/// * `zoom` - Zoom level (0 to 22)
#[inline]
pub fn to_tile_coords(lat: f64, lon: f64, zoom: u8) -> Result<TileCoord, CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let n = 2.0_f64.powi(zoom as i32);
    let max_index = (n as u32).saturating_sub(1);

    let x = (((lon + 180.0) / 360.0 * n) as u32).min(max_index);

    let lat_rad = lat.to_radians();
    let y = (((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n) as u32).min(max_index);

    Ok(TileCoord { x, y, zoom })
}

/// Converts tile coordinates back to geographic coordinates.
///
/// Returns the latitude/longitude of the tile's northwest corner.
#[inline]
pub fn tile_to_lat_lon(tile: &TileCoord) -> LatLon {
    let n = 2.0_f64.powi(tile.zoom as i32);
    let lon = tile.x as f64 / n * 360.0 - 180.0;
    let y = tile.y as f64 / n;
    let lat = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();
    LatLon::new(lat, lon)
}

/// Computes the geographic bounds of a viewport.
///
/// The viewport is `width_px` × `height_px` screen pixels centred on
/// `center` at the given zoom, using 256-pixel tiles.
pub fn viewport_bounds(center: LatLon, zoom: u8, width_px: u32, height_px: u32) -> GeoBounds {
    let world = TILE_SIZE_PX as f64 * 2.0_f64.powi(zoom as i32);
    let lat = center.lat.clamp(MIN_LAT, MAX_LAT);

    let cx = (center.lon + 180.0) / 360.0 * world;
    let cy = (1.0 - lat.to_radians().tan().asinh() / PI) / 2.0 * world;

    let half_w = width_px as f64 / 2.0;
    let half_h = height_px as f64 / 2.0;

    let to_lon = |px: f64| (px / world * 360.0 - 180.0).clamp(MIN_LON, MAX_LON);
    let to_lat = |py: f64| {
        let py = py.clamp(0.0, world);
        (PI * (1.0 - 2.0 * py / world)).sinh().atan().to_degrees()
    };

    GeoBounds::new(
        to_lat(cy + half_h),
        to_lat(cy - half_h),
        to_lon(cx - half_w),
        to_lon(cx + half_w),
    )
}

/// Lists the tiles at `zoom` that intersect `bounds`, north-west first.
///
/// The result is capped at [`MAX_COVERING_TILES`] so a careless zoom level
/// cannot produce an unbounded request burst.
pub fn tiles_covering(bounds: &GeoBounds, zoom: u8) -> Result<Vec<TileCoord>, CoordError> {
    let north_west = to_tile_coords(bounds.max_lat, bounds.min_lon, zoom)?;
    let south_east = to_tile_coords(bounds.min_lat, bounds.max_lon, zoom)?;

    let mut tiles = Vec::new();
    'rows: for y in north_west.y..=south_east.y {
        for x in north_west.x..=south_east.x {
            if tiles.len() == MAX_COVERING_TILES {
                break 'rows;
            }
            tiles.push(TileCoord::new(x, y, zoom));
        }
    }
    Ok(tiles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_victoria_harbour_at_zoom_16() {
        let tile = to_tile_coords(22.3193, 114.1694, 16).unwrap();
        assert_eq!(tile.zoom, 16);
        assert_eq!(tile.x, 53551);
        assert_eq!(tile.y, 28598);
    }

    #[test]
    fn test_invalid_latitude() {
        let result = to_tile_coords(90.0, 0.0, 10);
        assert!(matches!(result, Err(CoordError::InvalidLatitude(_))));
    }

    #[test]
    fn test_invalid_zoom() {
        let result = to_tile_coords(22.3, 114.1, 23);
        assert!(matches!(result, Err(CoordError::InvalidZoom(23))));
    }

    #[test]
    fn test_tile_to_lat_lon_at_equator() {
        let corner = tile_to_lat_lon(&TileCoord::new(512, 512, 10));
        assert!(corner.lat.abs() < 1.0, "Should be near equator");
        assert!(corner.lon.abs() < 1.0, "Should be near prime meridian");
    }

    #[test]
    fn test_roundtrip_stays_within_one_tile() {
        let tile = to_tile_coords(22.2711, 114.1492, 16).unwrap();
        let corner = tile_to_lat_lon(&tile);
        assert!((corner.lat - 22.2711).abs() < 0.01);
        assert!((corner.lon - 114.1492).abs() < 0.01);
    }

    #[test]
    fn test_viewport_bounds_contains_center() {
        let center = LatLon::new(22.3, 114.17);
        let bounds = viewport_bounds(center, 14, 1024, 768);
        assert!(bounds.contains(center));
        assert!(bounds.min_lat < bounds.max_lat);
        assert!(bounds.min_lon < bounds.max_lon);
    }

    #[test]
    fn test_viewport_bounds_shrink_with_zoom() {
        let center = LatLon::new(22.3, 114.17);
        let wide = viewport_bounds(center, 10, 1024, 768);
        let narrow = viewport_bounds(center, 16, 1024, 768);
        let wide_span = wide.max_lon - wide.min_lon;
        let narrow_span = narrow.max_lon - narrow.min_lon;
        assert!((wide_span / narrow_span - 64.0).abs() < 0.001);
    }

    #[test]
    fn test_expanded_bounds_clamped_to_world() {
        let bounds = GeoBounds::new(84.0, 85.0, 179.5, 180.0).expanded(1.0);
        assert_eq!(bounds.max_lat, MAX_LAT);
        assert_eq!(bounds.max_lon, MAX_LON);
        assert_eq!(bounds.min_lat, 83.0);
    }

    #[test]
    fn test_bounds_edges_are_inclusive() {
        let bounds = GeoBounds::new(22.0, 23.0, 114.0, 115.0);
        assert!(bounds.contains(LatLon::new(22.0, 114.0)));
        assert!(bounds.contains(LatLon::new(23.0, 115.0)));
        assert!(!bounds.contains(LatLon::new(23.0001, 114.5)));
    }

    #[test]
    fn test_enclosing_bounds_of_path() {
        let path = [
            LatLon::new(22.27, 114.15),
            LatLon::new(22.25, 114.19),
            LatLon::new(22.29, 114.16),
        ];
        let bounds = GeoBounds::enclosing(&path).unwrap();
        assert_eq!(bounds, GeoBounds::new(22.25, 22.29, 114.15, 114.19));
        assert!(GeoBounds::enclosing(&[]).is_none());
    }

    #[test]
    fn test_intersects_includes_touching_edges() {
        let a = GeoBounds::new(22.0, 23.0, 114.0, 115.0);
        assert!(a.intersects(&GeoBounds::new(22.5, 24.0, 114.5, 116.0)));
        assert!(a.intersects(&GeoBounds::new(23.0, 24.0, 115.0, 116.0)));
        assert!(!a.intersects(&GeoBounds::new(23.1, 24.0, 114.0, 115.0)));
        assert!(!a.intersects(&GeoBounds::new(22.0, 23.0, 115.1, 116.0)));
    }

    #[test]
    fn test_tiles_covering_small_viewport() {
        let bounds = viewport_bounds(LatLon::new(22.3, 114.17), 12, 512, 512);
        let tiles = tiles_covering(&bounds, 12).unwrap();
        assert!(!tiles.is_empty());
        assert!(tiles.len() <= 9);
        assert!(tiles.iter().all(|t| t.zoom == 12));
    }

    #[test]
    fn test_tiles_covering_is_capped() {
        let bounds = GeoBounds::new(-60.0, 60.0, -170.0, 170.0);
        let tiles = tiles_covering(&bounds, 10).unwrap();
        assert_eq!(tiles.len(), MAX_COVERING_TILES);
    }
}
