//! Procedural placeholder tiles for offline mode.
//!
//! Offline tiles carry no map data. They give the user a sense of scale and
//! position while routes and landmarks stay usable:
//!
//! | Zoom   | Style          | Look                                         |
//! |--------|----------------|----------------------------------------------|
//! | 0-6    | `Checker`      | pale blue checkerboard                       |
//! | 7-10   | `Bordered`     | pale green with a 2 px blue border           |
//! | 11+    | `FineBordered` | beige with a 1 px grey border                |
//!
//! Every tile also gets a small blue centre dot ringed in white.

use std::io::Cursor;
use std::sync::OnceLock;

use image::{ImageFormat, Rgba, RgbaImage};
use thiserror::Error;

use crate::coord::{TileCoord, TILE_SIZE_PX};

const OVERVIEW_BACKGROUND: Rgba<u8> = Rgba([0xf0, 0xf8, 0xff, 0xff]);
const OVERVIEW_CHECKER: Rgba<u8> = Rgba([0xe6, 0xf3, 0xff, 0xff]);
const REGION_BACKGROUND: Rgba<u8> = Rgba([0xe8, 0xf5, 0xe8, 0xff]);
const DETAIL_BACKGROUND: Rgba<u8> = Rgba([0xf5, 0xf5, 0xdc, 0xff]);
const ACCENT_BLUE: Rgba<u8> = Rgba([0x00, 0x78, 0xa8, 0xff]);
const DETAIL_BORDER: Rgba<u8> = Rgba([0xdd, 0xdd, 0xdd, 0xff]);
const WHITE: Rgba<u8> = Rgba([0xff, 0xff, 0xff, 0xff]);

/// Checker square side at 256 px.
const CHECKER_CELL_PX: f64 = 10.0;

/// Centre dot diameter and ring width at 256 px.
const DOT_DIAMETER_PX: f64 = 4.0;
const DOT_RING_PX: f64 = 1.0;

/// Highest zoom drawn with the checker overview.
pub const CHECKER_MAX_ZOOM: u8 = 6;

/// Highest zoom drawn with the thick regional border.
pub const BORDERED_MAX_ZOOM: u8 = 10;

static ERROR_TILE: OnceLock<Vec<u8>> = OnceLock::new();

/// Errors rasterising a fallback tile.
#[derive(Debug, Error)]
pub enum FallbackError {
    #[error("Tile size must be at least 1 pixel")]
    EmptySize,

    #[error("Failed to encode tile as PNG: {0}")]
    Encode(#[from] image::ImageError),
}

/// Visual style bucket of a fallback tile, chosen by zoom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileStyle {
    Checker,
    Bordered,
    FineBordered,
}

impl TileStyle {
    pub fn for_zoom(zoom: u8) -> Self {
        if zoom <= CHECKER_MAX_ZOOM {
            TileStyle::Checker
        } else if zoom <= BORDERED_MAX_ZOOM {
            TileStyle::Bordered
        } else {
            TileStyle::FineBordered
        }
    }

    pub fn background(&self) -> Rgba<u8> {
        match self {
            TileStyle::Checker => OVERVIEW_BACKGROUND,
            TileStyle::Bordered => REGION_BACKGROUND,
            TileStyle::FineBordered => DETAIL_BACKGROUND,
        }
    }

    /// Border colour and width at 256 px, if the style has one.
    pub fn border(&self) -> Option<(Rgba<u8>, u32)> {
        match self {
            TileStyle::Checker => None,
            TileStyle::Bordered => Some((ACCENT_BLUE, 2)),
            TileStyle::FineBordered => Some((DETAIL_BORDER, 1)),
        }
    }
}

/// Description of one synthesized tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackTile {
    pub coord: TileCoord,
    pub style: TileStyle,
}

impl FallbackTile {
    /// Draw the tile at `size` × `size` pixels.
    ///
    /// Pixel measurements are defined at 256 px and scaled, with borders and
    /// the dot never thinner than one pixel.
    pub fn render(&self, size: u32) -> RgbaImage {
        let scale = size as f64 / TILE_SIZE_PX as f64;
        let mut image = RgbaImage::from_pixel(size, size, self.style.background());

        if self.style == TileStyle::Checker {
            let cell = (CHECKER_CELL_PX * scale).max(1.0);
            for (x, y, pixel) in image.enumerate_pixels_mut() {
                let cx = (x as f64 / cell) as u64;
                let cy = (y as f64 / cell) as u64;
                if (cx + cy) % 2 == 1 {
                    *pixel = OVERVIEW_CHECKER;
                }
            }
        }

        if let Some((color, width)) = self.style.border() {
            let width = ((width as f64 * scale).round() as u32).max(1);
            for (x, y, pixel) in image.enumerate_pixels_mut() {
                if x < width || y < width || x >= size - width || y >= size - width {
                    *pixel = color;
                }
            }
        }

        let centre = size as f64 / 2.0;
        let dot = (DOT_DIAMETER_PX / 2.0 * scale).max(0.5);
        let ring = dot + (DOT_RING_PX * scale).max(0.5);
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            let dx = x as f64 + 0.5 - centre;
            let dy = y as f64 + 0.5 - centre;
            let distance = (dx * dx + dy * dy).sqrt();
            if distance <= dot {
                *pixel = ACCENT_BLUE;
            } else if distance <= ring {
                *pixel = WHITE;
            }
        }

        image
    }

    /// Draw the tile and encode it as PNG.
    pub fn to_png(&self, size: u32) -> Result<Vec<u8>, FallbackError> {
        if size == 0 {
            return Err(FallbackError::EmptySize);
        }
        encode_png(&self.render(size))
    }
}

/// Describe the offline tile at `coord`.
///
/// Pure: the same coordinate always yields the same tile.
pub fn synthesize_tile(coord: TileCoord) -> FallbackTile {
    FallbackTile {
        coord,
        style: TileStyle::for_zoom(coord.zoom),
    }
}

/// A 1×1 transparent PNG, substituted for tiles that failed to load.
///
/// # Panics
///
/// Panics on first access if a single transparent pixel cannot be encoded,
/// which only happens if the PNG encoder is compiled out.
pub fn error_tile() -> &'static [u8] {
    ERROR_TILE.get_or_init(|| {
        let pixel = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 0]));
        encode_png(&pixel).expect("PNG encoding of a single pixel cannot fail")
    })
}

fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, FallbackError> {
    let mut cursor = Cursor::new(Vec::new());
    image.write_to(&mut cursor, ImageFormat::Png)?;
    Ok(cursor.into_inner())
}
