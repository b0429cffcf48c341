//! Fallback tile command - render one offline tile to disk.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use trailmap::coord::{TileCoord, MAX_ZOOM, TILE_SIZE_PX};
use trailmap::fallback::synthesize_tile;

use crate::error::CliError;

/// Arguments for `trailmap fallback-tile`.
#[derive(Debug, Args)]
pub struct FallbackTileArgs {
    /// Zoom level
    pub z: u8,

    /// Tile column
    pub x: u32,

    /// Tile row
    pub y: u32,

    /// Output PNG path
    #[arg(short, long, default_value = "fallback.png")]
    pub output: PathBuf,

    /// Tile edge length in pixels
    #[arg(long, default_value_t = TILE_SIZE_PX)]
    pub size: u32,
}

/// Run the fallback-tile command.
pub fn run(args: FallbackTileArgs) -> Result<(), CliError> {
    let coord = validate(&args)?;
    let tile = synthesize_tile(coord);
    let png = tile.to_png(args.size)?;

    fs::write(&args.output, &png).map_err(|error| CliError::FileWrite {
        path: args.output.display().to_string(),
        error,
    })?;

    println!(
        "Wrote {:?} tile {} ({}x{} px, {} bytes) to {}",
        tile.style,
        coord,
        args.size,
        args.size,
        png.len(),
        args.output.display()
    );
    Ok(())
}

fn validate(args: &FallbackTileArgs) -> Result<TileCoord, CliError> {
    if args.z > MAX_ZOOM {
        return Err(CliError::Config(format!(
            "zoom {} is above the maximum of {}",
            args.z, MAX_ZOOM
        )));
    }
    let span = 1u64 << args.z;
    if u64::from(args.x) >= span || u64::from(args.y) >= span {
        return Err(CliError::Config(format!(
            "tile {}/{} does not exist at zoom {} (0..{})",
            args.x, args.y, args.z, span
        )));
    }
    Ok(TileCoord::new(args.x, args.y, args.z))
}
