//! Probe command - run the provider chain against real tile servers.
//!
//! Builds a full map session around a headless view of the requested area,
//! fetches the tiles covering it from the configured providers and reports
//! where the chain settled: a network provider, or offline mode.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use console::style;
use tokio::runtime::Handle;
use trailmap::config::ConfigFile;
use trailmap::coord::{tiles_covering, viewport_bounds, LatLon, TileCoord};
use trailmap::event::MapEvent;
use trailmap::map::{HeadlessMap, HttpTileLayer, TileStore};
use trailmap::notify::TracingNotifier;
use trailmap::provider::ReqwestClient;
use trailmap::runtime::{MapRuntime, MapStatus};
use trailmap::session::MapSession;

use crate::error::CliError;

/// Viewport size used for the probe, in pixels.
const PROBE_VIEWPORT_PX: (u32, u32) = (1024, 768);

/// Arguments for `trailmap probe`.
#[derive(Debug, Args)]
pub struct ProbeArgs {
    /// Latitude of the view centre in decimal degrees
    #[arg(long, default_value_t = 22.2816)]
    pub lat: f64,

    /// Longitude of the view centre in decimal degrees
    #[arg(long, default_value_t = 114.1583)]
    pub lon: f64,

    /// Zoom level
    #[arg(long, default_value_t = 14)]
    pub zoom: u8,

    /// Give up waiting after this many seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Keep fetching for this long after the first tile arrives
    #[arg(long, default_value_t = 1000)]
    pub settle_ms: u64,

    /// Print the final status as JSON
    #[arg(long)]
    pub json: bool,

    /// Write every fetched tile into this directory
    #[arg(long)]
    pub save_tiles: Option<PathBuf>,
}

/// Run the probe command.
pub fn run(args: ProbeArgs) -> Result<(), CliError> {
    // The blocking client owns its own runtime and must be dropped outside
    // of ours, so it is created first and outlives `runtime`.
    let client = Arc::new(ReqwestClient::new()?);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(e.to_string()))?;
    runtime.block_on(probe(args, Arc::clone(&client)))
}

async fn probe(args: ProbeArgs, client: Arc<ReqwestClient>) -> Result<(), CliError> {
    let config = ConfigFile::load()?;
    let registry = config.registry()?;

    let center = LatLon::new(args.lat, args.lon);
    let (width, height) = PROBE_VIEWPORT_PX;
    let bounds = viewport_bounds(center, args.zoom, width, height);
    let tiles = tiles_covering(&bounds, args.zoom)?;

    tracing::info!(
        lat = args.lat,
        lon = args.lon,
        zoom = args.zoom,
        tiles = tiles.len(),
        providers = registry.len(),
        "Probing tile providers"
    );

    let mut store: Option<TileStore> = None;
    let handle = MapRuntime::spawn(|context| {
        let layer = HttpTileLayer::new(client, context.events.clone(), Handle::current())
            .with_tiles(tiles);
        store = Some(layer.store());
        MapSession::new(
            registry,
            config.session_config(),
            Box::new(layer),
            HeadlessMap::with_size(center, args.zoom, width, height),
            Arc::clone(&context.timer),
            Arc::new(TracingNotifier),
        )
    });
    let store = store.unwrap_or_default();

    // Let the scheduler see the initial view so neighbouring tiles preload.
    handle.send(MapEvent::ViewportChanged)?;

    let settled = tokio::time::timeout(
        Duration::from_secs(args.timeout_secs),
        handle.wait_for(|status| status.is_ready || status.is_offline),
    )
    .await;
    if settled.is_err() {
        tracing::warn!(timeout_secs = args.timeout_secs, "No provider settled before timeout");
    }
    tokio::time::sleep(Duration::from_millis(args.settle_ms)).await;

    let status = handle.status();
    handle.shutdown().await?;

    if let Some(dir) = &args.save_tiles {
        let saved = save_tiles(&store, dir)?;
        tracing::info!(saved, dir = %dir.display(), "Saved fetched tiles");
    }

    if args.json {
        let json = serde_json::to_string_pretty(&status)
            .map_err(|e| CliError::Runtime(e.to_string()))?;
        println!("{}", json);
    } else {
        print_status(&status, store.len());
    }
    Ok(())
}

fn print_status(status: &MapStatus, stored: usize) {
    let outcome = if status.is_offline {
        style("offline mode").yellow().bold()
    } else if status.is_ready {
        style("ready").green().bold()
    } else {
        style("still loading").red().bold()
    };

    println!("{} {}", style("Result:").bold(), outcome);
    println!(
        "  provider: [{}] {}",
        status.provider_index,
        status.provider.as_deref().unwrap_or("-")
    );
    println!("  state:    {}", status.state);
    println!("  tiles:    {} stored", stored);
    println!(
        "  view:     {:.4}, {:.4} @ z{}",
        status.metrics.center.lat, status.metrics.center.lon, status.metrics.zoom
    );
    println!();
    println!("{}", status.telemetry);
}

/// Write stored tiles as `<z>-<x>-<y>.png`, returning how many were written.
fn save_tiles(store: &TileStore, dir: &Path) -> Result<usize, CliError> {
    let write_error = |path: &Path, error| CliError::FileWrite {
        path: path.display().to_string(),
        error,
    };

    fs::create_dir_all(dir).map_err(|e| write_error(dir, e))?;
    let tiles = store.snapshot();
    for (coord, bytes) in &tiles {
        let path = dir.join(tile_file_name(coord));
        fs::write(&path, bytes).map_err(|e| write_error(&path, e))?;
    }
    Ok(tiles.len())
}

fn tile_file_name(coord: &TileCoord) -> String {
    format!("{}-{}-{}.png", coord.zoom, coord.x, coord.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_file_name() {
        assert_eq!(tile_file_name(&TileCoord::new(3345, 1785, 12)), "12-3345-1785.png");
    }

    #[test]
    fn test_save_empty_store_creates_directory() {
        let temp = tempfile::TempDir::new().unwrap();
        let dir = temp.path().join("tiles");

        let saved = save_tiles(&TileStore::default(), &dir).unwrap();

        assert_eq!(saved, 0);
        assert!(dir.is_dir());
    }
}
