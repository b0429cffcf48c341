//! Trailmap CLI - Command-line interface
//!
//! Inspect and exercise the trail map's tile provider chain without a
//! browser: list providers, probe real tile servers, render offline tiles
//! and edit the configuration file.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use trailmap::config::ConfigFile;
use trailmap::logging::{init_logging, LoggingGuard};

use commands::config::ConfigCommands;
use commands::fallback_tile::FallbackTileArgs;
use commands::probe::ProbeArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "trailmap")]
#[command(version, about = "Resilient map tiles for the Hong Kong trail map", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the configured tile provider chain
    Providers,

    /// Load a view from real tile servers and report where the chain settles
    Probe(ProbeArgs),

    /// Render one offline fallback tile to a PNG file
    FallbackTile(FallbackTileArgs),

    /// Create or refresh the configuration file
    Init,

    /// View or change configuration settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Providers => commands::providers::run(),
        Commands::Probe(args) => with_logging(|| commands::probe::run(args)),
        Commands::FallbackTile(args) => commands::fallback_tile::run(args),
        Commands::Init => commands::init::run(),
        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}

/// Run `f` with file and stderr logging set up from the config file.
fn with_logging<F>(f: F) -> Result<(), CliError>
where
    F: FnOnce() -> Result<(), CliError>,
{
    let config = ConfigFile::load()?;
    let _guard: LoggingGuard =
        init_logging(&config.logging.file).map_err(|e| CliError::LoggingInit(e.to_string()))?;
    f()
}
