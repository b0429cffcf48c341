//! Init command - write a commented configuration file.

use console::style;
use trailmap::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Run the init command.
///
/// An existing file is loaded and rewritten, so comments are refreshed but
/// settings are kept.
pub fn run() -> Result<(), CliError> {
    let path = config_file_path();
    let existed = path.exists();

    let config = ConfigFile::load()?;
    config.save()?;

    if existed {
        println!("Refreshed configuration file:");
    } else {
        println!("Created configuration file:");
    }
    println!("  {}", style(path.display()).cyan());
    println!();
    println!(
        "Providers are tried in file order; {} of them configured.",
        config.providers.len()
    );
    println!("Edit the [provider.<name>] sections to change the fallback chain.");
    Ok(())
}
