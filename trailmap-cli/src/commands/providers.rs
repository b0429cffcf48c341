//! Providers command - show the configured fallback chain.

use console::style;
use trailmap::config::ConfigFile;
use trailmap::provider::ProviderRole;

use crate::error::CliError;

/// Run the providers command.
pub fn run() -> Result<(), CliError> {
    let config = ConfigFile::load()?;
    let registry = config.registry()?;

    println!("{}", style("Tile provider chain").bold().underlined());
    println!();

    for (index, provider) in registry.iter().enumerate() {
        let role = match provider.role {
            ProviderRole::Primary => style(provider.role.as_str()).green(),
            ProviderRole::Backup => style(provider.role.as_str()).yellow(),
            ProviderRole::Offline => style(provider.role.as_str()).cyan(),
        };
        println!("  [{}] {} ({})", index, style(&provider.name).bold(), role);

        if provider.is_offline() {
            println!("      synthesized locally, never fails");
            continue;
        }
        println!("      url:        {}", provider.url_template);
        println!(
            "      tolerance:  {} error(s), first tile within {} ms",
            provider.error_tolerance,
            provider.timeout.as_millis()
        );
        println!("      max zoom:   {}", provider.max_zoom);
        if !provider.attribution.is_empty() {
            println!("      attribution: {}", provider.attribution);
        }
    }

    let controller = &config.controller;
    println!();
    println!(
        "Switch delay: {} ms after a primary, {} ms after a backup",
        controller.primary_switch_delay.as_millis(),
        controller.backup_switch_delay.as_millis()
    );
    println!(
        "Repeated failures of one URL count once per {} s",
        controller.error_suppression.as_secs()
    );

    Ok(())
}
