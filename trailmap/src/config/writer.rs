//! INI serialization logic for converting `ConfigFile` → INI string.

use std::fmt::Write;
use std::path::Path;

use super::parser::PROVIDER_SECTION_PREFIX;
use super::settings::ConfigFile;
use crate::provider::TileProvider;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let mut out = format!(
        r#"[controller]
; Delay before abandoning the primary tile provider after it exceeds its
; error tolerance (default: 1500). Must be longer than the backup delay.
primary_switch_delay_ms = {}
; Delay before abandoning a backup provider (default: 500)
backup_switch_delay_ms = {}
; A failing tile URL is counted once within this window (default: 10)
error_suppression_secs = {}

[viewport]
; Quiet period after panning or zooming before markers are re-rendered (default: 50)
debounce_ms = {}
; Quiet period before tiles around the viewport are preloaded (default: 200)
preload_debounce_ms = {}
; Route markers are hidden below this zoom (default: 12)
low_zoom = {}
; Route markers use detailed icons at or above this zoom (default: 15)
high_detail_zoom = {}
; Margin in degrees added around the viewport when preloading (default: 0.01)
preload_margin_deg = {}
; Draw route paths with start and end markers (default: true)
show_routes = {}

[logging]
; Log file location (default: ~/.trailmap/trailmap.log)
file = {}

; Tile providers, tried in the order listed. Each section is named
; provider.<name>. Roles: primary, backup, offline. An offline provider is
; never fetched; reaching it switches the map to generated offline tiles.
"#,
        config.controller.primary_switch_delay.as_millis(),
        config.controller.backup_switch_delay.as_millis(),
        config.controller.error_suppression.as_secs(),
        config.viewport.debounce.as_millis(),
        config.viewport.preload_debounce.as_millis(),
        config.viewport.low_zoom,
        config.viewport.high_detail_zoom,
        config.viewport.preload_margin,
        config.viewport.show_routes,
        path_to_string(&config.logging.file),
    );

    for provider in &config.providers {
        write_provider(&mut out, provider);
    }
    out
}

fn write_provider(out: &mut String, provider: &TileProvider) {
    // Writing to a String cannot fail.
    let _ = write!(
        out,
        "\n[{}{}]\nurl = {}\nrole = {}\nattribution = {}\nmax_zoom = {}\nerror_tolerance = {}\ntimeout_ms = {}\nsubdomains = {}\n",
        PROVIDER_SECTION_PREFIX,
        provider.name,
        provider.url_template,
        provider.role,
        provider.attribution,
        provider.max_zoom,
        provider.error_tolerance,
        provider.timeout.as_millis(),
        provider.subdomains.join(","),
    );
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
