//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::coord::MAX_ZOOM;
use crate::provider::{ProviderRegistry, ProviderRole, TileProvider, DEFAULT_SUBDOMAINS};

/// Prefix of per-provider section names.
pub(super) const PROVIDER_SECTION_PREFIX: &str = "provider.";

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [controller] section
    if let Some(section) = ini.section(Some("controller")) {
        if let Some(v) = section.get("primary_switch_delay_ms") {
            config.controller.primary_switch_delay = millis("controller", "primary_switch_delay_ms", v)?;
        }
        if let Some(v) = section.get("backup_switch_delay_ms") {
            config.controller.backup_switch_delay = millis("controller", "backup_switch_delay_ms", v)?;
        }
        if let Some(v) = section.get("error_suppression_secs") {
            let secs: u64 = parse("controller", "error_suppression_secs", v, "must be a whole number of seconds")?;
            config.controller.error_suppression = Duration::from_secs(secs);
        }
        config
            .controller
            .validate()
            .map_err(|e| ConfigFileError::InvalidValue {
                section: "controller".to_string(),
                key: "primary_switch_delay_ms".to_string(),
                value: config.controller.primary_switch_delay.as_millis().to_string(),
                reason: e.to_string(),
            })?;
    }

    // [viewport] section
    if let Some(section) = ini.section(Some("viewport")) {
        if let Some(v) = section.get("debounce_ms") {
            config.viewport.debounce = millis("viewport", "debounce_ms", v)?;
        }
        if let Some(v) = section.get("preload_debounce_ms") {
            config.viewport.preload_debounce = millis("viewport", "preload_debounce_ms", v)?;
        }
        if let Some(v) = section.get("low_zoom") {
            config.viewport.low_zoom = zoom("viewport", "low_zoom", v)?;
        }
        if let Some(v) = section.get("high_detail_zoom") {
            config.viewport.high_detail_zoom = zoom("viewport", "high_detail_zoom", v)?;
        }
        if let Some(v) = section.get("preload_margin_deg") {
            let margin: f64 = parse("viewport", "preload_margin_deg", v, "must be a number of degrees")?;
            if !(0.0..=1.0).contains(&margin) {
                return Err(invalid("viewport", "preload_margin_deg", v, "must be between 0 and 1 degree"));
            }
            config.viewport.preload_margin = margin;
        }
        if let Some(v) = section.get("show_routes") {
            config.viewport.show_routes = parse("viewport", "show_routes", v, "must be true or false")?;
        }
        if config.viewport.high_detail_zoom < config.viewport.low_zoom {
            return Err(invalid(
                "viewport",
                "high_detail_zoom",
                &config.viewport.high_detail_zoom.to_string(),
                "must not be below low_zoom",
            ));
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    // [provider.<name>] sections, in file order
    let providers = ini
        .iter()
        .filter_map(|(name, props)| {
            let name = name?.strip_prefix(PROVIDER_SECTION_PREFIX)?;
            Some(parse_provider(name, props))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if !providers.is_empty() {
        ProviderRegistry::new(providers.clone()).map_err(|e| ConfigFileError::InvalidValue {
            section: "provider".to_string(),
            key: "url".to_string(),
            value: String::new(),
            reason: e.to_string(),
        })?;
        config.providers = providers;
    }

    Ok(config)
}

fn parse_provider(name: &str, props: &Properties) -> Result<TileProvider, ConfigFileError> {
    let section = format!("{PROVIDER_SECTION_PREFIX}{name}");

    let url = props.get("url").ok_or_else(|| ConfigFileError::MissingKey {
        section: section.clone(),
        key: "url".to_string(),
    })?;
    let role = match props.get("role") {
        Some(v) => ProviderRole::from_str(v).map_err(|reason| invalid(&section, "role", v, &reason))?,
        None => ProviderRole::Backup,
    };

    let mut provider = TileProvider::new(name, url.trim(), role);

    if let Some(v) = props.get("attribution") {
        provider = provider.with_attribution(v.trim());
    }
    if let Some(v) = props.get("max_zoom") {
        provider = provider.with_max_zoom(zoom(&section, "max_zoom", v)?);
    }
    if let Some(v) = props.get("error_tolerance") {
        provider = provider.with_error_tolerance(parse(
            &section,
            "error_tolerance",
            v,
            "must be a non-negative integer",
        )?);
    }
    if let Some(v) = props.get("timeout_ms") {
        provider = provider.with_timeout(millis(&section, "timeout_ms", v)?);
    }
    if let Some(v) = props.get("subdomains") {
        let subdomains: Vec<&str> = v
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        provider = if subdomains.is_empty() {
            provider.with_subdomains(DEFAULT_SUBDOMAINS.iter().copied())
        } else {
            provider.with_subdomains(subdomains)
        };
    }

    Ok(provider)
}

fn parse<T: FromStr>(section: &str, key: &str, value: &str, reason: &str) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

fn millis(section: &str, key: &str, value: &str) -> Result<Duration, ConfigFileError> {
    parse::<u64>(section, key, value, "must be a whole number of milliseconds")
        .map(Duration::from_millis)
}

fn zoom(section: &str, key: &str, value: &str) -> Result<u8, ConfigFileError> {
    let reason = format!("must be a zoom level between 0 and {MAX_ZOOM}");
    let zoom: u8 = parse(section, key, value, &reason)?;
    if zoom > MAX_ZOOM {
        return Err(invalid(section, key, value, &reason));
    }
    Ok(zoom)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

pub(super) fn expand_tilde(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}
