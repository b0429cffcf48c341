//! Tile provider configuration types.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::coord::TileCoord;

/// Default watchdog for a provider that neither loads nor fails a tile.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Default tile zoom ceiling when a provider does not declare one.
pub const DEFAULT_MAX_ZOOM: u8 = 19;

/// Subdomains substituted for `{s}` when a provider does not declare its own.
pub const DEFAULT_SUBDOMAINS: [&str; 3] = ["a", "b", "c"];

/// Where a provider sits in the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderRole {
    /// Preferred network source.
    Primary,
    /// Network source used after the primary has been abandoned.
    Backup,
    /// Sentinel entry; reaching it switches straight to synthesized tiles.
    Offline,
}

impl ProviderRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderRole::Primary => "primary",
            ProviderRole::Backup => "backup",
            ProviderRole::Offline => "offline",
        }
    }
}

impl fmt::Display for ProviderRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "primary" => Ok(ProviderRole::Primary),
            "backup" => Ok(ProviderRole::Backup),
            "offline" => Ok(ProviderRole::Offline),
            other => Err(format!(
                "unknown provider role '{}' (expected primary, backup or offline)",
                other
            )),
        }
    }
}

/// Immutable configuration of one map-tile source.
///
/// Built once at startup and never mutated afterwards. The URL template uses
/// the usual slippy-map placeholders:
///
/// - `{z}`, `{x}`, `{y}` - tile address
/// - `{s}` - subdomain, rotated by `(x + y) % subdomains.len()`
/// - `{r}` - retina suffix, always expanded to an empty string
///
/// # Example
///
/// ```
/// use trailmap::coord::TileCoord;
/// use trailmap::provider::{ProviderRole, TileProvider};
///
/// let osm = TileProvider::new(
///     "osm",
///     "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
///     ProviderRole::Primary,
/// )
/// .with_error_tolerance(3);
///
/// assert_eq!(
///     osm.tile_url(TileCoord::new(1, 1, 2)),
///     "https://c.tile.openstreetmap.org/2/1/1.png"
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TileProvider {
    pub name: String,
    pub url_template: String,
    pub attribution: String,
    pub max_zoom: u8,
    /// Tile errors tolerated before the controller abandons this provider.
    pub error_tolerance: u32,
    pub role: ProviderRole,
    /// Time allowed for the first tile to arrive before it counts as an error.
    pub timeout: Duration,
    pub subdomains: Vec<String>,
}

impl TileProvider {
    /// Create a provider with default tolerance (0), zoom ceiling and timeout.
    pub fn new(name: impl Into<String>, url_template: impl Into<String>, role: ProviderRole) -> Self {
        Self {
            name: name.into(),
            url_template: url_template.into(),
            attribution: String::new(),
            max_zoom: DEFAULT_MAX_ZOOM,
            error_tolerance: 0,
            role,
            timeout: DEFAULT_PROVIDER_TIMEOUT,
            subdomains: DEFAULT_SUBDOMAINS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_attribution(mut self, attribution: impl Into<String>) -> Self {
        self.attribution = attribution.into();
        self
    }

    pub fn with_max_zoom(mut self, max_zoom: u8) -> Self {
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_error_tolerance(mut self, error_tolerance: u32) -> Self {
        self.error_tolerance = error_tolerance;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_subdomains<I, S>(mut self, subdomains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subdomains = subdomains.into_iter().map(Into::into).collect();
        self
    }

    /// Whether this entry is the offline sentinel.
    pub fn is_offline(&self) -> bool {
        self.role == ProviderRole::Offline
    }

    /// Check if the provider serves the given zoom level.
    pub fn supports_zoom(&self, zoom: u8) -> bool {
        zoom <= self.max_zoom
    }

    /// Expand the URL template for a tile.
    pub fn tile_url(&self, tile: TileCoord) -> String {
        let subdomain = if self.subdomains.is_empty() {
            ""
        } else {
            let idx = ((tile.x as u64 + tile.y as u64) % self.subdomains.len() as u64) as usize;
            self.subdomains[idx].as_str()
        };

        self.url_template
            .replace("{s}", subdomain)
            .replace("{z}", &tile.zoom.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string())
            .replace("{r}", "")
    }

    /// Names of the mandatory `{z}`/`{x}`/`{y}` placeholders missing from the template.
    pub(crate) fn missing_placeholders(&self) -> Vec<&'static str> {
        ["{z}", "{x}", "{y}"]
            .into_iter()
            .filter(|p| !self.url_template.contains(p))
            .collect()
    }
}
