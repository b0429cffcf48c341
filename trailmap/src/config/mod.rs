//! User configuration in `~/.trailmap/config.ini`.
//!
//! The file has one section per component plus one `[provider.<name>]`
//! section per tile provider, in fallback order:
//!
//! ```ini
//! [controller]
//! primary_switch_delay_ms = 1500
//! backup_switch_delay_ms = 500
//! error_suppression_secs = 10
//!
//! [viewport]
//! debounce_ms = 50
//! low_zoom = 12
//!
//! [provider.osm]
//! url = https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png
//! role = primary
//! error_tolerance = 3
//! ```
//!
//! Missing sections and keys fall back to the built-in defaults. When no
//! provider section is present the Hong Kong default chain is used.

mod file;
mod keys;
mod parser;
mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use keys::{ConfigKey, ConfigKeyError};
pub use settings::{default_log_file, ConfigFile, LoggingSettings};
