//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use trailmap::config::ConfigFileError;
use trailmap::coord::CoordError;
use trailmap::fallback::FallbackError;
use trailmap::provider::{HttpError, RegistryError};
use trailmap::runtime::RuntimeError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Provider list is unusable
    Providers(RegistryError),
    /// Coordinates outside the map
    Coordinates(CoordError),
    /// Failed to create the HTTP client
    HttpClient(HttpError),
    /// Map session failed while probing
    Runtime(String),
    /// Failed to render a fallback tile
    Render(FallbackError),
    /// Failed to write output file
    FileWrite { path: String, error: std::io::Error },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Providers(_) | CliError::Config(_) => {
                eprintln!();
                eprintln!("Check the provider sections of your config file:");
                eprintln!("  trailmap config path");
                eprintln!("  trailmap providers");
            }
            CliError::HttpClient(_) => {
                eprintln!();
                eprintln!("The offline map still works without network access:");
                eprintln!("  trailmap fallback-tile <z> <x> <y> -o tile.png");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Providers(e) => write!(f, "Invalid provider list: {}", e),
            CliError::Coordinates(e) => write!(f, "Invalid coordinates: {}", e),
            CliError::HttpClient(e) => write!(f, "Failed to create HTTP client: {}", e),
            CliError::Runtime(msg) => write!(f, "Map session error: {}", msg),
            CliError::Render(e) => write!(f, "Failed to render tile: {}", e),
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path, error)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Providers(e) => Some(e),
            CliError::Coordinates(e) => Some(e),
            CliError::HttpClient(e) => Some(e),
            CliError::Render(e) => Some(e),
            CliError::FileWrite { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<RegistryError> for CliError {
    fn from(e: RegistryError) -> Self {
        CliError::Providers(e)
    }
}

impl From<CoordError> for CliError {
    fn from(e: CoordError) -> Self {
        CliError::Coordinates(e)
    }
}

impl From<HttpError> for CliError {
    fn from(e: HttpError) -> Self {
        CliError::HttpClient(e)
    }
}

impl From<RuntimeError> for CliError {
    fn from(e: RuntimeError) -> Self {
        CliError::Runtime(e.to_string())
    }
}

impl From<FallbackError> for CliError {
    fn from(e: FallbackError) -> Self {
        CliError::Render(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_write_message_names_path() {
        let err = CliError::FileWrite {
            path: "tile.png".to_string(),
            error: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "Failed to write file 'tile.png': denied");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_registry_error_converts() {
        let err: CliError = RegistryError::Empty.into();
        assert!(matches!(err, CliError::Providers(RegistryError::Empty)));
        assert_eq!(err.to_string(), "Invalid provider list: No tile providers configured");
    }
}
