//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (get, set, list, path)
//! - [`fallback_tile`] - Render one offline tile to a PNG
//! - [`init`] - Configuration initialization
//! - [`probe`] - Run the provider chain against real tile servers
//! - [`providers`] - Show the configured provider chain

pub mod config;
pub mod fallback_tile;
pub mod init;
pub mod probe;
pub mod providers;
