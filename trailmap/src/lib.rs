//! Trailmap - resilient map tiles and marker rendering for Hong Kong trails
//!
//! This library keeps a trail map usable when tile providers misbehave and
//! keeps marker rendering cheap while the user pans and zooms.
//!
//! - [`controller`] walks an ordered list of tile providers, counting
//!   errors against each provider's tolerance and switching after a delay,
//!   until it ends on an offline layer that never fails.
//! - [`fallback`] synthesizes that offline layer and places landmark
//!   markers so the map still orients the user.
//! - [`viewport`] debounces pan/zoom bursts, attaches only the markers in
//!   view and picks icon detail from the zoom level.
//! - [`session`] ties both together around one [`map::MapView`], and
//!   [`runtime`] drives a session from a tokio task.
//!
//! # Example
//!
//! ```ignore
//! use trailmap::config::ConfigFile;
//! use trailmap::runtime::MapRuntime;
//!
//! let config = ConfigFile::load()?;
//! let handle = MapRuntime::spawn(|ctx| build_session(&config, ctx));
//! handle.send(MapEvent::ViewportChanged)?;
//! let status = handle.status();
//! ```

pub mod config;
pub mod controller;
pub mod coord;
pub mod event;
pub mod fallback;
pub mod logging;
pub mod map;
pub mod notify;
pub mod provider;
pub mod runtime;
pub mod session;
pub mod telemetry;
pub mod timer;
pub mod viewport;
