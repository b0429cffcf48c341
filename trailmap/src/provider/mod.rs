//! Tile provider configuration and lookup.
//!
//! A [`TileProvider`] is an immutable description of one tile source; the
//! [`ProviderRegistry`] holds them in fallback order.
//!
//! ```
//! use trailmap::provider::{ProviderRegistry, ProviderRole};
//!
//! let registry = ProviderRegistry::hong_kong();
//! assert_eq!(registry.get(0).unwrap().role, ProviderRole::Primary);
//! assert!(registry.get(3).is_err());
//! ```

mod defaults;
mod http;
mod registry;
mod types;

pub use defaults::{carto_light, hong_kong_defaults, offline_sentinel, openstreetmap};
pub use http::{HttpClient, HttpError, ReqwestClient};
pub use registry::{ProviderRegistry, RegistryError};
pub use types::{
    ProviderRole, TileProvider, DEFAULT_MAX_ZOOM, DEFAULT_PROVIDER_TIMEOUT, DEFAULT_SUBDOMAINS,
};

#[cfg(test)]
pub use http::tests::MockHttpClient;
