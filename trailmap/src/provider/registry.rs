//! Ordered, read-only provider list.

use thiserror::Error;

use super::types::TileProvider;

/// Errors raised while building or querying a [`ProviderRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No providers configured. A map cannot render without at least one
    /// entry, even if that entry is the offline sentinel.
    #[error("No tile providers configured")]
    Empty,

    /// Lookup past the end of the list.
    #[error("Provider index {index} out of range (registry has {len} providers)")]
    IndexOutOfRange { index: usize, len: usize },

    /// A network provider's URL template cannot address tiles.
    #[error("Provider '{name}' URL template is missing {missing}")]
    InvalidTemplate { name: String, missing: String },
}

/// Static, ordered list of tile providers.
///
/// Order is the fallback order: index 0 is tried first and the controller
/// only ever moves forward through the list.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    pub(super) providers: Vec<TileProvider>,
}

impl ProviderRegistry {
    /// Build a registry, validating every entry.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::Empty`] if `providers` is empty
    /// - [`RegistryError::InvalidTemplate`] if a network provider's template
    ///   lacks `{z}`, `{x}` or `{y}`
    pub fn new(providers: Vec<TileProvider>) -> Result<Self, RegistryError> {
        if providers.is_empty() {
            return Err(RegistryError::Empty);
        }

        for provider in providers.iter().filter(|p| !p.is_offline()) {
            let missing = provider.missing_placeholders();
            if !missing.is_empty() {
                return Err(RegistryError::InvalidTemplate {
                    name: provider.name.clone(),
                    missing: missing.join(", "),
                });
            }
        }

        Ok(Self { providers })
    }

    /// Look up a provider by position.
    pub fn get(&self, index: usize) -> Result<&TileProvider, RegistryError> {
        self.providers
            .get(index)
            .ok_or(RegistryError::IndexOutOfRange {
                index,
                len: self.providers.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Always `false` for a constructed registry.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TileProvider> {
        self.providers.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderRole;

    fn provider(name: &str, role: ProviderRole) -> TileProvider {
        TileProvider::new(name, "https://tiles.test/{z}/{x}/{y}.png", role)
    }

    #[test]
    fn test_empty_registry_rejected() {
        assert_eq!(ProviderRegistry::new(vec![]).unwrap_err(), RegistryError::Empty);
    }

    #[test]
    fn test_get_in_order() {
        let registry = ProviderRegistry::new(vec![
            provider("first", ProviderRole::Primary),
            provider("second", ProviderRole::Backup),
        ])
        .unwrap();

        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
        assert_eq!(registry.get(0).unwrap().name, "first");
        assert_eq!(registry.get(1).unwrap().name, "second");
    }

    #[test]
    fn test_get_out_of_range() {
        let registry = ProviderRegistry::new(vec![provider("only", ProviderRole::Primary)]).unwrap();
        assert_eq!(
            registry.get(1).unwrap_err(),
            RegistryError::IndexOutOfRange { index: 1, len: 1 }
        );
    }

    #[test]
    fn test_invalid_template_rejected() {
        let bad = TileProvider::new("bad", "https://tiles.test/{z}.png", ProviderRole::Backup);
        let err = ProviderRegistry::new(vec![provider("ok", ProviderRole::Primary), bad]).unwrap_err();
        assert_eq!(
            err,
            RegistryError::InvalidTemplate {
                name: "bad".to_string(),
                missing: "{x}, {y}".to_string(),
            }
        );
    }

    #[test]
    fn test_offline_sentinel_needs_no_placeholders() {
        let sentinel = TileProvider::new("offline", "offline://", ProviderRole::Offline);
        assert!(ProviderRegistry::new(vec![sentinel]).is_ok());
    }

    #[test]
    fn test_iter_preserves_order() {
        let registry = ProviderRegistry::new(vec![
            provider("a", ProviderRole::Primary),
            provider("b", ProviderRole::Backup),
            provider("c", ProviderRole::Backup),
        ])
        .unwrap();
        let names: Vec<_> = registry.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
