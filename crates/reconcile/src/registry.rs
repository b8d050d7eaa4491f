//! Name → constructor mapping for providers
//!
//! The set of providers is known before any configuration is parsed, so
//! callers can list or validate names up front. Constructors produce empty
//! instances; settings are hydrated afterwards.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::provider::{BoxedProvider, ConfiguredProvider};

/// Creates an unconfigured provider
pub type Constructor = fn() -> BoxedProvider;

/// Read-only provider registry, built once at startup
#[derive(Debug, Clone, Default)]
pub struct Registry {
    constructors: BTreeMap<String, Constructor>,
}

impl Registry {
    /// Start building a registry
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    /// Check if a name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Number of registered providers
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Check if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Create an unconfigured provider
    pub fn construct(&self, name: &str) -> Result<BoxedProvider> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| Error::UnknownProvider {
                name: name.to_string(),
                known: self.constructors.keys().cloned().collect(),
            })?;

        let provider = constructor();
        if provider.name() != name {
            log::warn!(
                "provider registered as `{name}` reports its name as `{}`",
                provider.name()
            );
        }
        Ok(provider)
    }

    /// Create a provider and hydrate it with `settings`
    pub fn hydrate(&self, name: &str, settings: &Value) -> Result<ConfiguredProvider> {
        ConfiguredProvider::hydrate(self.construct(name)?, settings)
    }
}

/// Builder for [`Registry`]
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entries: Vec<(String, Constructor)>,
}

impl RegistryBuilder {
    /// Register a constructor under `name`
    pub fn register(mut self, name: impl Into<String>, constructor: Constructor) -> Self {
        self.entries.push((name.into(), constructor));
        self
    }

    /// Freeze the registry, rejecting duplicate names
    pub fn build(self) -> Result<Registry> {
        let mut constructors = BTreeMap::new();
        for (name, constructor) in self.entries {
            if constructors.contains_key(&name) {
                return Err(Error::DuplicateProvider(name));
            }
            constructors.insert(name, constructor);
        }
        Ok(Registry { constructors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ApplySummary, RawState};
    use serde_json::json;

    #[derive(Debug, Default)]
    struct Null {
        configured: bool,
    }

    impl crate::Provider for Null {
        fn name(&self) -> &'static str {
            "null"
        }

        fn configure(&mut self, _settings: &Value) -> anyhow::Result<()> {
            self.configured = true;
            Ok(())
        }

        fn show(&self, raw: &RawState) -> anyhow::Result<Value> {
            anyhow::ensure!(self.configured, "not configured");
            Ok(raw.clone())
        }

        fn apply(&self, _desired: &Value) -> anyhow::Result<ApplySummary> {
            Ok(ApplySummary::default())
        }

        fn state(&self, _desired: &Value) -> anyhow::Result<Value> {
            Ok(Value::Null)
        }
    }

    fn null() -> BoxedProvider {
        Box::new(Null::default())
    }

    #[test]
    fn test_names_sorted() {
        let registry = Registry::builder()
            .register("null", null)
            .register("alpha", null)
            .build()
            .unwrap();

        assert_eq!(registry.names(), ["alpha", "null"]);
        assert!(registry.contains("null"));
        assert!(!registry.contains("kubernetes"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_duplicate_rejected() {
        let err = Registry::builder()
            .register("null", null)
            .register("null", null)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateProvider(name) if name == "null"));
    }

    #[test]
    fn test_unknown_name_lists_known() {
        let registry = Registry::builder().register("null", null).build().unwrap();
        match registry.construct("kubernetes") {
            Err(Error::UnknownProvider { name, known }) => {
                assert_eq!(name, "kubernetes");
                assert_eq!(known, ["null"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_construct_returns_fresh_instances() {
        let registry = Registry::builder().register("null", null).build().unwrap();

        let configured = registry.hydrate("null", &json!({})).unwrap();
        assert!(configured.show(&json!({"a": 1})).is_ok());

        // a second construction starts from scratch
        let fresh = registry.construct("null").unwrap();
        assert!(fresh.show(&json!({})).is_err());
    }
}
