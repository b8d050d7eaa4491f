//! Provider trait for target-system adapters
//!
//! A Provider turns the evaluated tree into the normal form of one target
//! system, reads the live counterpart of that form and applies it.

use crate::error::{Error, Result};
use crate::state::{ApplySummary, RawState, RealState, ReconciledState};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

/// Core trait for target-system adapters
///
/// Instances are created empty by a registry constructor and receive their
/// settings through [`configure`](Provider::configure) before anything else
/// is called. The pipeline only reaches them through a
/// [`ConfiguredProvider`].
///
/// # Example
///
/// ```ignore
/// use reconcile::{ApplySummary, Provider, RawState};
/// use serde_json::Value;
///
/// #[derive(Debug, Default)]
/// struct Echo;
///
/// impl Provider for Echo {
///     fn name(&self) -> &'static str { "echo" }
///     fn configure(&mut self, _settings: &Value) -> anyhow::Result<()> { Ok(()) }
///     fn show(&self, raw: &RawState) -> anyhow::Result<Value> { Ok(raw.clone()) }
///     fn apply(&self, _desired: &Value) -> anyhow::Result<ApplySummary> {
///         Ok(ApplySummary::default())
///     }
///     fn state(&self, desired: &Value) -> anyhow::Result<Value> { Ok(desired.clone()) }
/// }
/// ```
pub trait Provider: Send + Sync + fmt::Debug {
    /// Registered name of the target system
    fn name(&self) -> &'static str;

    /// Hydrate provider settings from configuration data
    fn configure(&mut self, settings: &Value) -> anyhow::Result<()>;

    /// Convert the raw evaluated tree into this target system's normal form
    ///
    /// Must be a pure function of `raw` and the settings: no network, no
    /// reads of the target system, no mutation. Fails with a descriptive
    /// error when `raw` is not shaped as expected.
    fn show(&self, raw: &RawState) -> anyhow::Result<Value>;

    /// Make the target system match `desired`
    ///
    /// `desired` is exactly what [`show`](Provider::show) returned. Calling
    /// this again with the same value, including after a partial failure,
    /// must not apply anything twice.
    fn apply(&self, desired: &Value) -> anyhow::Result<ApplySummary>;

    /// Read the live state corresponding to `desired`
    ///
    /// Returns only the resources and fields `desired` manages, so a diff
    /// against `desired` is not polluted by unmanaged state.
    fn state(&self, desired: &Value) -> anyhow::Result<Value>;
}

/// A boxed provider for type-erased storage
pub type BoxedProvider = Box<dyn Provider>;

/// Deserialize provider settings into a typed struct.
///
/// Convenience for [`Provider::configure`] implementations.
pub fn settings<T: DeserializeOwned>(settings: &Value) -> anyhow::Result<T> {
    let settings = if settings.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        settings.clone()
    };
    Ok(serde_json::from_value(settings)?)
}

/// A provider whose settings have been hydrated.
///
/// This is the only way to call `show`, `state` and `apply`, which keeps an
/// unconfigured instance away from the target system.
#[derive(Debug)]
pub struct ConfiguredProvider {
    inner: BoxedProvider,
}

impl ConfiguredProvider {
    /// Configure `provider` with `settings`.
    pub fn hydrate(mut provider: BoxedProvider, settings: &Value) -> Result<Self> {
        provider
            .configure(settings)
            .map_err(|source| Error::Configure {
                provider: provider.name().to_string(),
                source: source.into(),
            })?;
        log::debug!("configured provider `{}`", provider.name());
        Ok(Self { inner: provider })
    }

    /// Registered name of the underlying provider
    pub fn name(&self) -> &'static str {
        self.inner.name()
    }

    /// Normalize a raw tree
    pub fn show(&self, raw: &RawState) -> Result<ReconciledState> {
        let value = self.inner.show(raw).map_err(|source| Error::Show {
            provider: self.name().to_string(),
            source: source.into(),
        })?;
        Ok(ReconciledState::new(self.name(), value))
    }

    /// Apply a state this provider produced
    pub fn apply(&self, desired: &ReconciledState) -> Result<ApplySummary> {
        self.check_origin(desired)?;
        self.inner
            .apply(desired.value())
            .map_err(|source| Error::Apply {
                provider: self.name().to_string(),
                source: source.into(),
            })
    }

    /// Query live state for a state this provider produced
    pub fn state(&self, desired: &ReconciledState) -> Result<RealState> {
        self.check_origin(desired)?;
        self.inner
            .state(desired.value())
            .map(RealState::new)
            .map_err(|source| Error::StateQuery {
                provider: self.name().to_string(),
                source: source.into(),
            })
    }

    fn check_origin(&self, desired: &ReconciledState) -> Result<()> {
        if desired.provider() == self.name() {
            Ok(())
        } else {
            Err(Error::ProviderMismatch {
                expected: self.name().to_string(),
                found: desired.provider().to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Default)]
    struct Named {
        name: &'static str,
        prefix: String,
    }

    #[derive(Deserialize)]
    #[serde(deny_unknown_fields)]
    struct NamedSettings {
        prefix: String,
    }

    impl Provider for Named {
        fn name(&self) -> &'static str {
            self.name
        }

        fn configure(&mut self, value: &Value) -> anyhow::Result<()> {
            let parsed: NamedSettings = settings(value)?;
            self.prefix = parsed.prefix;
            Ok(())
        }

        fn show(&self, raw: &RawState) -> anyhow::Result<Value> {
            let text = raw
                .as_str()
                .ok_or_else(|| anyhow::anyhow!("expected a string, found {raw}"))?;
            Ok(Value::String(format!("{}{text}", self.prefix)))
        }

        fn apply(&self, _desired: &Value) -> anyhow::Result<ApplySummary> {
            Ok(ApplySummary::default())
        }

        fn state(&self, desired: &Value) -> anyhow::Result<Value> {
            Ok(desired.clone())
        }
    }

    fn configured(name: &'static str) -> ConfiguredProvider {
        let provider = Box::new(Named {
            name,
            ..Default::default()
        });
        ConfiguredProvider::hydrate(provider, &json!({"prefix": "p-"})).unwrap()
    }

    #[test]
    fn test_hydrate_and_show() {
        let provider = configured("named");
        let state = provider.show(&json!("x")).unwrap();
        assert_eq!(state.provider(), "named");
        assert_eq!(state.value(), &json!("p-x"));
    }

    #[test]
    fn test_hydrate_rejects_bad_settings() {
        let provider = Box::new(Named {
            name: "named",
            ..Default::default()
        });
        let err = ConfiguredProvider::hydrate(provider, &json!({"prefix": 1})).unwrap_err();
        assert!(matches!(err, Error::Configure { ref provider, .. } if provider == "named"));
    }

    #[test]
    fn test_show_error_wrapped() {
        let err = configured("named").show(&json!(42)).unwrap_err();
        assert!(err.to_string().contains("expected a string, found 42"));
    }

    #[test]
    fn test_state_from_other_provider_rejected() {
        let a = configured("a");
        let b = configured("b");
        let state = a.show(&json!("x")).unwrap();

        assert!(matches!(
            b.apply(&state),
            Err(Error::ProviderMismatch { .. })
        ));
        assert!(matches!(
            b.state(&state),
            Err(Error::ProviderMismatch { .. })
        ));
        assert!(a.state(&state).is_ok());
    }

    #[test]
    fn test_null_settings_mean_empty() {
        #[derive(Deserialize, Default)]
        struct Optional {
            #[serde(default)]
            value: Option<String>,
        }
        let parsed: Optional = settings(&Value::Null).unwrap();
        assert!(parsed.value.is_none());
    }
}
