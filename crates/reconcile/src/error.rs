//! Error types for reconciliation
//!
//! Every variant keeps the failing boundary's original error reachable
//! through [`std::error::Error::source`], so template and target-system
//! diagnostics survive intact up to whoever formats them.

use crate::pipeline::Stage;
use thiserror::Error;

/// Boxed error carried from provider implementations
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while running the pipeline or resolving providers
#[derive(Debug, Error)]
pub enum Error {
    /// The evaluation backend failed
    #[error(transparent)]
    Evaluation(#[from] evaluator::Error),

    /// Evaluation succeeded but its output is not a value tree
    #[error("evaluation output is not a valid value tree: {source}")]
    Decode {
        /// Parser error
        #[source]
        source: serde_json::Error,
    },

    /// The raw tree does not have the shape the provider expects
    #[error("provider `{provider}` could not reconcile the evaluated tree: {source}")]
    Show {
        /// Provider name
        provider: String,
        /// Provider diagnostic
        #[source]
        source: BoxError,
    },

    /// The target system rejected (part of) a change
    #[error("provider `{provider}` failed to apply: {source}")]
    Apply {
        /// Provider name
        provider: String,
        /// Provider diagnostic
        #[source]
        source: BoxError,
    },

    /// The target system could not be queried
    #[error("provider `{provider}` failed to query live state: {source}")]
    StateQuery {
        /// Provider name
        provider: String,
        /// Provider diagnostic
        #[source]
        source: BoxError,
    },

    /// Provider settings could not be hydrated
    #[error("provider `{provider}` rejected its configuration: {source}")]
    Configure {
        /// Provider name
        provider: String,
        /// Provider diagnostic
        #[source]
        source: BoxError,
    },

    /// No constructor is registered under this name
    #[error("unknown provider `{name}` (available: {})", .known.join(", "))]
    UnknownProvider {
        /// Requested name
        name: String,
        /// Registered names
        known: Vec<String>,
    },

    /// Two constructors were registered under one name
    #[error("provider `{0}` is registered more than once")]
    DuplicateProvider(String),

    /// A reconciled state was handed to a provider that did not produce it
    #[error("state produced by provider `{found}` cannot be used with provider `{expected}`")]
    ProviderMismatch {
        /// Provider receiving the state
        expected: String,
        /// Provider that produced the state
        found: String,
    },
}

impl Error {
    /// Pipeline stage the error belongs to.
    ///
    /// Registry and configuration errors happen before any stage runs.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Evaluation(_) => Some(Stage::Evaluate),
            Error::Decode { .. } => Some(Stage::Decode),
            Error::Show { .. } => Some(Stage::Show),
            Error::StateQuery { .. } => Some(Stage::State),
            Error::Apply { .. } => Some(Stage::Apply),
            Error::ProviderMismatch { .. }
            | Error::Configure { .. }
            | Error::UnknownProvider { .. }
            | Error::DuplicateProvider(_) => None,
        }
    }

    /// Returns the evaluation failure, if this is one.
    pub fn as_evaluation(&self) -> Option<&evaluator::Error> {
        match self {
            Error::Evaluation(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type for reconciliation
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_stage_classification() {
        let eval = Error::Evaluation(evaluator::Error::new(
            evaluator::Unit::Snippet("x".into()),
            "boom",
        ));
        assert_eq!(eval.stage(), Some(Stage::Evaluate));
        assert_eq!(eval.as_evaluation().map(|e| e.diagnostic()), Some("boom"));

        let unknown = Error::UnknownProvider {
            name: "k8s".into(),
            known: vec!["directory".into()],
        };
        assert_eq!(unknown.stage(), None);
        assert_eq!(
            unknown.to_string(),
            "unknown provider `k8s` (available: directory)"
        );
    }

    #[test]
    fn test_provider_diagnostic_is_kept() {
        let err = Error::Apply {
            provider: "directory".into(),
            source: anyhow::anyhow!("disk full").into(),
        };
        assert_eq!(err.stage(), Some(Stage::Apply));
        assert_eq!(
            err.to_string(),
            "provider `directory` failed to apply: disk full"
        );
        assert_eq!(err.source().map(ToString::to_string).as_deref(), Some("disk full"));
    }
}
