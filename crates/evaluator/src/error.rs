use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The unit an evaluation was asked to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unit {
    /// An inline snippet, carrying its source text
    Snippet(String),
    /// A file on disk
    File(PathBuf),
}

impl Unit {
    /// Returns the file path when the unit is a file.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Unit::File(path) => Some(path),
            Unit::Snippet(_) => None,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Snippet(_) => write!(f, "anonymous snippet"),
            Unit::File(path) => write!(f, "file {}", path.display()),
        }
    }
}

/// Failure inside the evaluation boundary.
///
/// Syntax, runtime, type, import and stack-depth failures all land here, as
/// do interpreter spawn failures and non-zero exits. The diagnostic is kept
/// exactly as the engine reported it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("error evaluating {unit}: {diagnostic}")]
pub struct Error {
    unit: Unit,
    diagnostic: String,
}

impl Error {
    /// Create an error for `unit` with the engine's diagnostic text.
    pub fn new(unit: Unit, diagnostic: impl Into<String>) -> Self {
        Self {
            unit,
            diagnostic: diagnostic.into(),
        }
    }

    /// The snippet or file that failed.
    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    /// The engine's diagnostic text, verbatim.
    pub fn diagnostic(&self) -> &str {
        &self.diagnostic
    }
}

/// Why an [`EvaluationRequest`](crate::EvaluationRequest) could not be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidRequestKind {
    /// The variable name is empty
    EmptyName,
    /// The variable name contains `=`
    NameContainsEquals,
}

impl fmt::Display for InvalidRequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name is empty"),
            Self::NameContainsEquals => write!(f, "name contains '='"),
        }
    }
}

/// A request whose variables cannot be passed to an interpreter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid --{flag} variable name {name:?}: {kind}")]
pub struct InvalidRequest {
    /// Flag the variable belongs to (`ext-code` or `tla-code`)
    pub flag: &'static str,
    /// Offending name
    pub name: String,
    /// What is wrong with it
    pub kind: InvalidRequestKind,
}

/// Result type for evaluation calls.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_unit() {
        let err = Error::new(Unit::File(PathBuf::from("/env/main.jsonnet")), "oops");
        assert_eq!(
            err.to_string(),
            "error evaluating file /env/main.jsonnet: oops"
        );
        assert_eq!(err.unit().path(), Some(Path::new("/env/main.jsonnet")));

        let err = Error::new(Unit::Snippet("{}".into()), "RUNTIME ERROR: boom");
        assert_eq!(err.diagnostic(), "RUNTIME ERROR: boom");
        assert!(err.unit().path().is_none());
    }

    #[test]
    fn test_invalid_request_display() {
        let err = InvalidRequest {
            flag: "ext-code",
            name: "a=b".into(),
            kind: InvalidRequestKind::NameContainsEquals,
        };
        assert_eq!(
            err.to_string(),
            "invalid --ext-code variable name \"a=b\": name contains '='"
        );
    }
}
