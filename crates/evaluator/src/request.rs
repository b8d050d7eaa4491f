//! Evaluation settings shared by every call of one evaluator.

use std::collections::BTreeMap;

use crate::error::{InvalidRequest, InvalidRequestKind};

/// Settings an evaluator is bound to.
///
/// A request is built once through [`EvaluationRequest::builder`] and is
/// read-only afterwards. Variables are kept in name order so anything derived
/// from a request (such as an interpreter argument vector) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationRequest {
    import_roots: Vec<String>,
    ext_code: BTreeMap<String, String>,
    tla_code: BTreeMap<String, String>,
    max_stack: usize,
}

impl EvaluationRequest {
    /// Start building a request.
    pub fn builder() -> EvaluationRequestBuilder {
        EvaluationRequestBuilder::default()
    }

    /// Import search roots, highest precedence first.
    pub fn import_roots(&self) -> &[String] {
        &self.import_roots
    }

    /// External variables, name → code expression.
    pub fn ext_code(&self) -> &BTreeMap<String, String> {
        &self.ext_code
    }

    /// Top-level arguments, name → code expression.
    pub fn tla_code(&self) -> &BTreeMap<String, String> {
        &self.tla_code
    }

    /// Maximum stack depth. `0` leaves the backend default in place.
    pub fn max_stack(&self) -> usize {
        self.max_stack
    }
}

/// Builder for [`EvaluationRequest`].
#[derive(Debug, Default)]
pub struct EvaluationRequestBuilder {
    import_roots: Vec<String>,
    ext_code: BTreeMap<String, String>,
    tla_code: BTreeMap<String, String>,
    max_stack: usize,
}

impl EvaluationRequestBuilder {
    /// Append an import root. Roots added earlier take precedence.
    pub fn import_root(mut self, root: impl Into<String>) -> Self {
        self.import_roots.push(root.into());
        self
    }

    /// Append several import roots, keeping their order.
    pub fn import_roots<I, S>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.import_roots.extend(roots.into_iter().map(Into::into));
        self
    }

    /// Define an external variable as a code expression.
    ///
    /// Defining the same name twice keeps the last expression.
    pub fn ext_code(mut self, name: impl Into<String>, code: impl Into<String>) -> Self {
        self.ext_code.insert(name.into(), code.into());
        self
    }

    /// Define a top-level argument as a code expression.
    pub fn tla_code(mut self, name: impl Into<String>, code: impl Into<String>) -> Self {
        self.tla_code.insert(name.into(), code.into());
        self
    }

    /// Bound the evaluation stack depth.
    pub fn max_stack(mut self, depth: usize) -> Self {
        self.max_stack = depth;
        self
    }

    /// Validate and freeze the request.
    ///
    /// Variable names must be non-empty and must not contain `=`, since the
    /// interpreter splits `name=value` at the first `=`.
    pub fn build(self) -> Result<EvaluationRequest, InvalidRequest> {
        validate_names(&self.ext_code, "ext-code")?;
        validate_names(&self.tla_code, "tla-code")?;

        Ok(EvaluationRequest {
            import_roots: self.import_roots,
            ext_code: self.ext_code,
            tla_code: self.tla_code,
            max_stack: self.max_stack,
        })
    }
}

fn validate_names(
    vars: &BTreeMap<String, String>,
    flag: &'static str,
) -> Result<(), InvalidRequest> {
    for name in vars.keys() {
        let kind = if name.is_empty() {
            InvalidRequestKind::EmptyName
        } else if name.contains('=') {
            InvalidRequestKind::NameContainsEquals
        } else {
            continue;
        };
        return Err(InvalidRequest {
            flag,
            name: name.clone(),
            kind,
        });
    }
    Ok(())
}
