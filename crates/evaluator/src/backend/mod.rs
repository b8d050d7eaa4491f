use std::path::Path;

use crate::error::Result;
use crate::request::EvaluationRequest;

#[cfg(feature = "binary")]
pub mod binary;
#[cfg(feature = "inprocess")]
pub mod inprocess;
#[cfg(feature = "inprocess")]
mod native;

/// An engine able to evaluate Jsonnet.
///
/// This trait abstracts the underlying implementation, allowing us to:
/// - Shell out to any interpreter honoring the Jsonnet CLI flags
/// - Evaluate in-process with jrsonnet
/// - Mock for testing
///
/// Every backend must produce the same observable results for the same
/// request and input.
pub trait EvaluationBackend: Send + Sync {
    /// Short name used in configuration and logs
    fn name(&self) -> &'static str;

    /// Bind a reusable evaluator to `request`.
    fn make_evaluator(&self, request: EvaluationRequest) -> Box<dyn Evaluator>;
}

/// A stateless evaluator bound to one [`EvaluationRequest`].
///
/// Calling it twice with the same input yields the same result and leaves
/// nothing behind. On success the output is the JSON rendering of the
/// program's value; on failure there is no output at all.
pub trait Evaluator: Send + Sync {
    /// Evaluate inline code.
    fn evaluate_anonymous_snippet(&self, code: &str) -> Result<String>;

    /// Evaluate the file at `path`.
    fn evaluate_file(&self, path: &Path) -> Result<String>;
}
