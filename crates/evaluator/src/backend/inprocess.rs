//! In-process backend built on jrsonnet.
//!
//! A fresh interpreter state is created for every call, so the evaluator
//! itself only holds the immutable request and can be shared across threads.
//! Import roots are searched in request order, external variables are
//! registered as code, and top-level arguments are applied when the program
//! evaluates to a function.

use std::path::{Path, PathBuf};

use jrsonnet_evaluator::manifest::{JsonFormat, ManifestFormat};
use jrsonnet_evaluator::stack::limit_stack_depth;
use jrsonnet_evaluator::trace::PathResolver;
use jrsonnet_evaluator::{FileImportResolver, State};
use jrsonnet_stdlib::ContextInitializer;
use serde_json::Value;

use crate::error::{Error, Result, Unit};
use crate::request::EvaluationRequest;

use super::{EvaluationBackend, Evaluator, native};

/// Binding the evaluated program is kept under while top-level arguments
/// are applied.
const MAIN: &str = "__strata_main";

/// Backend evaluating Jsonnet inside the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct InProcessBackend;

impl EvaluationBackend for InProcessBackend {
    fn name(&self) -> &'static str {
        "inprocess"
    }

    fn make_evaluator(&self, request: EvaluationRequest) -> Box<dyn Evaluator> {
        Box::new(InProcessEvaluator { request })
    }
}

/// Evaluator running jrsonnet on the calling thread.
#[derive(Debug, Clone)]
pub struct InProcessEvaluator {
    request: EvaluationRequest,
}

impl InProcessEvaluator {
    /// Interpreter state for one call.
    fn state(&self) -> std::result::Result<State, String> {
        let library_paths: Vec<PathBuf> = self
            .request
            .import_roots()
            .iter()
            .filter(|root| !root.is_empty())
            .map(PathBuf::from)
            .collect();

        let context = ContextInitializer::new(PathResolver::new_cwd_fallback());
        native::register(&context);
        for (name, code) in self.request.ext_code() {
            context
                .add_ext_code(name.as_str(), code.as_str())
                .map_err(|e| format!("ext-code {name}: {e}"))?;
        }

        let mut builder = State::builder();
        builder
            .import_resolver(FileImportResolver::new(library_paths))
            .context_initializer(context);
        Ok(builder.build())
    }

    fn run(&self, unit: Unit, name: &str, program: String) -> Result<String> {
        log::debug!(
            "evaluating {unit} in-process ({} import root(s), max stack {})",
            self.request.import_roots().len(),
            self.request.max_stack()
        );

        let _depth = (self.request.max_stack() > 0)
            .then(|| limit_stack_depth(self.request.max_stack()));

        let state = self.state().map_err(|d| Error::new(unit.clone(), d))?;
        let val = state
            .evaluate_snippet(name.to_string(), program)
            .map_err(|e| Error::new(unit.clone(), e.to_string()))?;

        let mut out = String::new();
        JsonFormat::default()
            .manifest_buf(val, &mut out)
            .map_err(|e| Error::new(unit, e.to_string()))?;
        out.push('\n');
        Ok(out)
    }

    /// Wrap `main` so top-level arguments reach it when it is a function.
    fn apply_tla(&self, main: &str) -> String {
        if self.request.tla_code().is_empty() {
            return main.to_string();
        }

        let args: Vec<String> = self
            .request
            .tla_code()
            .iter()
            .map(|(name, code)| format!("{name}=(\n{code}\n)"))
            .collect();
        format!(
            "local {MAIN} = (\n{main}\n);\nif std.isFunction({MAIN}) then {MAIN}({}) else {MAIN}\n",
            args.join(", ")
        )
    }
}

impl Evaluator for InProcessEvaluator {
    fn evaluate_anonymous_snippet(&self, code: &str) -> Result<String> {
        let unit = Unit::Snippet(code.to_string());
        self.run(unit, "<snippet>", self.apply_tla(code))
    }

    fn evaluate_file(&self, path: &Path) -> Result<String> {
        let unit = Unit::File(path.to_path_buf());
        let absolute = std::path::absolute(path)
            .map_err(|e| Error::new(unit.clone(), format!("resolving path: {e}")))?;
        let literal = import_literal(&absolute)
            .ok_or_else(|| Error::new(unit.clone(), "path is not valid UTF-8"))?;

        let name = absolute.display().to_string();
        self.run(unit, &name, self.apply_tla(&format!("import {literal}")))
    }
}

/// A double-quoted Jsonnet string naming `path`.
///
/// JSON string literals are valid Jsonnet string literals.
fn import_literal(path: &Path) -> Option<String> {
    path.to_str().map(|p| Value::String(p.to_string()).to_string())
}
