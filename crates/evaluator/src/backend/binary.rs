//! Subprocess backend.
//!
//! Runs an external interpreter once per call. The interpreter has to accept
//! the flags of the official Jsonnet CLI:
//!
//! - `-J <path>` import search root (right-most wins)
//! - `--ext-code <name>=<value>` external variable as code
//! - `--tla-code <name>=<value>` top-level argument as code
//! - `--max-stack <n>` maximum stack depth
//! - `-e <code>` evaluate inline code
//! - `<path>` positional file to evaluate
//!
//! Arguments are always handed to the process as separate elements; no shell
//! is involved at any point.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use crate::error::{Error, Result, Unit};
use crate::request::EvaluationRequest;

use super::{EvaluationBackend, Evaluator};

/// Interpreter used when no path is configured.
pub const DEFAULT_BINARY: &str = "jsonnet";

/// Backend spawning an external Jsonnet interpreter.
#[derive(Debug, Clone)]
pub struct SubprocessBackend {
    bin_path: PathBuf,
}

impl SubprocessBackend {
    /// Create a backend running the interpreter at `bin_path`.
    ///
    /// A bare name is looked up on `PATH` when the process is spawned.
    pub fn new(bin_path: impl Into<PathBuf>) -> Self {
        Self {
            bin_path: bin_path.into(),
        }
    }

    /// Path of the interpreter.
    pub fn bin_path(&self) -> &Path {
        &self.bin_path
    }

    /// Check whether the interpreter can be spawned at all.
    pub fn is_available(&self) -> bool {
        Command::new(&self.bin_path)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

impl Default for SubprocessBackend {
    fn default() -> Self {
        Self::new(DEFAULT_BINARY)
    }
}

impl EvaluationBackend for SubprocessBackend {
    fn name(&self) -> &'static str {
        "binary"
    }

    fn make_evaluator(&self, request: EvaluationRequest) -> Box<dyn Evaluator> {
        Box::new(SubprocessEvaluator::new(self.bin_path.clone(), &request))
    }
}

/// Evaluator bound to a fixed interpreter argument prefix.
#[derive(Debug, Clone)]
pub struct SubprocessEvaluator {
    bin_path: PathBuf,
    args: Vec<String>,
}

impl SubprocessEvaluator {
    /// Derive the argument prefix from `request`.
    pub fn new(bin_path: PathBuf, request: &EvaluationRequest) -> Self {
        Self {
            bin_path,
            args: request_args(request),
        }
    }

    /// Arguments passed before the per-call payload.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    fn run(&self, unit: Unit, payload: Vec<OsString>) -> Result<String> {
        log::debug!(
            "running {} {:?} + {} payload argument(s)",
            self.bin_path.display(),
            self.args,
            payload.len()
        );

        let output = Command::new(&self.bin_path)
            .args(&self.args)
            .args(&payload)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                Error::new(
                    unit.clone(),
                    format!("failed to run {}: {e}", self.bin_path.display()),
                )
            })?;

        if output.status.success() {
            return String::from_utf8(output.stdout).map_err(|e| {
                Error::new(unit, format!("interpreter output is not valid UTF-8: {e}"))
            });
        }

        log::debug!("{} exited with {}", self.bin_path.display(), output.status);
        Err(Error::new(unit, self.diagnostic(&output)))
    }

    /// Combined stdout and stderr of a failed run.
    fn diagnostic(&self, output: &Output) -> String {
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if combined.trim().is_empty() {
            format!("{} exited with {}", self.bin_path.display(), output.status)
        } else {
            combined
        }
    }
}

impl Evaluator for SubprocessEvaluator {
    fn evaluate_anonymous_snippet(&self, code: &str) -> Result<String> {
        let unit = Unit::Snippet(code.to_string());
        self.run(unit, vec!["-e".into(), snippet_arg(code).into()])
    }

    fn evaluate_file(&self, path: &Path) -> Result<String> {
        let unit = Unit::File(path.to_path_buf());
        self.run(unit, vec![file_arg(path).into_os_string()])
    }
}

/// Build the request part of the argument vector.
///
/// The interpreter gives the right-most `-J` precedence, so roots are
/// emitted in reverse to let the first configured root win.
fn request_args(request: &EvaluationRequest) -> Vec<String> {
    let mut args = Vec::new();

    if request.max_stack() > 0 {
        args.push("--max-stack".to_string());
        args.push(request.max_stack().to_string());
    }
    for root in request.import_roots().iter().rev() {
        args.push("-J".to_string());
        args.push(root.clone());
    }
    for (name, code) in request.ext_code() {
        args.push("--ext-code".to_string());
        args.push(format!("{name}={code}"));
    }
    for (name, code) in request.tla_code() {
        args.push("--tla-code".to_string());
        args.push(format!("{name}={code}"));
    }

    args
}

/// Leading whitespace is insignificant in Jsonnet, and keeps `-1` from
/// being parsed as an option.
fn snippet_arg(code: &str) -> String {
    if code.starts_with('-') {
        format!(" {code}")
    } else {
        code.to_string()
    }
}

fn file_arg(path: &Path) -> PathBuf {
    if path.is_relative() && path.to_string_lossy().starts_with('-') {
        Path::new(".").join(path)
    } else {
        path.to_path_buf()
    }
}
