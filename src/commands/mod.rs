// Template evaluation
pub mod eval;

// Environment workflow: show, diff, apply
pub mod workflow;

pub mod providers;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use evaluator::{EvaluationBackend, EvaluationRequest, InProcessBackend, SubprocessBackend};

use crate::cli::EvaluationArgs;
use crate::config::{BackendKind, EvaluationConfig};
use crate::paths;

/// Backend for `kind`, spawning `jsonnet` when it is the binary one
pub fn make_backend(kind: BackendKind, jsonnet: PathBuf) -> Box<dyn EvaluationBackend> {
    match kind {
        BackendKind::Binary => {
            log::debug!("Using interpreter {}", jsonnet.display());
            Box::new(SubprocessBackend::new(jsonnet))
        }
        BackendKind::InProcess => Box::new(InProcessBackend),
    }
}

/// Combine configured settings with command-line flags
///
/// Flags win: their import roots come first, and their variables replace
/// configured ones with the same name.
pub fn build_request(
    config: &EvaluationConfig,
    import_roots: &[PathBuf],
    base: &Path,
    args: &EvaluationArgs,
) -> Result<EvaluationRequest> {
    let flag_roots = args.jpath.iter().map(|p| paths::resolve(base, p));
    let roots = flag_roots
        .chain(import_roots.iter().cloned())
        .map(|p| p.to_string_lossy().into_owned());

    let mut builder = EvaluationRequest::builder()
        .import_roots(roots)
        .max_stack(args.max_stack.unwrap_or(config.max_stack));

    for (name, code) in config.ext_code.iter().chain(pairs(&args.ext_code)) {
        builder = builder.ext_code(name, code);
    }
    for (name, code) in config.tla_code.iter().chain(pairs(&args.tla_code)) {
        builder = builder.tla_code(name, code);
    }

    builder.build().context("Invalid evaluation settings")
}

fn pairs(vars: &[(String, String)]) -> impl Iterator<Item = (&String, &String)> {
    vars.iter().map(|(name, code)| (name, code))
}
