//! Path resolution for environments and the interpreter
//!
//! # Environment Variables
//!
//! - `STRATA_JSONNET` - Override the Jsonnet interpreter
//!
//! # Import Root Resolution
//!
//! When an environment configures no `jpath`, templates import from (first
//! match wins):
//! 1. The environment directory
//! 2. `<project>/lib`
//! 3. `<project>/vendor`
//!
//! where `<project>` is the nearest ancestor holding `jsonnetfile.json`, or
//! the environment directory itself.

use std::path::{Path, PathBuf};

use evaluator::backend::binary::DEFAULT_BINARY;

/// Environment variable for interpreter override
pub const ENV_JSONNET: &str = "STRATA_JSONNET";

/// File marking the root of a Jsonnet project
pub const PROJECT_MARKER: &str = "jsonnetfile.json";

/// Expand ~ and environment variables in a path string.
///
/// Unknown variables are left as they are.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

/// Expand `path` and resolve it against `base` when relative
pub fn resolve(base: &Path, path: &str) -> PathBuf {
    let expanded = expand(path);
    if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    }
}

/// Nearest ancestor of `start` (inclusive) holding `jsonnetfile.json`
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(PROJECT_MARKER).is_file())
        .map(Path::to_path_buf)
}

/// Import roots for an environment, first match wins
pub fn import_roots(env_dir: &Path, jpath: &[String]) -> Vec<PathBuf> {
    if !jpath.is_empty() {
        return jpath.iter().map(|p| resolve(env_dir, p)).collect();
    }

    let project = find_project_root(env_dir).unwrap_or_else(|| env_dir.to_path_buf());
    log::debug!("Project root: {}", project.display());
    vec![
        env_dir.to_path_buf(),
        project.join("lib"),
        project.join("vendor"),
    ]
}

/// Interpreter to spawn
///
/// Priority:
/// 1. Explicit override (`--jsonnet` or `STRATA_JSONNET`)
/// 2. `binary` from the environment configuration
/// 3. `jsonnet` on `PATH`
pub fn interpreter(explicit: Option<&Path>, configured: Option<&str>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    configured.map_or_else(|| PathBuf::from(DEFAULT_BINARY), expand)
}

// ============================================================================
// Tests
// ============================================================================
