//! Environment loading
//!
//! An environment is a directory holding `main.jsonnet` and an optional
//! `strata.toml`:
//!
//! ```toml
//! [evaluation]
//! backend = "binary"
//! jpath = ["lib", "vendor"]
//! max_stack = 500
//!
//! [evaluation.ext_code]
//! env = '"prod"'
//!
//! [provider]
//! name = "directory"
//!
//! [provider.settings]
//! root = "~/out"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::paths;

/// Per-environment configuration file
pub const CONFIG_FILE: &str = "strata.toml";

/// Template evaluated for an environment
pub const ENTRYPOINT: &str = "main.jsonnet";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Spawn a Jsonnet interpreter
    #[default]
    Binary,
    /// Evaluate in-process with jrsonnet
    #[value(name = "inprocess")]
    InProcess,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentConfig {
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub provider: Option<ProviderConfig>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvaluationConfig {
    #[serde(default)]
    pub backend: BackendKind,
    /// Interpreter path or name, `~` and `$VARS` expanded
    #[serde(default)]
    pub binary: Option<String>,
    /// Import roots relative to the environment directory
    #[serde(default)]
    pub jpath: Vec<String>,
    #[serde(default)]
    pub max_stack: usize,
    #[serde(default)]
    pub ext_code: BTreeMap<String, String>,
    #[serde(default)]
    pub tla_code: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    pub name: String,
    #[serde(default)]
    pub settings: toml::Table,
}

impl ProviderConfig {
    /// Settings in the form providers consume
    pub fn settings_value(&self) -> Result<serde_json::Value> {
        serde_json::to_value(&self.settings)
            .with_context(|| format!("Invalid settings for provider '{}'", self.name))
    }
}

impl EnvironmentConfig {
    /// Parse a configuration document
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// A loaded environment
#[derive(Debug)]
pub struct Environment {
    pub dir: PathBuf,
    pub entrypoint: PathBuf,
    pub config: EnvironmentConfig,
}

impl Environment {
    /// Load the environment at `path`
    ///
    /// `path` may be the environment directory or its `main.jsonnet`.
    pub fn load(path: &Path) -> Result<Self> {
        let dir = if path.is_file() {
            path.parent().unwrap_or(Path::new(".")).to_path_buf()
        } else {
            path.to_path_buf()
        };

        let entrypoint = dir.join(ENTRYPOINT);
        anyhow::ensure!(
            entrypoint.is_file(),
            "No {ENTRYPOINT} in {} (is it an environment?)",
            dir.display()
        );

        let config_path = dir.join(CONFIG_FILE);
        let config = if config_path.is_file() {
            let content = fs::read_to_string(&config_path)
                .with_context(|| format!("Could not read {}", config_path.display()))?;
            EnvironmentConfig::parse(&content)
                .with_context(|| format!("Invalid {}", config_path.display()))?
        } else {
            log::debug!("No {CONFIG_FILE} in {}, using defaults", dir.display());
            EnvironmentConfig::default()
        };

        Ok(Self {
            dir,
            entrypoint,
            config,
        })
    }

    /// Import roots for this environment, first match wins
    pub fn import_roots(&self) -> Vec<PathBuf> {
        paths::import_roots(&self.dir, &self.config.evaluation.jpath)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full() {
        let config = EnvironmentConfig::parse(
            r#"
[evaluation]
backend = "inprocess"
binary = "/opt/jsonnet"
jpath = ["lib", "vendor"]
max_stack = 500

[evaluation.ext_code]
env = '"prod"'

[evaluation.tla_code]
replicas = "3"

[provider]
name = "directory"

[provider.settings]
root = "~/out"
namespace = "default"
"#,
        )
        .unwrap();

        let eval = &config.evaluation;
        assert_eq!(eval.backend, BackendKind::InProcess);
        assert_eq!(eval.binary.as_deref(), Some("/opt/jsonnet"));
        assert_eq!(eval.jpath, ["lib", "vendor"]);
        assert_eq!(eval.max_stack, 500);
        assert_eq!(eval.ext_code["env"], "\"prod\"");
        assert_eq!(eval.tla_code["replicas"], "3");

        let provider = config.provider.unwrap();
        assert_eq!(provider.name, "directory");
        assert_eq!(
            provider.settings_value().unwrap(),
            serde_json::json!({"root": "~/out", "namespace": "default"})
        );
    }

    #[test]
    fn test_parse_empty_uses_defaults() {
        let config = EnvironmentConfig::parse("").unwrap();
        assert_eq!(config.evaluation.backend, BackendKind::Binary);
        assert!(config.evaluation.jpath.is_empty());
        assert!(config.provider.is_none());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(EnvironmentConfig::parse("[evaluation]\njsonnet_path = []\n").is_err());
        assert!(EnvironmentConfig::parse("[evaluation]\nbackend = \"wasm\"\n").is_err());
    }

    #[test]
    fn test_load_from_dir_and_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(ENTRYPOINT), "{}").unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "[provider]\nname = \"directory\"\n",
        )
        .unwrap();

        let env = Environment::load(dir.path()).unwrap();
        assert_eq!(env.entrypoint, dir.path().join(ENTRYPOINT));
        assert_eq!(env.config.provider.unwrap().name, "directory");

        let env = Environment::load(&dir.path().join(ENTRYPOINT)).unwrap();
        assert_eq!(env.dir, dir.path());
    }

    #[test]
    fn test_load_without_entrypoint_fails() {
        let dir = TempDir::new().unwrap();
        let err = Environment::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains(ENTRYPOINT));
    }

    #[test]
    fn test_load_without_config() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(ENTRYPOINT), "{}").unwrap();
        let env = Environment::load(dir.path()).unwrap();
        assert!(env.config.provider.is_none());
    }
}
