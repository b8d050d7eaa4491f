//! Directory provider - manifests as JSON files on disk
//!
//! Each manifest lands in `<root>/<namespace>/<kind>/<name>.json`, with `_`
//! standing in for a missing namespace. Resource ids have the form
//! `<kind>/<namespace>/<name>`.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use reconcile::{ApplyOutcome, ApplySummary, BoxedProvider, Provider, RawState, extract, subset};

pub const NAME: &str = "directory";

const NO_NAMESPACE: &str = "_";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Settings {
    root: String,
    #[serde(default)]
    namespace: Option<String>,
}

#[derive(Debug, Default)]
pub struct DirectoryProvider {
    root: PathBuf,
    namespace: Option<String>,
}

pub fn construct() -> BoxedProvider {
    Box::new(DirectoryProvider::default())
}

impl DirectoryProvider {
    /// File holding the resource `id`
    fn resource_path(&self, id: &str) -> Result<PathBuf> {
        let mut parts = id.split('/');
        let (Some(kind), Some(namespace), Some(name), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            bail!("Malformed resource id '{id}' (expected <kind>/<namespace>/<name>)");
        };
        for part in [kind, namespace, name] {
            check_segment(part).with_context(|| format!("Malformed resource id '{id}'"))?;
        }
        Ok(self
            .root
            .join(namespace)
            .join(kind)
            .join(format!("{name}.json")))
    }

    /// Normalize one extracted manifest, returning its id
    fn normalize(&self, path: &str, manifest: &mut Value) -> Result<String> {
        let obj = manifest
            .as_object_mut()
            .with_context(|| format!("Manifest at '{path}' is not an object"))?;
        let kind = obj
            .get("kind")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let metadata = obj
            .entry("metadata")
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
            .with_context(|| format!("Manifest at '{path}' has a non-object metadata"))?;

        let name = match metadata.get("name").and_then(Value::as_str) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => bail!("Manifest {kind} at '{path}' has no metadata.name"),
        };

        let namespace = match metadata.get("namespace") {
            Some(Value::String(ns)) if ns == NO_NAMESPACE => {
                bail!("Manifest {kind}/{name} uses the reserved namespace '{NO_NAMESPACE}'")
            }
            Some(Value::String(ns)) => Some(ns.clone()),
            Some(other) => bail!("Manifest {kind}/{name} has a non-string namespace: {other}"),
            None => {
                if let Some(ns) = &self.namespace {
                    metadata.insert("namespace".into(), Value::String(ns.clone()));
                }
                self.namespace.clone()
            }
        };
        let namespace = namespace.unwrap_or_else(|| NO_NAMESPACE.to_string());

        for segment in [&kind, &namespace, &name] {
            check_segment(segment)
                .with_context(|| format!("Manifest at '{path}' cannot be stored"))?;
        }
        Ok(format!("{kind}/{namespace}/{name}"))
    }
}

impl Provider for DirectoryProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn configure(&mut self, settings: &Value) -> Result<()> {
        let settings: Settings = reconcile::settings(settings)?;
        if settings.root.trim().is_empty() {
            bail!("'root' must not be empty");
        }
        if settings.namespace.as_deref() == Some(NO_NAMESPACE) {
            bail!("'namespace' must not be the reserved '{NO_NAMESPACE}'");
        }
        self.root = crate::paths::expand(&settings.root);
        self.namespace = settings.namespace.filter(|ns| !ns.is_empty());
        log::debug!("Directory provider rooted at {}", self.root.display());
        Ok(())
    }

    fn show(&self, raw: &RawState) -> Result<Value> {
        let mut resources = Map::new();
        for (path, mut manifest) in extract(raw)? {
            let id = self.normalize(&path, &mut manifest)?;
            if resources.contains_key(&id) {
                bail!("Duplicate resource '{id}' (second one at '{path}')");
            }
            resources.insert(id, manifest);
        }
        Ok(Value::Object(resources))
    }

    fn apply(&self, desired: &Value) -> Result<ApplySummary> {
        let resources = desired
            .as_object()
            .context("Expected an object of resources")?;

        let mut summary = ApplySummary::default();
        for (id, manifest) in resources {
            let path = self.resource_path(id)?;
            let outcome = write_if_changed(&path, &render(manifest)?)
                .with_context(|| format!("Failed to write {id}"))?;
            log::debug!("{id}: {outcome:?} ({})", path.display());
            summary.add(outcome);
        }
        Ok(summary)
    }

    fn state(&self, desired: &Value) -> Result<Value> {
        let resources = desired
            .as_object()
            .context("Expected an object of resources")?;

        let mut live = Map::new();
        for (id, manifest) in resources {
            let path = self.resource_path(id)?;
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to read {}", path.display()));
                }
            };
            let current: Value = serde_json::from_str(&content)
                .with_context(|| format!("Invalid JSON in {}", path.display()))?;
            live.insert(id.clone(), subset::project(&current, manifest));
        }
        Ok(Value::Object(live))
    }
}

/// Reject segments that would escape their directory
fn check_segment(segment: &str) -> Result<()> {
    if segment.is_empty() || segment == "." || segment == ".." {
        bail!("'{segment}' is not a valid path segment");
    }
    if segment.contains(['/', '\\']) {
        bail!("'{segment}' contains a path separator");
    }
    Ok(())
}

fn render(manifest: &Value) -> Result<String> {
    let mut content = serde_json::to_string_pretty(manifest)?;
    content.push('\n');
    Ok(content)
}

/// Write `content` to `path` unless it already holds exactly that
fn write_if_changed(path: &Path, content: &str) -> Result<ApplyOutcome> {
    let outcome = match fs::read(path) {
        Ok(existing) if existing == content.as_bytes() => return Ok(ApplyOutcome::Unchanged),
        Ok(_) => ApplyOutcome::Modified,
        Err(e) if e.kind() == ErrorKind::NotFound => ApplyOutcome::Created,
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };

    let parent = path
        .parent()
        .with_context(|| format!("No parent directory for {}", path.display()))?;
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create directory: {}", parent.display()))?;

    // Rename over the target so readers never see a partial file
    let file_name = path.file_name().unwrap_or_default().to_string_lossy();
    let tmp = parent.join(format!(".{file_name}.tmp"));
    fs::write(&tmp, content).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("Failed to replace {}", path.display()))?;

    Ok(outcome)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use reconcile::ConfiguredProvider;
    use serde_json::json;
    use tempfile::TempDir;

    fn provider(root: &Path, namespace: Option<&str>) -> ConfiguredProvider {
        let mut settings = json!({"root": root.to_string_lossy()});
        if let Some(ns) = namespace {
            settings["namespace"] = json!(ns);
        }
        ConfiguredProvider::hydrate(construct(), &settings).unwrap()
    }

    fn config_map(name: &str, data: Value) -> Value {
        json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {"name": name},
            "data": data,
        })
    }

    #[test]
    fn test_show_keys_and_namespaces() {
        let dir = TempDir::new().unwrap();
        let raw = json!({
            "app": {
                "config": config_map("app", json!({"k": "v"})),
                "pinned": {
                    "apiVersion": "v1",
                    "kind": "Secret",
                    "metadata": {"name": "creds", "namespace": "system"},
                },
            },
        });

        let state = provider(dir.path(), Some("prod")).show(&raw).unwrap();
        let value = state.value();
        assert_eq!(
            value.as_object().unwrap().keys().collect::<Vec<_>>(),
            ["ConfigMap/prod/app", "Secret/system/creds"]
        );
        assert_eq!(value["ConfigMap/prod/app"]["metadata"]["namespace"], "prod");

        let state = provider(dir.path(), None).show(&raw).unwrap();
        assert!(state.value().get("ConfigMap/_/app").is_some());
        assert!(state.value()["ConfigMap/_/app"]["metadata"].get("namespace").is_none());
    }

    #[test]
    fn test_show_rejects_bad_shapes() {
        let dir = TempDir::new().unwrap();
        let p = provider(dir.path(), None);

        let unnamed = json!({"a": {"apiVersion": "v1", "kind": "ConfigMap"}});
        let err = p.show(&unnamed).unwrap_err();
        assert!(format!("{err:#}").contains("no metadata.name"));

        let duplicate = json!({"a": config_map("x", json!({})), "b": config_map("x", json!({}))});
        let err = p.show(&duplicate).unwrap_err();
        assert!(format!("{err:#}").contains("Duplicate resource 'ConfigMap/_/x'"));

        let escaping = json!({"a": config_map("../../etc", json!({}))});
        assert!(p.show(&escaping).is_err());

        let primitive = json!({"replicas": 3});
        assert!(p.show(&primitive).is_err());
    }

    #[test]
    fn test_reserved_namespace_rejected() {
        let dir = TempDir::new().unwrap();
        let p = provider(dir.path(), None);

        let mut pinned = config_map("x", json!({}));
        pinned["metadata"]["namespace"] = json!("_");
        let raw = json!({"implicit": config_map("x", json!({})), "pinned": pinned});
        let err = p.show(&raw).unwrap_err();
        assert!(format!("{err:#}").contains("reserved namespace '_'"));

        let settings = json!({"root": dir.path().to_string_lossy(), "namespace": "_"});
        let err = ConfiguredProvider::hydrate(construct(), &settings).unwrap_err();
        assert!(format!("{err:#}").contains("reserved"));
    }

    #[test]
    fn test_show_is_pure() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("out");
        let p = provider(&root, None);
        let raw = json!({"a": config_map("x", json!({}))});

        assert_eq!(p.show(&raw).unwrap(), p.show(&raw).unwrap());
        assert!(!root.exists());
    }

    #[test]
    fn test_apply_writes_and_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let p = provider(dir.path(), None);
        let raw = json!({"a": config_map("x", json!({"k": "v"}))});
        let desired = p.show(&raw).unwrap();

        let first = p.apply(&desired).unwrap();
        assert_eq!(first.created, 1);
        let file = dir.path().join("_").join("ConfigMap").join("x.json");
        let written: Value = serde_json::from_str(&fs::read_to_string(&file).unwrap()).unwrap();
        assert_eq!(written, config_map("x", json!({"k": "v"})));

        let second = p.apply(&desired).unwrap();
        assert!(second.is_noop());
        assert_eq!(second.unchanged, 1);

        let changed = p
            .show(&json!({"a": config_map("x", json!({"k": "w"}))}))
            .unwrap();
        assert_eq!(p.apply(&changed).unwrap().modified, 1);
    }

    #[test]
    fn test_state_round_trip() {
        let dir = TempDir::new().unwrap();
        let p = provider(dir.path(), Some("prod"));
        let desired = p
            .show(&json!({
                "a": config_map("x", json!({"k": "v"})),
                "b": config_map("y", json!({})),
            }))
            .unwrap();

        // nothing applied yet
        assert_eq!(p.state(&desired).unwrap().value(), &json!({}));

        p.apply(&desired).unwrap();
        assert_eq!(p.state(&desired).unwrap().value(), desired.value());
    }

    #[test]
    fn test_state_ignores_unmanaged_fields() {
        let dir = TempDir::new().unwrap();
        let p = provider(dir.path(), None);
        let desired = p
            .show(&json!({"a": config_map("x", json!({"k": "v"}))}))
            .unwrap();
        p.apply(&desired).unwrap();

        let file = dir.path().join("_").join("ConfigMap").join("x.json");
        let mut live: Value = serde_json::from_str(&fs::read_to_string(&file).unwrap()).unwrap();
        live["status"] = json!({"observed": true});
        live["data"]["k"] = json!("drifted");
        fs::write(&file, serde_json::to_string(&live).unwrap()).unwrap();

        let real = p.state(&desired).unwrap();
        assert_eq!(real.value()["ConfigMap/_/x"]["data"]["k"], "drifted");
        assert!(real.value()["ConfigMap/_/x"].get("status").is_none());
    }

    #[test]
    fn test_configure_requires_root() {
        assert!(ConfiguredProvider::hydrate(construct(), &json!({})).is_err());
        assert!(ConfiguredProvider::hydrate(construct(), &json!({"root": " "})).is_err());
        assert!(
            ConfiguredProvider::hydrate(construct(), &json!({"root": "/x", "other": 1})).is_err()
        );
    }

    #[test]
    fn test_resource_path() {
        let p = DirectoryProvider {
            root: PathBuf::from("/out"),
            namespace: None,
        };
        assert_eq!(
            p.resource_path("Secret/system/creds").unwrap(),
            PathBuf::from("/out/system/Secret/creds.json")
        );
        assert!(p.resource_path("Secret/creds").is_err());
        assert!(p.resource_path("Secret/../creds").is_err());
    }
}
