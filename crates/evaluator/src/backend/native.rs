//! Native functions reachable through `std.native(name)` in-process.
//!
//! | Name | Parameters | Result |
//! |------|------------|--------|
//! | `parseJson` | `json` | the decoded value |
//! | `parseYaml` | `yaml` | array with one value per document |
//! | `manifestJsonFromJson` | `json`, `indent` | re-indented JSON text |
//! | `manifestYamlFromJson` | `json` | YAML text |
//! | `escapeStringRegex` | `str` | pattern matching `str` literally |
//! | `regexMatch` | `regex`, `string` | whether `regex` matches |
//! | `regexSubst` | `regex`, `src`, `repl` | `src` with every match replaced |
//! | `sha256` | `str` | lowercase hex digest |

use jrsonnet_evaluator::error::ErrorKind;
use jrsonnet_evaluator::function::builtin;
use jrsonnet_evaluator::{IStr, Result as JResult, Val};
use jrsonnet_stdlib::{ContextInitializer, builtin_parse_json};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Make every native function available to programs run with `context`.
pub fn register(context: &ContextInitializer) {
    let mut settings = context.settings_mut();
    let natives = &mut settings.ext_natives;
    natives.insert("parseJson".into(), builtin_native_parse_json::INST.into());
    natives.insert("parseYaml".into(), builtin_parse_yaml::INST.into());
    natives.insert(
        "manifestJsonFromJson".into(),
        builtin_manifest_json_from_json::INST.into(),
    );
    natives.insert(
        "manifestYamlFromJson".into(),
        builtin_manifest_yaml_from_json::INST.into(),
    );
    natives.insert(
        "escapeStringRegex".into(),
        builtin_escape_string_regex::INST.into(),
    );
    natives.insert("regexMatch".into(), builtin_regex_match::INST.into());
    natives.insert("regexSubst".into(), builtin_regex_subst::INST.into());
    natives.insert("sha256".into(), builtin_sha256::INST.into());
}

fn runtime_error(context: &str, err: impl std::fmt::Display) -> ErrorKind {
    ErrorKind::RuntimeError(format!("{context}: {err}").into())
}

fn compile(regex: &str) -> JResult<Regex> {
    Ok(Regex::new(regex).map_err(|e| runtime_error("invalid regex", e))?)
}

#[builtin]
fn builtin_native_parse_json(json: IStr) -> JResult<Val> {
    builtin_parse_json(json)
}

#[builtin]
fn builtin_parse_yaml(yaml: IStr) -> JResult<Val> {
    let docs = yaml_documents(&yaml).map_err(|e| runtime_error("parsing yaml", e))?;
    builtin_parse_json(Value::Array(docs).to_string().into())
}

#[builtin]
fn builtin_manifest_json_from_json(json: IStr, indent: f64) -> JResult<String> {
    let width = indent.max(0.0) as usize;
    Ok(reindent_json(&json, width).map_err(|e| runtime_error("manifestJsonFromJson", e))?)
}

#[builtin]
fn builtin_manifest_yaml_from_json(json: IStr) -> JResult<String> {
    let value: Value =
        serde_json::from_str(&json).map_err(|e| runtime_error("manifestYamlFromJson", e))?;
    Ok(serde_yaml::to_string(&value).map_err(|e| runtime_error("manifestYamlFromJson", e))?)
}

#[builtin]
fn builtin_escape_string_regex(str: IStr) -> JResult<String> {
    Ok(regex::escape(&str))
}

#[builtin]
fn builtin_regex_match(regex: IStr, string: IStr) -> JResult<bool> {
    Ok(compile(&regex)?.is_match(&string))
}

#[builtin]
fn builtin_regex_subst(regex: IStr, src: IStr, repl: IStr) -> JResult<String> {
    Ok(compile(&regex)?.replace_all(&src, &*repl).into_owned())
}

#[builtin]
fn builtin_sha256(str: IStr) -> JResult<String> {
    Ok(sha256_hex(&str))
}

// ============================================================================
// Plain helpers
// ============================================================================

/// Every document of a YAML stream, as JSON values.
fn yaml_documents(yaml: &str) -> Result<Vec<Value>, serde_yaml::Error> {
    serde_yaml::Deserializer::from_str(yaml)
        .map(Value::deserialize)
        .collect()
}

/// Re-render JSON text with `indent` spaces per level and a final newline.
fn reindent_json(json: &str, indent: usize) -> Result<String, serde_json::Error> {
    use serde::Serialize;

    let value: Value = serde_json::from_str(json.trim())?;
    let spaces = " ".repeat(indent);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(spaces.as_bytes());
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    out.push(b'\n');
    Ok(String::from_utf8_lossy(&out).into_owned())
}

fn sha256_hex(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}
