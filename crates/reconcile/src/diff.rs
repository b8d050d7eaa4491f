//! Comparison of reconciled and live state

use serde::Serialize;
use serde_json::Value;

use crate::state::{RealState, ReconciledState};

/// Id used when the desired tree is not keyed by resource
pub const WHOLE_TREE: &str = ".";

/// How a resource differs from its live counterpart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangeKind {
    /// No live counterpart
    Added,
    /// Live counterpart differs
    Modified,
    /// Live counterpart matches
    Unchanged,
}

/// A diff between desired and live state of one resource
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceDiff {
    /// Resource id (key in the desired tree)
    pub id: String,
    /// Classification
    pub kind: ChangeKind,
    /// Desired value
    pub desired: Value,
    /// Live value, if any
    pub live: Option<Value>,
}

impl ResourceDiff {
    fn new(id: impl Into<String>, desired: &Value, live: Option<&Value>) -> Self {
        let kind = match live {
            None => ChangeKind::Added,
            Some(live) if live == desired => ChangeKind::Unchanged,
            Some(_) => ChangeKind::Modified,
        };
        Self {
            id: id.into(),
            kind,
            desired: desired.clone(),
            live: live.cloned(),
        }
    }

    /// Check if anything would change
    pub fn has_changes(&self) -> bool {
        self.kind != ChangeKind::Unchanged
    }

    /// Unified text diff from live to desired, empty when unchanged
    pub fn unified(&self) -> String {
        if !self.has_changes() {
            return String::new();
        }

        let live = self.live.as_ref().map(pretty).unwrap_or_default();
        let desired = pretty(&self.desired);
        similar::TextDiff::from_lines(&live, &desired)
            .unified_diff()
            .context_radius(3)
            .header(&format!("live/{}", self.id), &format!("desired/{}", self.id))
            .to_string()
    }
}

fn pretty(value: &Value) -> String {
    let mut text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    text.push('\n');
    text
}

/// Compare a desired tree with its live counterpart
///
/// When `desired` is an object each key is a resource and is looked up in
/// `real` under the same key. Anything else is compared as a single
/// resource with id [`WHOLE_TREE`]. Results follow the key order of
/// `desired`.
pub fn diff(desired: &Value, real: &Value) -> Vec<ResourceDiff> {
    match desired {
        Value::Object(resources) => resources
            .iter()
            .map(|(id, want)| ResourceDiff::new(id, want, real.get(id)))
            .collect(),
        _ => {
            let live = (!real.is_null()).then_some(real);
            vec![ResourceDiff::new(WHOLE_TREE, desired, live)]
        }
    }
}

/// [`diff`] for pipeline states
pub fn compute_diffs(desired: &ReconciledState, real: &RealState) -> Vec<ResourceDiff> {
    diff(desired.value(), real.value())
}

/// Diff summary statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffSummary {
    pub additions: usize,
    pub modifications: usize,
    pub unchanged: usize,
}

impl DiffSummary {
    /// Create a summary from a list of diffs
    pub fn from_diffs(diffs: &[ResourceDiff]) -> Self {
        let mut summary = Self::default();
        for diff in diffs {
            match diff.kind {
                ChangeKind::Added => summary.additions += 1,
                ChangeKind::Modified => summary.modifications += 1,
                ChangeKind::Unchanged => summary.unchanged += 1,
            }
        }
        summary
    }

    /// Total number of changes
    pub fn total(&self) -> usize {
        self.additions + self.modifications
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}
