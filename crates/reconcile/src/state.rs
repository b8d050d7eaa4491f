//! State trees exchanged between the pipeline and providers

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Decoded evaluation output.
///
/// Always a complete tree of strings, numbers, booleans, null, arrays and
/// objects with unique keys.
pub type RawState = Value;

/// Decode evaluation output into a [`RawState`].
pub fn decode(text: &str) -> Result<RawState, serde_json::Error> {
    serde_json::from_str(text)
}

/// A provider's normalized form of a [`RawState`].
///
/// Only [`ConfiguredProvider::show`](crate::ConfiguredProvider::show) creates
/// these, and each one remembers which provider produced it. Its shape is
/// the provider's business.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledState {
    provider: String,
    value: Value,
}

impl ReconciledState {
    pub(crate) fn new(provider: impl Into<String>, value: Value) -> Self {
        Self {
            provider: provider.into(),
            value,
        }
    }

    /// Name of the provider that produced this state
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// The normalized tree
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Consume into the normalized tree
    pub fn into_value(self) -> Value {
        self.value
    }
}

/// Live target-system state limited to what a [`ReconciledState`] manages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RealState(Value);

impl RealState {
    pub(crate) fn new(value: Value) -> Self {
        Self(value)
    }

    /// The live tree
    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Consume into the live tree
    pub fn into_value(self) -> Value {
        self.0
    }
}

/// What applying one resource did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyOutcome {
    /// Resource did not exist and was created
    Created,
    /// Resource existed and was changed
    Modified,
    /// Resource already matched
    Unchanged,
}

/// Summary of one `apply` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplySummary {
    pub created: usize,
    pub modified: usize,
    pub unchanged: usize,
}

impl ApplySummary {
    /// Number of resources actually changed
    pub fn total_changes(&self) -> usize {
        self.created + self.modified
    }

    /// Total number of resources processed
    pub fn total(&self) -> usize {
        self.created + self.modified + self.unchanged
    }

    /// Check whether nothing had to change
    pub fn is_noop(&self) -> bool {
        self.total_changes() == 0
    }

    /// Count one resource outcome
    pub fn add(&mut self, outcome: ApplyOutcome) {
        match outcome {
            ApplyOutcome::Created => self.created += 1,
            ApplyOutcome::Modified => self.modified += 1,
            ApplyOutcome::Unchanged => self.unchanged += 1,
        }
    }

    /// Merge another summary into this one
    pub fn merge(&mut self, other: &ApplySummary) {
        self.created += other.created;
        self.modified += other.modified;
        self.unchanged += other.unchanged;
    }
}

impl FromIterator<ApplyOutcome> for ApplySummary {
    fn from_iter<I: IntoIterator<Item = ApplyOutcome>>(iter: I) -> Self {
        let mut summary = Self::default();
        for outcome in iter {
            summary.add(outcome);
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode() {
        assert_eq!(decode("{\"a\": [1, null]}\n").unwrap(), json!({"a": [1, null]}));
        assert!(decode("{\"a\": ").is_err());
        assert!(decode("").is_err());
    }

    #[test]
    fn test_summary() {
        let summary: ApplySummary = [
            ApplyOutcome::Created,
            ApplyOutcome::Unchanged,
            ApplyOutcome::Modified,
            ApplyOutcome::Unchanged,
        ]
        .into_iter()
        .collect();

        assert_eq!(summary.total(), 4);
        assert_eq!(summary.total_changes(), 2);
        assert!(!summary.is_noop());

        let mut merged = ApplySummary::default();
        merged.merge(&summary);
        merged.merge(&ApplySummary {
            unchanged: 1,
            ..Default::default()
        });
        assert_eq!(merged.unchanged, 3);
    }
}
