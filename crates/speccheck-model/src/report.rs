use serde::{Deserialize, Serialize};

use crate::spec::SpecField;

/// One field whose actual value does not satisfy the expected value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mismatch {
    pub field: SpecField,
    pub expected: String,
    pub actual: String,
    /// Human-readable explanation, e.g. "Expected 8GB, Found 16GB".
    pub reason: String,
}

/// Outcome of reconciling an expected spec against an actual spec.
///
/// Mismatches are kept in field declaration order. The report is built once
/// and exposes no mutation. `all_match` is serialized for readers of the JSON
/// output but recomputed from the mismatches when deserializing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ReportFields")]
pub struct MismatchReport {
    mismatches: Vec<Mismatch>,
    all_match: bool,
}

#[derive(Deserialize)]
struct ReportFields {
    #[serde(default)]
    mismatches: Vec<Mismatch>,
}

impl From<ReportFields> for MismatchReport {
    fn from(fields: ReportFields) -> Self {
        Self::from_mismatches(fields.mismatches)
    }
}

impl MismatchReport {
    pub fn from_mismatches(mut mismatches: Vec<Mismatch>) -> Self {
        mismatches.sort_by_key(|mismatch| mismatch.field);
        let all_match = mismatches.is_empty();
        Self {
            mismatches,
            all_match,
        }
    }

    pub fn mismatches(&self) -> &[Mismatch] {
        &self.mismatches
    }

    pub fn all_match(&self) -> bool {
        self.all_match
    }

    pub fn mismatch_count(&self) -> usize {
        self.mismatches.len()
    }

    pub fn is_mismatched(&self, field: SpecField) -> bool {
        self.mismatches.iter().any(|mismatch| mismatch.field == field)
    }

    pub fn get(&self, field: SpecField) -> Option<&Mismatch> {
        self.mismatches.iter().find(|mismatch| mismatch.field == field)
    }
}
