//! Attempt records — the audit trail of the formatting loop.

use serde::{Deserialize, Serialize};

use crate::report::{ValidationReport, check};

/// Immutable snapshot of one formatting attempt.
///
/// The ordered sequence of records for a run is append-only; the stricter
/// retry prompt reads the most recent entry, and any persistence layer
/// serializes records in attempt order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Attempt ordinal, 1-based
    pub attempt: u32,

    /// Validation score for this attempt's candidate
    pub score: f64,

    /// Check identifiers that failed
    pub missing: Vec<String>,

    /// Check identifiers that passed
    pub present: Vec<String>,

    /// Concatenated diagnostic string
    pub feedback: String,
}

impl AttemptRecord {
    /// Build a record from a validation report.
    pub fn from_report(attempt: u32, report: &ValidationReport) -> Self {
        Self {
            attempt,
            score: report.score,
            missing: report.failed.clone(),
            present: report.passed.clone(),
            feedback: report.summary(),
        }
    }

    /// Low-confidence synthetic record: nothing validated, everything missing.
    ///
    /// Used when the baseline is empty, the provider call failed, or the
    /// validator itself errored — the attempt still counts toward the ceiling.
    pub fn synthetic(attempt: u32, feedback: impl Into<String>) -> Self {
        Self {
            attempt,
            score: 0.0,
            missing: vec![check::ALL.to_string()],
            present: Vec::new(),
            feedback: feedback.into(),
        }
    }
}
