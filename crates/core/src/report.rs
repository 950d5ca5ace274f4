//! Validation report and rubric weight domain types.
//!
//! The rule engine in `draftsmith-validation` produces a [`ValidationReport`]
//! per candidate; the orchestrator and prompt builder only ever consume the
//! types defined here.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ValidationError;

/// Identifiers for the rubric checks, in report order.
pub mod check {
    pub const TLDR_SECTION: &str = "tldr_section";
    pub const HEADING_HIERARCHY: &str = "heading_hierarchy";
    pub const CALLOUTS: &str = "callouts";
    pub const DIVIDERS: &str = "dividers";
    pub const CODE_CONTEXT: &str = "code_context";
    pub const IMAGE_PLACEHOLDERS: &str = "image_placeholders";

    /// Synthetic identifiers for the preservation penalties.
    pub const CONTENT_PRESERVATION: &str = "content_preservation";
    pub const LATEX_PRESERVATION: &str = "latex_preservation";

    /// Sentinel used when nothing could be validated at all.
    pub const ALL: &str = "all";

    /// All rubric check identifiers, in report order.
    pub const RUBRIC: &[&str] = &[
        TLDR_SECTION,
        HEADING_HIERARCHY,
        CALLOUTS,
        DIVIDERS,
        CODE_CONTEXT,
        IMAGE_PLACEHOLDERS,
    ];
}

/// Per-check rubric weights.
///
/// Equal weighting by default; the distribution is configuration, not code.
/// `score = passed weight / total weight` before preservation penalties.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RubricWeights {
    #[serde(default = "default_weight")]
    pub tldr_section: f64,

    #[serde(default = "default_weight")]
    pub heading_hierarchy: f64,

    #[serde(default = "default_weight")]
    pub callouts: f64,

    #[serde(default = "default_weight")]
    pub dividers: f64,

    #[serde(default = "default_weight")]
    pub code_context: f64,

    #[serde(default = "default_weight")]
    pub image_placeholders: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl Default for RubricWeights {
    fn default() -> Self {
        Self {
            tldr_section: 1.0,
            heading_hierarchy: 1.0,
            callouts: 1.0,
            dividers: 1.0,
            code_context: 1.0,
            image_placeholders: 1.0,
        }
    }
}

impl RubricWeights {
    /// Weight of a single check by identifier.
    pub fn weight_of(&self, id: &str) -> Option<f64> {
        match id {
            check::TLDR_SECTION => Some(self.tldr_section),
            check::HEADING_HIERARCHY => Some(self.heading_hierarchy),
            check::CALLOUTS => Some(self.callouts),
            check::DIVIDERS => Some(self.dividers),
            check::CODE_CONTEXT => Some(self.code_context),
            check::IMAGE_PLACEHOLDERS => Some(self.image_placeholders),
            _ => None,
        }
    }

    /// Sum of all rubric weights.
    pub fn total(&self) -> f64 {
        check::RUBRIC
            .iter()
            .filter_map(|&id| self.weight_of(id))
            .sum()
    }

    /// Reject weight tables the scorer cannot divide by.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        for &id in check::RUBRIC {
            let w = self.weight_of(id).unwrap_or(0.0);
            if w < 0.0 || !w.is_finite() {
                return Err(ValidationError::InvalidWeights(format!(
                    "check '{id}' has weight {w}"
                )));
            }
        }
        if self.total() <= 0.0 {
            return Err(ValidationError::InvalidWeights(
                "total rubric weight must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// The outcome of scoring one candidate document.
///
/// `passed` and `failed` partition the rubric identifiers; the synthetic
/// preservation identifiers appear only in `failed`, and only when the
/// corresponding penalty fired. `feedback` carries diagnostics for failed
/// checks only. The map is ordered so identical input yields bit-identical
/// serialized reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Weighted fraction of rubric checks passed, after penalties; in [0, 1]
    pub score: f64,

    /// Rubric checks that succeeded, in report order
    pub passed: Vec<String>,

    /// Checks that failed, including synthetic preservation entries
    pub failed: Vec<String>,

    /// Diagnostics keyed by failed-check identifier
    pub feedback: BTreeMap<String, String>,
}

impl ValidationReport {
    /// Whether the score clears the acceptance threshold.
    pub fn meets(&self, threshold: f64) -> bool {
        self.score >= threshold
    }

    /// One-line feedback string for the attempt history.
    ///
    /// Mirrors the shape the retry prompt expects: missing identifiers first,
    /// then per-check diagnostics, `|`-separated.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if !self.failed.is_empty() {
            parts.push(format!("Missing elements: {}", self.failed.join(", ")));
        }
        for (id, message) in &self.feedback {
            parts.push(format!("{id}: {message}"));
        }
        if parts.is_empty() {
            parts.push("All formatting requirements met".into());
        }
        parts.join(" | ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_are_equal_and_valid() {
        let weights = RubricWeights::default();
        assert!((weights.total() - 6.0).abs() < f64::EPSILON);
        assert!(weights.validate().is_ok());
        for &id in check::RUBRIC {
            assert_eq!(weights.weight_of(id), Some(1.0));
        }
    }

    #[test]
    fn negative_weight_rejected() {
        let weights = RubricWeights {
            callouts: -1.0,
            ..Default::default()
        };
        assert!(weights.validate().is_err());
    }

    #[test]
    fn zero_total_rejected() {
        let weights = RubricWeights {
            tldr_section: 0.0,
            heading_hierarchy: 0.0,
            callouts: 0.0,
            dividers: 0.0,
            code_context: 0.0,
            image_placeholders: 0.0,
        };
        assert!(weights.validate().is_err());
    }

    #[test]
    fn summary_lists_missing_then_diagnostics() {
        let mut feedback = BTreeMap::new();
        feedback.insert(
            check::TLDR_SECTION.to_string(),
            "Missing TL;DR blockquote".to_string(),
        );
        let report = ValidationReport {
            score: 0.5,
            passed: vec![check::CALLOUTS.into()],
            failed: vec![check::TLDR_SECTION.into()],
            feedback,
        };
        let summary = report.summary();
        assert!(summary.starts_with("Missing elements: tldr_section"));
        assert!(summary.contains("Missing TL;DR blockquote"));
    }

    #[test]
    fn clean_summary_when_nothing_failed() {
        let report = ValidationReport {
            score: 1.0,
            passed: check::RUBRIC.iter().map(|s| s.to_string()).collect(),
            failed: vec![],
            feedback: BTreeMap::new(),
        };
        assert_eq!(report.summary(), "All formatting requirements met");
    }
}
