//! The validation engine — scores a candidate against the formatting rubric
//! and applies preservation penalties.

use draftsmith_core::error::ValidationError;
use draftsmith_core::report::{RubricWeights, ValidationReport, check};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::checks::{
    CheckOutcome, RubricPatterns, check_callouts, check_code_context, check_dividers,
    check_heading_hierarchy, check_image_placeholders, check_tldr_section,
};
use crate::preservation::{content_preserved, latex_preserved};

/// Score multiplier when the candidate lost baseline prose.
const CONTENT_LOSS_PENALTY: f64 = 0.8;

/// Score multiplier when the candidate lost or altered LaTeX.
const LATEX_LOSS_PENALTY: f64 = 0.9;

/// Upper bound on document size; the rubric is line-oriented and anything
/// past this is not a blog draft.
const MAX_DOCUMENT_BYTES: usize = 2 * 1024 * 1024;

/// Deterministic formatting validator.
///
/// All patterns compile at construction; scoring is pure — identical input
/// yields identical reports across repeated calls.
pub struct Validator {
    weights: RubricWeights,
    patterns: RubricPatterns,
}

impl Validator {
    /// Build a validator with the given weight table.
    pub fn new(weights: RubricWeights) -> Result<Self, ValidationError> {
        weights.validate()?;
        Ok(Self {
            weights,
            patterns: RubricPatterns::compile()?,
        })
    }

    /// Build a validator with equal rubric weights.
    pub fn with_default_weights() -> Result<Self, ValidationError> {
        Self::new(RubricWeights::default())
    }

    /// Score a candidate against the rubric alone, no baseline comparison.
    pub fn score_formatting(&self, candidate: &str) -> Result<ValidationReport, ValidationError> {
        self.guard_size(candidate)?;
        Ok(self.run_rubric(candidate))
    }

    /// Score a candidate and penalize content or LaTeX lost since `baseline`.
    ///
    /// Preservation failures never fail the call: they multiply the score
    /// (content x0.8, LaTeX x0.9, composing) and append their synthetic
    /// identifiers to `failed`.
    pub fn score_against_baseline(
        &self,
        baseline: &str,
        candidate: &str,
    ) -> Result<ValidationReport, ValidationError> {
        self.guard_size(candidate)?;
        self.guard_size(baseline)?;

        let mut report = self.run_rubric(candidate);

        let (content_ok, content_msg) = content_preserved(baseline, candidate);
        if !content_ok {
            warn!(detail = %content_msg, "Content preservation check failed");
            report.failed.push(check::CONTENT_PRESERVATION.to_string());
            report
                .feedback
                .insert(check::CONTENT_PRESERVATION.to_string(), content_msg);
            report.score *= CONTENT_LOSS_PENALTY;
        }

        let (latex_ok, latex_msg) = latex_preserved(baseline, candidate);
        if !latex_ok {
            warn!(detail = %latex_msg, "LaTeX preservation check failed");
            report.failed.push(check::LATEX_PRESERVATION.to_string());
            report
                .feedback
                .insert(check::LATEX_PRESERVATION.to_string(), latex_msg);
            report.score *= LATEX_LOSS_PENALTY;
        }

        Ok(report)
    }

    fn guard_size(&self, text: &str) -> Result<(), ValidationError> {
        if text.len() > MAX_DOCUMENT_BYTES {
            return Err(ValidationError::DocumentTooLarge {
                bytes: text.len(),
                limit: MAX_DOCUMENT_BYTES,
            });
        }
        Ok(())
    }

    fn run_rubric(&self, candidate: &str) -> ValidationReport {
        let outcomes: [(&str, CheckOutcome); 6] = [
            (
                check::TLDR_SECTION,
                check_tldr_section(&self.patterns, candidate),
            ),
            (
                check::HEADING_HIERARCHY,
                check_heading_hierarchy(&self.patterns, candidate),
            ),
            (check::CALLOUTS, check_callouts(&self.patterns, candidate)),
            (check::DIVIDERS, check_dividers(&self.patterns, candidate)),
            (check::CODE_CONTEXT, check_code_context(candidate)),
            (
                check::IMAGE_PLACEHOLDERS,
                check_image_placeholders(&self.patterns, candidate),
            ),
        ];

        let mut passed = Vec::new();
        let mut failed = Vec::new();
        let mut feedback = BTreeMap::new();
        let mut passed_weight = 0.0;

        for (id, outcome) in outcomes {
            let weight = self.weights.weight_of(id).unwrap_or(0.0);
            if outcome.passed {
                passed_weight += weight;
                passed.push(id.to_string());
            } else {
                failed.push(id.to_string());
                feedback.insert(id.to_string(), outcome.detail);
            }
        }

        let score = passed_weight / self.weights.total();
        debug!(score, passed = passed.len(), failed = failed.len(), "Rubric scored");

        ValidationReport {
            score,
            passed,
            failed,
            feedback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A candidate that satisfies every rubric check.
    fn compliant_doc() -> String {
        "> **TL;DR**\n\
         > - Ownership moves values\n\
         > - Borrowing lends them\n\
         > - Lifetimes scope the loans\n\n\
         ## Ownership\n\n\
         > \u{1F4A1} **Tip:** Moves are cheap.\n\n\
         Ownership transfers on assignment. Here is a move:\n\n\
         ```rust\nlet a = String::new();\nlet b = a;\n```\n\n\
         [IMAGE: ownership transfer diagram]\n\n\
         ---\n\n\
         ## Borrowing\n\n\
         > \u{26A0}\u{FE0F} **Warning:** One mutable borrow at a time.\n\n\
         References never outlive their referents.\n"
            .to_string()
    }

    #[test]
    fn compliant_document_scores_full() {
        let validator = Validator::with_default_weights().unwrap();
        let report = validator.score_formatting(&compliant_doc()).unwrap();
        assert_eq!(report.failed, Vec::<String>::new());
        assert!((report.score - 1.0).abs() < f64::EPSILON, "{report:?}");
    }

    #[test]
    fn scoring_is_deterministic() {
        let validator = Validator::with_default_weights().unwrap();
        let doc = compliant_doc();
        let first = validator.score_formatting(&doc).unwrap();
        let second = validator.score_formatting(&doc).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn missing_tldr_costs_its_weight() {
        let validator = Validator::with_default_weights().unwrap();
        let doc = compliant_doc().replace("> **TL;DR**", "> **Summary**");
        let report = validator.score_formatting(&doc).unwrap();
        assert!(report.failed.contains(&"tldr_section".to_string()));
        assert!((report.score - 5.0 / 6.0).abs() < 1e-9, "{}", report.score);
    }

    #[test]
    fn weights_shift_the_score() {
        let weights = RubricWeights {
            tldr_section: 3.0,
            ..Default::default()
        };
        let validator = Validator::new(weights).unwrap();
        let doc = compliant_doc().replace("> **TL;DR**", "> **Summary**");
        let report = validator.score_formatting(&doc).unwrap();
        // 5 of 8 weight units pass.
        assert!((report.score - 5.0 / 8.0).abs() < 1e-9, "{}", report.score);
    }

    #[test]
    fn content_loss_penalty_applies() {
        let validator = Validator::with_default_weights().unwrap();
        let candidate = compliant_doc();
        let mut baseline = candidate.clone();
        baseline.push_str(
            "\nAn entire extra section of prose that the formatter deleted, \
             sentence after sentence of it, paragraph after paragraph of it, \
             none of which appears anywhere in the candidate text at all, \
             and plenty more words to push the loss past the threshold.",
        );

        let rubric_only = validator.score_formatting(&candidate).unwrap();
        let report = validator
            .score_against_baseline(&baseline, &candidate)
            .unwrap();

        assert!(report.failed.contains(&"content_preservation".to_string()));
        assert!(report.score < rubric_only.score);
        assert!((report.score - rubric_only.score * 0.8).abs() < 1e-9);
    }

    #[test]
    fn latex_loss_penalty_applies() {
        let validator = Validator::with_default_weights().unwrap();
        let mut baseline = compliant_doc();
        baseline.push_str(
            "\nThe famous identity $a^2 + b^2 = c^2$ anchors the whole proof \
             of the theorem in this closing section here.\n",
        );
        // Candidate keeps the sentence but drops the equation body.
        let candidate = compliant_doc()
            + "\nThe famous identity (equation omitted) anchors the whole proof \
               of the theorem in this closing section here.\n";

        let rubric_only = validator.score_formatting(&candidate).unwrap();
        let report = validator
            .score_against_baseline(&baseline, &candidate)
            .unwrap();

        assert!(report.failed.contains(&"latex_preservation".to_string()));
        assert!((report.score - rubric_only.score * 0.9).abs() < 1e-9);
    }

    #[test]
    fn penalties_compose_multiplicatively() {
        let validator = Validator::with_default_weights().unwrap();
        let candidate = compliant_doc();
        let mut baseline = candidate.clone();
        baseline.push_str(
            "\nDropped section: the equation $e = mc^2$ matters, and so does \
             every one of these surrounding words that the candidate no longer \
             carries anywhere, enough of them to trip the retention floor, \
             with still more filler words to be sure the ratio falls below it.",
        );

        let rubric_only = validator.score_formatting(&candidate).unwrap();
        let report = validator
            .score_against_baseline(&baseline, &candidate)
            .unwrap();

        assert!(report.failed.contains(&"content_preservation".to_string()));
        assert!(report.failed.contains(&"latex_preservation".to_string()));
        assert!((report.score - rubric_only.score * 0.8 * 0.9).abs() < 1e-9);
    }

    #[test]
    fn preserved_baseline_adds_no_penalty() {
        let validator = Validator::with_default_weights().unwrap();
        let candidate = compliant_doc();
        // The candidate itself as baseline: everything preserved.
        let report = validator
            .score_against_baseline(&candidate, &candidate)
            .unwrap();
        assert!(!report.failed.contains(&"content_preservation".to_string()));
        assert!(!report.failed.contains(&"latex_preservation".to_string()));
        assert!((report.score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn oversized_document_rejected() {
        let validator = Validator::with_default_weights().unwrap();
        let huge = "x".repeat(MAX_DOCUMENT_BYTES + 1);
        let err = validator.score_formatting(&huge).unwrap_err();
        assert!(matches!(err, ValidationError::DocumentTooLarge { .. }));
    }

    #[test]
    fn passed_and_failed_partition_the_rubric() {
        let validator = Validator::with_default_weights().unwrap();
        let doc = "Just some plain text without any structure.";
        let report = validator.score_formatting(doc).unwrap();
        for &id in check::RUBRIC {
            let in_passed = report.passed.iter().any(|p| p.as_str() == id);
            let in_failed = report.failed.iter().any(|f| f.as_str() == id);
            assert!(in_passed ^ in_failed, "check {id} must be in exactly one set");
        }
    }
}
