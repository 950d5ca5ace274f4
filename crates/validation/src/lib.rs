//! Formatting validation for Draftsmith — deterministic, regex-based checks
//! that score a formatted draft against the structural rubric and verify that
//! formatting never destroyed prose or LaTeX.
//!
//! No LLM calls, no hidden state: every operation here is a pure function of
//! its input text, so the retry loop can trust the scores it acts on.

pub mod checks;
pub mod engine;
pub mod preservation;

pub use checks::{CheckOutcome, RubricPatterns};
pub use engine::Validator;
pub use preservation::{content_preserved, latex_preserved};
