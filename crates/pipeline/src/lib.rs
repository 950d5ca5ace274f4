//! The Draftsmith pipeline — refinement graph plus the validator-gated
//! formatting loop.
//!
//! [`RefinementPipeline`] turns a raw draft into an assembled baseline
//! (introduction, conclusion, summary, titles, clarity suggestions), then
//! [`FormattingLoop`] asks the LLM to add structural formatting, scores each
//! candidate deterministically, and retries with escalating strictness up to
//! a bounded ceiling. The last candidate is always delivered, even when
//! imperfect.

pub mod formatter;
pub mod graph;
pub mod titles;

pub use formatter::{FormatPhase, FormattingLoop};
pub use graph::RefinementPipeline;
pub use titles::{fallback_options, parse_title_options};
