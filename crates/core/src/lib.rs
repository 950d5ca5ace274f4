//! # Draftsmith Core
//!
//! Domain types, traits, and error definitions for the Draftsmith content
//! pipeline. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The LLM backend is a trait here; implementations live in
//! `draftsmith-providers`. The validation engine and prompt builder consume
//! only the report/history types defined here. This enables:
//! - Swapping providers via configuration
//! - Easy testing with scripted mock clients
//! - Clean dependency graph (all crates depend inward on core)

pub mod attempt;
pub mod client;
pub mod error;
pub mod report;
pub mod state;

// Re-export key types at crate root for ergonomics
pub use attempt::AttemptRecord;
pub use client::{Completion, CompletionRequest, LlmClient, StructuredMessage};
pub use error::{Error, ProviderError, Result, ValidationError};
pub use report::{RubricWeights, ValidationReport, check};
pub use state::{
    FormattingUpdate, RefinementResult, RefinementState, RunId, StatePatch, TitleOption,
};
