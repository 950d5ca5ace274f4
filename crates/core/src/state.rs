//! Refinement state — the record threaded through the pipeline.
//!
//! Each graph step returns a [`StatePatch`] holding only the fields it
//! changed; [`RefinementState::apply`] merges patches between steps. The
//! formatting loop commits its per-attempt bookkeeping as one
//! [`FormattingUpdate`], so the history entry and the attempt counter can
//! never drift apart.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::attempt::AttemptRecord;

/// Unique identifier for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single generated title/subtitle option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleOption {
    /// The main title suggestion
    pub title: String,

    /// The corresponding subtitle suggestion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    /// Why this title fits the draft
    #[serde(default)]
    pub reasoning: String,
}

/// The state record for one refinement run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinementState {
    /// The raw draft the pipeline starts from
    pub original_draft: String,

    /// Generated introduction section
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introduction: Option<String>,

    /// Generated conclusion section
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<String>,

    /// Concise summary of the whole post
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Suggested title/subtitle options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_options: Option<Vec<TitleOption>>,

    /// Assembled draft — the baseline the formatting loop reads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refined_draft: Option<String>,

    /// Current formatting candidate, overwritten each attempt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_draft: Option<String>,

    /// Clarity and flow suggestions for the refined draft
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clarity_flow_suggestions: Option<String>,

    /// Terminal failure marker for the outer pipeline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Formatting attempts completed so far
    #[serde(default)]
    pub formatting_attempts: u32,

    /// Ceiling on formatting attempts
    #[serde(default = "default_max_retries")]
    pub max_formatting_retries: u32,

    /// Append-only audit trail, one record per attempt
    #[serde(default)]
    pub formatting_feedback_history: Vec<AttemptRecord>,

    /// Most recent validation score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatting_validation_score: Option<f64>,

    /// Most recent failed-check identifiers
    #[serde(default)]
    pub formatting_missing_elements: Vec<String>,

    /// Most recent passed-check identifiers
    #[serde(default)]
    pub formatting_present_elements: Vec<String>,
}

fn default_max_retries() -> u32 {
    3
}

impl RefinementState {
    /// Create the initial state for a run; only `original_draft` populated.
    pub fn new(original_draft: impl Into<String>) -> Self {
        Self {
            original_draft: original_draft.into(),
            introduction: None,
            conclusion: None,
            summary: None,
            title_options: None,
            refined_draft: None,
            formatted_draft: None,
            clarity_flow_suggestions: None,
            error: None,
            formatting_attempts: 0,
            max_formatting_retries: default_max_retries(),
            formatting_feedback_history: Vec::new(),
            formatting_validation_score: None,
            formatting_missing_elements: Vec::new(),
            formatting_present_elements: Vec::new(),
        }
    }

    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_formatting_retries = max;
        self
    }

    /// Merge a step's patch into the state.
    pub fn apply(&mut self, patch: StatePatch) {
        if let Some(introduction) = patch.introduction {
            self.introduction = Some(introduction);
        }
        if let Some(conclusion) = patch.conclusion {
            self.conclusion = Some(conclusion);
        }
        if let Some(summary) = patch.summary {
            self.summary = Some(summary);
        }
        if let Some(title_options) = patch.title_options {
            self.title_options = Some(title_options);
        }
        if let Some(refined_draft) = patch.refined_draft {
            self.refined_draft = Some(refined_draft);
        }
        if let Some(clarity) = patch.clarity_flow_suggestions {
            self.clarity_flow_suggestions = Some(clarity);
        }
        if let Some(error) = patch.error {
            self.error = Some(error);
        }
        if let Some(update) = patch.formatting {
            if let Some(candidate) = update.candidate {
                self.formatted_draft = Some(candidate);
            }
            self.formatting_validation_score = Some(update.record.score);
            self.formatting_missing_elements = update.record.missing.clone();
            self.formatting_present_elements = update.record.present.clone();
            self.formatting_feedback_history.push(update.record);
            self.formatting_attempts += 1;
        }
    }
}

/// The fields one pipeline step changed.
///
/// Steps never mutate [`RefinementState`] directly; they return a patch and
/// the driver merges it. An empty patch is a no-op.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introduction: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_options: Option<Vec<TitleOption>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refined_draft: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clarity_flow_suggestions: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatting: Option<FormattingUpdate>,
}

impl StatePatch {
    pub fn introduction(text: impl Into<String>) -> Self {
        Self {
            introduction: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn conclusion(text: impl Into<String>) -> Self {
        Self {
            conclusion: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn summary(text: impl Into<String>) -> Self {
        Self {
            summary: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn title_options(options: Vec<TitleOption>) -> Self {
        Self {
            title_options: Some(options),
            ..Default::default()
        }
    }

    pub fn refined_draft(text: impl Into<String>) -> Self {
        Self {
            refined_draft: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn clarity_flow(text: impl Into<String>) -> Self {
        Self {
            clarity_flow_suggestions: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn formatting(update: FormattingUpdate) -> Self {
        Self {
            formatting: Some(update),
            ..Default::default()
        }
    }
}

/// One attempt's bookkeeping, committed as a unit.
///
/// Applying this pushes exactly one history record and bumps the attempt
/// counter by exactly one — never one without the other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormattingUpdate {
    /// The new candidate, when the provider produced one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate: Option<String>,

    /// The audit record for this attempt
    pub record: AttemptRecord,
}

/// Final output of a refinement run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinementResult {
    /// The assembled draft with introduction and conclusion integrated
    pub refined_draft: String,

    /// The draft after the formatting pass, best attempt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_draft: Option<String>,

    /// A concise summary of the post
    pub summary: String,

    /// Suggested title/subtitle options
    pub title_options: Vec<TitleOption>,

    /// Clarity and flow suggestions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clarity_flow_suggestions: Option<String>,

    /// Last computed validation score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatting_validation_score: Option<f64>,

    /// Last attempt's failed-check identifiers
    #[serde(default)]
    pub formatting_missing_elements: Vec<String>,

    /// Last attempt's passed-check identifiers
    #[serde(default)]
    pub formatting_present_elements: Vec<String>,

    /// Full attempt audit trail, in order
    #[serde(default)]
    pub formatting_feedback_history: Vec<AttemptRecord>,

    /// Total formatting attempts made
    #[serde(default)]
    pub formatting_attempts: u32,

    /// When the run finished
    pub generated_at: DateTime<Utc>,
}
