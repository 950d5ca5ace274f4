//! The refinement graph — the directed pipeline that produces the baseline
//! document and hands it to the formatting loop.
//!
//! Steps run strictly in order: introduction -> conclusion -> summary ->
//! titles -> assemble -> clarity/flow -> formatting. Each step returns a
//! [`StatePatch`] with only the fields it changed; an error patch short-
//! circuits everything downstream, including the formatting loop.

use std::sync::Arc;

use chrono::Utc;
use draftsmith_config::AppConfig;
use draftsmith_core::client::{CompletionRequest, LlmClient};
use draftsmith_core::error::{Error, ProviderError, Result};
use draftsmith_core::state::{RefinementResult, RefinementState, RunId, StatePatch};
use draftsmith_prompt::{
    clarity_flow_prompt, conclusion_prompt, introduction_prompt, summary_prompt, titles_prompt,
};
use draftsmith_validation::Validator;
use tracing::{debug, error, info, warn};

use crate::formatter::{FormatPhase, FormattingLoop};
use crate::titles::parse_title_options;

/// The full refinement pipeline for one document run.
///
/// Holds an explicitly constructed client handle scoped to the run — there
/// is no shared module-level state, so concurrent runs never contend.
pub struct RefinementPipeline {
    client: Arc<dyn LlmClient>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    persona_guidance: String,
    num_titles: u32,
    max_retries: u32,
    accept_threshold: f64,
    weights: draftsmith_core::report::RubricWeights,
}

impl RefinementPipeline {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            temperature: 0.3,
            max_tokens: None,
            persona_guidance: String::new(),
            num_titles: 3,
            max_retries: 3,
            accept_threshold: 0.85,
            weights: Default::default(),
        }
    }

    /// Build a pipeline from the application config.
    pub fn from_config(client: Arc<dyn LlmClient>, config: &AppConfig) -> Self {
        Self {
            client,
            model: config.default_model.clone(),
            temperature: config.default_temperature,
            max_tokens: Some(config.default_max_tokens),
            persona_guidance: config.persona.guidance.clone(),
            num_titles: config.titles.num_titles,
            max_retries: config.formatting.max_retries,
            accept_threshold: config.formatting.accept_threshold,
            weights: config.formatting.weights,
        }
    }

    pub fn with_persona_guidance(mut self, guidance: impl Into<String>) -> Self {
        self.persona_guidance = guidance.into();
        self
    }

    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    pub fn with_accept_threshold(mut self, threshold: f64) -> Self {
        self.accept_threshold = threshold;
        self
    }

    /// Run the whole pipeline on a raw draft.
    ///
    /// Returns the refinement result, or the upstream error when the
    /// baseline itself could not be produced. The formatting loop never
    /// contributes an error: its failures degrade to scored attempts.
    pub async fn run(&self, original_draft: &str) -> Result<RefinementResult> {
        let run_id = RunId::new();
        info!(%run_id, draft_len = original_draft.len(), "Starting refinement run");

        let mut state =
            RefinementState::new(original_draft).with_max_retries(self.max_retries);

        if state.error.is_none() {
            info!(%run_id, step = "generate_introduction", "Node start");
            let patch = self.generate_introduction(&state).await;
            state.apply(patch);
        }
        if state.error.is_none() {
            info!(%run_id, step = "generate_conclusion", "Node start");
            let patch = self.generate_conclusion(&state).await;
            state.apply(patch);
        }
        if state.error.is_none() {
            info!(%run_id, step = "generate_summary", "Node start");
            let patch = self.generate_summary(&state).await;
            state.apply(patch);
        }
        if state.error.is_none() {
            info!(%run_id, step = "generate_titles", "Node start");
            let patch = self.generate_titles(&state).await;
            state.apply(patch);
        }
        if state.error.is_none() {
            info!(%run_id, step = "assemble_draft", "Node start");
            let patch = self.assemble_draft(&state);
            state.apply(patch);
        }
        if state.error.is_none() {
            info!(%run_id, step = "clarity_flow", "Node start");
            let patch = self.clarity_flow(&state).await;
            state.apply(patch);
        }

        if let Some(err) = &state.error {
            error!(%run_id, error = %err, "Pipeline step failed, downstream steps skipped");
        }

        // Upstream failure cancels formatting before the first attempt.
        if state.error.is_none() {
            let validator = Validator::new(self.weights).map_err(Error::Validation)?;
            let mut formatter =
                FormattingLoop::new(self.client.clone(), validator, &self.model)
                    .with_temperature(self.temperature)
                    .with_persona_guidance(&self.persona_guidance)
                    .with_accept_threshold(self.accept_threshold);
            if let Some(max_tokens) = self.max_tokens {
                formatter = formatter.with_max_tokens(max_tokens);
            }

            let phase = formatter.run(&mut state).await;
            info!(
                %run_id,
                %phase,
                attempts = state.formatting_attempts,
                score = ?state.formatting_validation_score,
                "Formatting loop finished"
            );
            debug_assert!(phase.is_terminal());
        } else {
            warn!(%run_id, "Formatting loop not started due to upstream error");
        }

        if let Some(message) = state.error {
            return Err(Error::Internal(message));
        }

        let refined_draft = state
            .refined_draft
            .ok_or_else(|| Error::Internal("refinement finished without a draft".into()))?;
        let summary = state
            .summary
            .ok_or_else(|| Error::Internal("refinement finished without a summary".into()))?;

        info!(%run_id, "Refinement run complete");
        Ok(RefinementResult {
            refined_draft,
            formatted_draft: state.formatted_draft,
            summary,
            title_options: state.title_options.unwrap_or_default(),
            clarity_flow_suggestions: state.clarity_flow_suggestions,
            formatting_validation_score: state.formatting_validation_score,
            formatting_missing_elements: state.formatting_missing_elements,
            formatting_present_elements: state.formatting_present_elements,
            formatting_feedback_history: state.formatting_feedback_history,
            formatting_attempts: state.formatting_attempts,
            generated_at: Utc::now(),
        })
    }

    async fn complete_text(&self, prompt: String) -> std::result::Result<String, ProviderError> {
        let mut request =
            CompletionRequest::new(&self.model, prompt).with_temperature(self.temperature);
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        Ok(self.client.complete(request).await?.into_text())
    }

    async fn generate_introduction(&self, state: &RefinementState) -> StatePatch {
        match self
            .complete_text(introduction_prompt(&state.original_draft))
            .await
        {
            Ok(text) if !text.trim().is_empty() => StatePatch::introduction(text.trim()),
            Ok(_) => StatePatch::error("Failed to generate valid introduction"),
            Err(e) => StatePatch::error(format!("Introduction generation failed: {e}")),
        }
    }

    async fn generate_conclusion(&self, state: &RefinementState) -> StatePatch {
        match self
            .complete_text(conclusion_prompt(&state.original_draft))
            .await
        {
            Ok(text) if !text.trim().is_empty() => StatePatch::conclusion(text.trim()),
            Ok(_) => StatePatch::error("Failed to generate valid conclusion"),
            Err(e) => StatePatch::error(format!("Conclusion generation failed: {e}")),
        }
    }

    async fn generate_summary(&self, state: &RefinementState) -> StatePatch {
        match self
            .complete_text(summary_prompt(&state.original_draft))
            .await
        {
            Ok(text) if !text.trim().is_empty() => StatePatch::summary(text.trim()),
            Ok(_) => StatePatch::error("Failed to generate valid summary"),
            Err(e) => StatePatch::error(format!("Summary generation failed: {e}")),
        }
    }

    async fn generate_titles(&self, state: &RefinementState) -> StatePatch {
        match self
            .complete_text(titles_prompt(&state.original_draft, self.num_titles))
            .await
        {
            Ok(response) => {
                let options = parse_title_options(&response);
                debug!(count = options.len(), "Parsed title options");
                StatePatch::title_options(options)
            }
            Err(e) => StatePatch::error(format!("Title generation failed: {e}")),
        }
    }

    /// Wrap the original draft with the generated introduction and
    /// conclusion. No LLM call.
    fn assemble_draft(&self, state: &RefinementState) -> StatePatch {
        let mut missing = Vec::new();
        if state.introduction.is_none() {
            missing.push("introduction");
        }
        if state.conclusion.is_none() {
            missing.push("conclusion");
        }
        if state.original_draft.trim().is_empty() {
            missing.push("original_draft");
        }
        if !missing.is_empty() {
            return StatePatch::error(format!(
                "Cannot assemble draft, missing components: {}",
                missing.join(", ")
            ));
        }

        let refined = format!(
            "## Introduction\n\n{}\n\n{}\n\n## Conclusion\n\n{}",
            state.introduction.as_deref().unwrap_or_default(),
            state.original_draft,
            state.conclusion.as_deref().unwrap_or_default(),
        );
        StatePatch::refined_draft(refined)
    }

    async fn clarity_flow(&self, state: &RefinementState) -> StatePatch {
        let Some(refined) = &state.refined_draft else {
            return StatePatch::error(
                "Refined draft is missing, cannot generate clarity/flow suggestions",
            );
        };

        let input_words = refined.split_whitespace().count();
        match self.complete_text(clarity_flow_prompt(refined)).await {
            Ok(text) if !text.trim().is_empty() => {
                let output_words = text.split_whitespace().count();
                debug!(input_words, output_words, "Clarity/flow word counts");
                if (output_words as f64) < input_words as f64 * 0.9 {
                    warn!(
                        input_words,
                        output_words,
                        "Significant content reduction in clarity/flow suggestions"
                    );
                }
                StatePatch::clarity_flow(text.trim())
            }
            Ok(_) => {
                StatePatch::clarity_flow("No specific clarity or flow suggestions identified.")
            }
            Err(e) => StatePatch::error(format!("Clarity/flow suggestion generation failed: {e}")),
        }
    }
}
