//! The formatting orchestrator — a bounded, validator-gated retry loop.
//!
//! Drives attempt after attempt: build prompt, call the LLM, score the
//! candidate, then accept, retry with a stricter prompt, or stop at the
//! ceiling. Every failure mode — empty baseline, provider error, validator
//! error, low score — degrades to a scored attempt record; nothing escapes
//! the loop, and the last candidate is always surfaced.

use std::sync::Arc;

use draftsmith_core::attempt::AttemptRecord;
use draftsmith_core::client::{CompletionRequest, LlmClient};
use draftsmith_core::state::{FormattingUpdate, RefinementState, StatePatch};
use draftsmith_prompt::formatting_prompt;
use draftsmith_validation::Validator;
use tracing::{debug, info, warn};

/// Phases of the formatting loop.
///
/// `Pending -> Attempting -> Validating -> {Accepted, Retrying, Exhausted,
/// Failed}`; `Retrying` loops back to `Attempting`. `Accepted`, `Exhausted`,
/// and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatPhase {
    /// No attempt made yet
    Pending,
    /// Prompt built, LLM call in flight
    Attempting,
    /// Completion received, scoring in progress
    Validating,
    /// Candidate met the acceptance threshold
    Accepted,
    /// Score below threshold, another attempt allowed
    Retrying,
    /// Ceiling reached; last candidate kept as best effort
    Exhausted,
    /// Baseline missing; no LLM call was made
    Failed,
}

impl std::fmt::Display for FormatPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FormatPhase::Pending => "pending",
            FormatPhase::Attempting => "attempting",
            FormatPhase::Validating => "validating",
            FormatPhase::Accepted => "accepted",
            FormatPhase::Retrying => "retrying",
            FormatPhase::Exhausted => "exhausted",
            FormatPhase::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

impl FormatPhase {
    /// Whether the loop stops in this phase.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FormatPhase::Accepted | FormatPhase::Exhausted | FormatPhase::Failed
        )
    }
}

/// The validator-gated formatting loop.
///
/// Owns the retry bookkeeping and termination policy. Attempts are strictly
/// sequential: attempt N+1 starts only after attempt N's record is committed
/// to the state, because the stricter prompt reads that record.
pub struct FormattingLoop {
    client: Arc<dyn LlmClient>,
    validator: Validator,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    persona_guidance: String,
    accept_threshold: f64,
}

impl FormattingLoop {
    pub fn new(client: Arc<dyn LlmClient>, validator: Validator, model: impl Into<String>) -> Self {
        Self {
            client,
            validator,
            model: model.into(),
            temperature: 0.3,
            max_tokens: None,
            persona_guidance: String::new(),
            accept_threshold: 0.85,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_persona_guidance(mut self, guidance: impl Into<String>) -> Self {
        self.persona_guidance = guidance.into();
        self
    }

    pub fn with_accept_threshold(mut self, threshold: f64) -> Self {
        self.accept_threshold = threshold;
        self
    }

    /// Run the loop against the state's `refined_draft` baseline.
    ///
    /// Mutates only the formatting-prefixed fields and `formatted_draft`,
    /// once per attempt, and returns the terminal phase.
    pub async fn run(&self, state: &mut RefinementState) -> FormatPhase {
        let baseline = match &state.refined_draft {
            Some(draft) if !draft.trim().is_empty() => draft.clone(),
            _ => {
                warn!("No baseline document; formatting loop will not call the provider");
                state.apply(StatePatch::formatting(FormattingUpdate {
                    candidate: None,
                    record: AttemptRecord::synthetic(
                        state.formatting_attempts + 1,
                        "No refined draft to format",
                    ),
                }));
                return FormatPhase::Failed;
            }
        };

        let max_attempts = state.max_formatting_retries.max(1);

        while state.formatting_attempts < max_attempts {
            let attempt = state.formatting_attempts + 1;
            let prompt = formatting_prompt(
                &baseline,
                &self.persona_guidance,
                &state.formatting_feedback_history,
                max_attempts,
            );
            debug!(
                phase = %FormatPhase::Attempting,
                attempt,
                max_attempts,
                prompt_len = prompt.len(),
                "Requesting formatted candidate"
            );

            let mut request =
                CompletionRequest::new(&self.model, prompt).with_temperature(self.temperature);
            if let Some(max_tokens) = self.max_tokens {
                request = request.with_max_tokens(max_tokens);
            }

            match self.client.complete(request).await {
                Ok(completion) => {
                    let candidate = completion.into_text();
                    debug!(
                        phase = %FormatPhase::Validating,
                        attempt,
                        candidate_len = candidate.len(),
                        "Scoring candidate"
                    );

                    let record = match self.validator.score_against_baseline(&baseline, &candidate)
                    {
                        Ok(report) => AttemptRecord::from_report(attempt, &report),
                        Err(e) => {
                            warn!(attempt, error = %e, "Validator error, counting as failed attempt");
                            AttemptRecord::synthetic(attempt, format!("Validation error: {e}"))
                        }
                    };

                    let score = record.score;
                    state.apply(StatePatch::formatting(FormattingUpdate {
                        candidate: Some(candidate),
                        record,
                    }));

                    if score >= self.accept_threshold {
                        info!(attempt, score, "Formatting accepted");
                        return FormatPhase::Accepted;
                    }
                }
                Err(e) => {
                    // A provider failure is an attempt too: it counts toward
                    // the ceiling and lands in the audit trail.
                    warn!(attempt, error = %e, "Provider call failed");
                    state.apply(StatePatch::formatting(FormattingUpdate {
                        candidate: None,
                        record: AttemptRecord::synthetic(attempt, format!("Provider error: {e}")),
                    }));
                }
            }

            if state.formatting_attempts >= max_attempts {
                warn!(
                    attempts = state.formatting_attempts,
                    score = ?state.formatting_validation_score,
                    "Retry ceiling reached, keeping best-effort candidate"
                );
                return FormatPhase::Exhausted;
            }

            info!(
                phase = %FormatPhase::Retrying,
                attempt,
                score = ?state.formatting_validation_score,
                "Score below threshold, retrying with stricter prompt"
            );
        }

        FormatPhase::Exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use draftsmith_core::client::Completion;
    use draftsmith_core::error::ProviderError;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// A client that replays a scripted sequence of results and counts calls.
    struct ScriptedClient {
        script: Mutex<VecDeque<Result<Completion, ProviderError>>>,
        calls: AtomicU32,
    }

    impl ScriptedClient {
        fn new(script: Vec<Result<Completion, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: AtomicU32::new(0),
            })
        }

        /// Always replies with the same text.
        fn repeating(text: &str) -> Arc<Self> {
            let mut script = Vec::new();
            for _ in 0..16 {
                script.push(Ok(Completion::from(text)));
            }
            Self::new(script)
        }

        fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<Completion, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::Network("script exhausted".into())))
        }
    }

    /// A baseline whose fully formatted version is easy to construct.
    fn baseline_doc() -> String {
        "Ownership moves values between bindings. Borrowing lends access briefly. \
         Lifetimes tie every reference to a scope."
            .to_string()
    }

    /// A candidate that passes the full rubric and preserves `baseline_doc`.
    fn compliant_candidate() -> String {
        format!(
            "> **TL;DR**\n\
             > - Ownership moves\n\
             > - Borrowing lends\n\
             > - Lifetimes scope\n\n\
             ## Ownership\n\n\
             > \u{1F4A1} **Tip:** Moves are cheap.\n\n\
             {}\n\n\
             [IMAGE: ownership diagram]\n\n\
             ---\n\n\
             ## Borrowing\n\n\
             > \u{26A0}\u{FE0F} **Warning:** One mutable borrow at a time.\n\n\
             The borrow checker enforces the rules above.\n",
            baseline_doc()
        )
    }

    fn loop_with(client: Arc<dyn LlmClient>) -> FormattingLoop {
        FormattingLoop::new(client, Validator::with_default_weights().unwrap(), "mock-model")
    }

    fn state_with_baseline() -> RefinementState {
        let mut state = RefinementState::new("original");
        state.apply(StatePatch::refined_draft(baseline_doc()));
        state
    }

    #[tokio::test]
    async fn clean_pass_accepts_first_attempt() {
        let client = ScriptedClient::new(vec![Ok(Completion::from(
            compliant_candidate().as_str(),
        ))]);
        let mut state = state_with_baseline();

        let phase = loop_with(client.clone()).run(&mut state).await;

        assert_eq!(phase, FormatPhase::Accepted);
        assert_eq!(state.formatting_attempts, 1);
        assert_eq!(state.formatting_feedback_history.len(), 1);
        assert_eq!(client.call_count(), 1);
        assert!(state.formatting_validation_score.unwrap() >= 0.85);
        assert_eq!(state.formatted_draft.unwrap(), compliant_candidate());
    }

    #[tokio::test]
    async fn forced_exhaustion_keeps_last_candidate() {
        // Always omits the TL;DR block (and everything else structural).
        let client = ScriptedClient::repeating(&baseline_doc());
        let mut state = state_with_baseline();

        let phase = loop_with(client.clone()).run(&mut state).await;

        assert_eq!(phase, FormatPhase::Exhausted);
        assert_eq!(state.formatting_attempts, 3);
        assert_eq!(state.formatting_feedback_history.len(), 3);
        assert_eq!(client.call_count(), 3);
        // Best effort: the third candidate is surfaced verbatim.
        assert_eq!(state.formatted_draft.unwrap(), baseline_doc());
        assert!(
            state
                .formatting_missing_elements
                .contains(&"tldr_section".to_string())
        );
    }

    #[tokio::test]
    async fn empty_baseline_short_circuits() {
        let client = ScriptedClient::repeating("anything");
        let mut state = RefinementState::new("original");
        // refined_draft never set

        let phase = loop_with(client.clone()).run(&mut state).await;

        assert_eq!(phase, FormatPhase::Failed);
        assert_eq!(client.call_count(), 0);
        assert_eq!(state.formatting_attempts, 1);
        let record = &state.formatting_feedback_history[0];
        assert_eq!(record.score, 0.0);
        assert_eq!(record.missing, vec!["all".to_string()]);
    }

    #[tokio::test]
    async fn blank_baseline_also_short_circuits() {
        let client = ScriptedClient::repeating("anything");
        let mut state = RefinementState::new("original");
        state.apply(StatePatch::refined_draft("   \n  "));

        let phase = loop_with(client.clone()).run(&mut state).await;

        assert_eq!(phase, FormatPhase::Failed);
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn provider_error_counts_as_attempt_then_recovers() {
        let client = ScriptedClient::new(vec![
            Err(ProviderError::Timeout("deadline exceeded".into())),
            Ok(Completion::from(compliant_candidate().as_str())),
        ]);
        let mut state = state_with_baseline();

        let phase = loop_with(client.clone()).run(&mut state).await;

        assert_eq!(phase, FormatPhase::Accepted);
        assert_eq!(state.formatting_attempts, 2);
        assert_eq!(client.call_count(), 2);

        let first = &state.formatting_feedback_history[0];
        assert_eq!(first.score, 0.0);
        assert!(first.feedback.contains("Provider error"));
        assert!(first.feedback.contains("deadline exceeded"));

        let second = &state.formatting_feedback_history[1];
        assert!(second.score >= 0.85);
    }

    #[tokio::test]
    async fn repeated_provider_failure_respects_ceiling() {
        let client = ScriptedClient::new(vec![
            Err(ProviderError::Network("down".into())),
            Err(ProviderError::Network("down".into())),
            Err(ProviderError::Network("down".into())),
            Err(ProviderError::Network("down".into())),
        ]);
        let mut state = state_with_baseline();

        let phase = loop_with(client.clone()).run(&mut state).await;

        assert_eq!(phase, FormatPhase::Exhausted);
        assert_eq!(client.call_count(), 3);
        assert_eq!(state.formatting_attempts, 3);
        // No candidate was ever produced.
        assert!(state.formatted_draft.is_none());
    }

    #[tokio::test]
    async fn attempts_and_history_stay_in_lockstep() {
        let client = ScriptedClient::repeating(&baseline_doc());
        let mut state = state_with_baseline();
        state.max_formatting_retries = 5;

        loop_with(client).run(&mut state).await;

        assert_eq!(state.formatting_attempts, 5);
        assert_eq!(state.formatting_feedback_history.len(), 5);
        for (i, record) in state.formatting_feedback_history.iter().enumerate() {
            assert_eq!(record.attempt as usize, i + 1);
        }
    }

    #[tokio::test]
    async fn structured_completion_is_normalized_before_validation() {
        use draftsmith_core::client::StructuredMessage;

        let client = ScriptedClient::new(vec![Ok(Completion::Structured(StructuredMessage {
            content: Some(compliant_candidate()),
            model: Some("mock-model".into()),
            metadata: serde_json::Map::new(),
        }))]);
        let mut state = state_with_baseline();

        let phase = loop_with(client).run(&mut state).await;

        assert_eq!(phase, FormatPhase::Accepted);
        assert_eq!(state.formatted_draft.unwrap(), compliant_candidate());
    }

    #[tokio::test]
    async fn content_loss_is_penalized_and_recorded() {
        // Structurally perfect candidate that drops the baseline's prose.
        let pretty_but_lossy = "> **TL;DR**\n> - A\n> - B\n> - C\n\n\
             ## One\n\n> \u{1F4A1} **Tip:** Short.\n\nBrand new words only here.\n\n\
             [IMAGE: diagram]\n\n---\n\n## Two\n\n\
             > \u{1F3AF} **Goal:** Different text entirely.\n";
        let client = ScriptedClient::repeating(pretty_but_lossy);
        let mut state = state_with_baseline();

        let phase = loop_with(client).run(&mut state).await;

        // Rubric-perfect but content-lossy: 1.0 * 0.8 = 0.8 < 0.85, so the
        // loop retries to exhaustion and the penalty shows in every record.
        assert_eq!(phase, FormatPhase::Exhausted);
        for record in &state.formatting_feedback_history {
            assert!(record.missing.contains(&"content_preservation".to_string()));
            assert!(record.score < 0.85);
        }
    }

    #[test]
    fn terminal_phases_are_marked() {
        assert!(FormatPhase::Accepted.is_terminal());
        assert!(FormatPhase::Exhausted.is_terminal());
        assert!(FormatPhase::Failed.is_terminal());
        assert!(!FormatPhase::Pending.is_terminal());
        assert!(!FormatPhase::Attempting.is_terminal());
        assert!(!FormatPhase::Validating.is_terminal());
        assert!(!FormatPhase::Retrying.is_terminal());
    }
}
