//! Prompts for the formatting pass that adds structural elements.
//!
//! Two templates: the base prompt for a first attempt, and a strict variant
//! for retries that carries the previous attempt's score and missing
//! elements. Substitution uses marker replacement, not `format!`, so braces
//! in LaTeX formulas like `\frac{a}{b}` pass through untouched.

use draftsmith_core::attempt::AttemptRecord;

const BASE_TEMPLATE: &str = r#"<task>
Transform this blog draft into a **scannable, visually structured** document.
</task>

<persona_instructions>
{persona_instructions}
</persona_instructions>

<blog_draft>
{blog_draft}
</blog_draft>

<formatting_rules>
1. **TL;DR**: Add at the VERY TOP as blockquote: > **TL;DR** followed by > - bullet points (3-5)
2. **BULLETS**: Convert prose lists (3+ items) to bullet points
3. **CALLOUTS**: Add 2-4 callouts using > 💡/⚠️/🎯 **Label:** format where they add value
4. **IMAGES**: Add [IMAGE: description] placeholders where visuals help
5. **HEADINGS**: Use H2 for sections, H3 for subsections (no H4+)
6. **DIVIDERS**: Add --- between major H2 sections
7. **CODE**: Ensure each code block has a lead-in explanation
8. **EQUATIONS**: Group related equations together in multi-line display blocks using $$. Avoid scattering inline equations.
</formatting_rules>

<constraints>
**PRESERVE ALL CONTENT** - Never remove or summarize
**PRESERVE CODE BLOCKS** - Exactly as-is
**PRESERVE LINKS/CITATIONS** - All references intact
**PRESERVE EQUATIONS** - Keep LaTeX syntax unchanged
</constraints>

<output_format>
Output complete formatted markdown. No JSON, no code fences around the document.
</output_format>
"#;

const STRICT_TEMPLATE: &str = r#"{retry_banner}
<task>
Transform this blog draft into a **scannable, visually structured** document.
**RETRY ATTEMPT** - Previous attempt incomplete. Focus on the missing elements.
</task>

<retry_context>
Attempt: {upcoming_attempt} of {max_attempts}
Previous Score: {previous_score}
Missing Elements:
{missing_elements}
</retry_context>

<persona_instructions>
{persona_instructions}
</persona_instructions>

<blog_draft>
{blog_draft}
</blog_draft>

<formatting_rules>
1. **TL;DR** (MANDATORY): Add at the VERY TOP as blockquote: > **TL;DR** followed by > - bullet points (3-5)
2. **BULLETS** (MANDATORY): Convert prose lists (3+ items) to bullet points
3. **CALLOUTS** (MANDATORY): Add 2-4 callouts using > 💡/⚠️/🎯 **Label:** format
4. **IMAGES** (MANDATORY): Add [IMAGE: description] placeholders
5. **HEADINGS** (MANDATORY): Use H2 for sections, H3 for subsections (no H4+)
6. **DIVIDERS** (MANDATORY): Add --- between major H2 sections
7. **CODE** (MANDATORY): Ensure each code block has a lead-in explanation
8. **EQUATIONS** (MANDATORY): Group related equations together in multi-line display blocks using $$. Avoid scattering inline equations.
</formatting_rules>

<constraints>
**PRESERVE ALL CONTENT** - Never remove or summarize
**PRESERVE CODE BLOCKS** - Exactly as-is
**PRESERVE LINKS/CITATIONS** - All references intact
**PRESERVE EQUATIONS** - Keep LaTeX syntax unchanged
</constraints>

<output_format>
Output complete formatted markdown. No JSON, no code fences around the document.
</output_format>
"#;

/// Sentinel shown when the previous attempt reported nothing missing.
const NONE_REPORTED: &str = "  - None reported";

/// Build the formatting prompt for the upcoming attempt.
///
/// With an empty `history` this is a first attempt and the base rules are
/// emitted. Otherwise the strict variant is built from the most recent
/// attempt record, with strictness scaling on the retry ordinal and
/// final-attempt wording once the ceiling leaves no room for another retry.
/// The draft and persona guidance are inserted verbatim, never truncated.
pub fn formatting_prompt(
    blog_draft: &str,
    persona_instructions: &str,
    history: &[AttemptRecord],
    max_attempts: u32,
) -> String {
    let Some(last) = history.last() else {
        return BASE_TEMPLATE
            .replace("{persona_instructions}", persona_instructions)
            .replace("{blog_draft}", blog_draft);
    };

    let retry_ordinal = history.len() as u32;
    let upcoming_attempt = retry_ordinal + 1;
    let strictness = retry_ordinal.min(3);

    let missing = if last.missing.is_empty() {
        NONE_REPORTED.to_string()
    } else {
        last.missing
            .iter()
            .map(|elem| format!("  - {elem}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let closing = if upcoming_attempt >= max_attempts {
        "This is your FINAL attempt - no further correction will be possible. Ensure ALL elements are present."
    } else {
        "Be thorough and ensure all required elements are included."
    };

    let banner = format!(
        "**RETRY {retry_ordinal} - STRICT ENFORCEMENT (strictness {strictness}/3)**\n\n\
         Previous Issues:\n{missing}\n\n\
         Latest validation score: {score:.2}\n\n\
         {closing}\n",
        score = last.score,
    );

    STRICT_TEMPLATE
        .replace("{retry_banner}", &banner)
        .replace("{upcoming_attempt}", &upcoming_attempt.to_string())
        .replace("{max_attempts}", &max_attempts.to_string())
        .replace("{previous_score}", &format!("{:.2}", last.score))
        .replace("{missing_elements}", &missing)
        .replace("{persona_instructions}", persona_instructions)
        .replace("{blog_draft}", blog_draft)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(attempt: u32, score: f64, missing: &[&str]) -> AttemptRecord {
        AttemptRecord {
            attempt,
            score,
            missing: missing.iter().map(|s| s.to_string()).collect(),
            present: vec![],
            feedback: String::new(),
        }
    }

    #[test]
    fn first_attempt_uses_base_rules() {
        let prompt = formatting_prompt("# My Draft", "Write plainly.", &[], 3);
        assert!(prompt.contains("# My Draft"));
        assert!(prompt.contains("Write plainly."));
        assert!(prompt.contains("<formatting_rules>"));
        assert!(!prompt.contains("RETRY"));
        assert!(!prompt.contains("MANDATORY"));
    }

    #[test]
    fn draft_is_inserted_verbatim() {
        let draft = "Equation: $\\frac{a}{b}$ and braces {not a placeholder}.";
        let prompt = formatting_prompt(draft, "", &[], 3);
        assert!(prompt.contains(draft));
    }

    #[test]
    fn retry_carries_score_and_missing_elements() {
        let history = vec![record(1, 0.5, &["tldr_section", "callouts"])];
        let prompt = formatting_prompt("draft body", "persona", &history, 3);
        assert!(prompt.contains("RETRY 1"));
        assert!(prompt.contains("strictness 1/3"));
        assert!(prompt.contains("0.50"));
        assert!(prompt.contains("- tldr_section"));
        assert!(prompt.contains("- callouts"));
        assert!(prompt.contains("Attempt: 2 of 3"));
        assert!(prompt.contains("MANDATORY"));
        assert!(!prompt.contains("FINAL attempt"));
    }

    #[test]
    fn empty_missing_list_uses_sentinel() {
        let history = vec![record(1, 0.2, &[])];
        let prompt = formatting_prompt("draft", "", &history, 3);
        assert!(prompt.contains("None reported"));
    }

    #[test]
    fn final_attempt_changes_wording() {
        let history = vec![
            record(1, 0.3, &["tldr_section"]),
            record(2, 0.4, &["tldr_section"]),
        ];
        let prompt = formatting_prompt("draft", "", &history, 3);
        assert!(prompt.contains("Attempt: 3 of 3"));
        assert!(prompt.contains("FINAL attempt"));
    }

    #[test]
    fn strictness_caps_at_three() {
        let history: Vec<AttemptRecord> =
            (1..=5).map(|n| record(n, 0.1, &["callouts"])).collect();
        let prompt = formatting_prompt("draft", "", &history, 10);
        assert!(prompt.contains("strictness 3/3"));
    }

    #[test]
    fn long_draft_never_truncated() {
        let draft = "paragraph of content. ".repeat(5_000);
        let prompt = formatting_prompt(&draft, "", &[], 3);
        assert!(prompt.contains(&draft));
    }
}
