//! Individual rubric checks.
//!
//! Each check is a pure function of the candidate text: same input, same
//! outcome, no LLM involvement. Patterns are compiled once in
//! [`RubricPatterns::compile`] and shared across checks.

use draftsmith_core::error::ValidationError;
use regex::Regex;

/// The result of one rubric check.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub passed: bool,
    pub detail: String,
}

impl CheckOutcome {
    fn pass(detail: impl Into<String>) -> Self {
        Self {
            passed: true,
            detail: detail.into(),
        }
    }

    fn fail(detail: impl Into<String>) -> Self {
        Self {
            passed: false,
            detail: detail.into(),
        }
    }
}

/// Compiled patterns shared by the rubric checks.
#[derive(Debug)]
pub struct RubricPatterns {
    tldr_header: Regex,
    tldr_bullet: Regex,
    callout: Regex,
    divider: Regex,
    h2: Regex,
    h4_plus: Regex,
    image_placeholder: Regex,
    image_empty: Regex,
}

impl RubricPatterns {
    pub fn compile() -> Result<Self, ValidationError> {
        Ok(Self {
            tldr_header: compile("tldr_section", r"(?m)^>\s*\*\*TL;DR\*\*")?,
            tldr_bullet: compile("tldr_section", r"(?m)^>\s*-\s*\S")?,
            // Idea, warning, and target glyphs followed by a bold label.
            // The warning glyph may carry a variation selector.
            callout: compile(
                "callouts",
                r"(?m)^>\s*(\x{1F4A1}|\x{26A0}\x{FE0F}?|\x{1F3AF})\s*\*\*",
            )?,
            divider: compile("dividers", r"(?m)^-{3,}\s*$")?,
            h2: compile("heading_hierarchy", r"(?m)^##\s+\S")?,
            h4_plus: compile("heading_hierarchy", r"(?m)^#{4,}\s+\S")?,
            image_placeholder: compile("image_placeholders", r"\[IMAGE:\s*[^\]\s][^\]]*\]")?,
            image_empty: compile("image_placeholders", r"\[IMAGE:\s*\]")?,
        })
    }
}

fn compile(check: &str, pattern: &str) -> Result<Regex, ValidationError> {
    Regex::new(pattern).map_err(|e| ValidationError::RuleFailed {
        check: check.to_string(),
        reason: e.to_string(),
    })
}

/// Replace fenced code blocks with placeholders so markdown inside code
/// examples cannot trip the structural checks.
pub fn mask_code_blocks(content: &str) -> String {
    let mut masked = String::with_capacity(content.len());
    let mut in_code = false;
    for line in content.lines() {
        if line.trim_start().starts_with("```") {
            in_code = !in_code;
            masked.push_str("__CODE_FENCE__\n");
            continue;
        }
        if in_code {
            masked.push_str("__CODE_LINE__\n");
        } else {
            masked.push_str(line);
            masked.push('\n');
        }
    }
    masked
}

/// TL;DR block: `> **TL;DR**` near the top, followed by 3-5 bullet lines.
pub fn check_tldr_section(patterns: &RubricPatterns, content: &str) -> CheckOutcome {
    let Some(header) = patterns.tldr_header.find(content) else {
        return CheckOutcome::fail(
            "Missing TL;DR section with **TL;DR** header in blockquote format",
        );
    };

    if header.start() > 500 {
        return CheckOutcome::fail(format!(
            "TL;DR section found at position {}, should be within first 500 chars",
            header.start()
        ));
    }

    // The TL;DR block is the run of blockquote lines from the header down.
    let block: String = content[header.start()..]
        .lines()
        .take_while(|line| line.trim_start().starts_with('>'))
        .collect::<Vec<_>>()
        .join("\n");

    let bullet_count = patterns.tldr_bullet.find_iter(&block).count();
    if bullet_count < 3 {
        return CheckOutcome::fail(format!(
            "TL;DR has only {bullet_count} bullet(s), needs 3-5"
        ));
    }
    if bullet_count > 5 {
        return CheckOutcome::fail(format!(
            "TL;DR has {bullet_count} bullets, should be 3-5 for conciseness"
        ));
    }

    CheckOutcome::pass(format!("TL;DR section valid with {bullet_count} bullets"))
}

/// Heading hierarchy: H2/H3 only, at least one H2. Code blocks are masked
/// first so `#` comment lines inside fences don't count.
pub fn check_heading_hierarchy(patterns: &RubricPatterns, content: &str) -> CheckOutcome {
    let masked = mask_code_blocks(content);

    let violations: Vec<&str> = patterns
        .h4_plus
        .find_iter(&masked)
        .map(|m| m.as_str())
        .collect();
    if !violations.is_empty() {
        let example: String = violations[0].chars().take(60).collect();
        return CheckOutcome::fail(format!(
            "Found {} H4+ heading(s) - use H2/H3 only. Example: {example}",
            violations.len()
        ));
    }

    let h2_count = patterns.h2.find_iter(&masked).count();
    if h2_count == 0 {
        return CheckOutcome::fail("No H2 headings found - need section structure with ## headings");
    }

    CheckOutcome::pass(format!("Heading hierarchy valid: {h2_count} H2 heading(s)"))
}

/// Callouts: at least two blockquote lines with a recognized glyph and a
/// bold label.
pub fn check_callouts(patterns: &RubricPatterns, content: &str) -> CheckOutcome {
    let count = patterns.callout.find_iter(content).count();
    if count < 2 {
        return CheckOutcome::fail(format!(
            "Only {count} callout(s) found, need 2+ with idea/warning/target glyphs"
        ));
    }
    CheckOutcome::pass(format!("Found {count} callout(s)"))
}

/// Dividers: at least one `---` between two H2 sections. Vacuous pass when
/// the document has fewer than two H2 sections.
pub fn check_dividers(patterns: &RubricPatterns, content: &str) -> CheckOutcome {
    let masked = mask_code_blocks(content);
    let lines: Vec<&str> = masked.lines().collect();

    let h2_lines: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| patterns.h2.is_match(line))
        .map(|(i, _)| i)
        .collect();

    if h2_lines.len() < 2 {
        return CheckOutcome::pass("Fewer than two H2 sections, no divider required");
    }

    let divider_lines: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| patterns.divider.is_match(line))
        .map(|(i, _)| i)
        .collect();

    let separates = h2_lines.windows(2).any(|pair| {
        divider_lines
            .iter()
            .any(|&d| d > pair[0] && d < pair[1])
    });

    if separates {
        CheckOutcome::pass(format!(
            "Found divider(s) between {} H2 sections",
            h2_lines.len()
        ))
    } else {
        CheckOutcome::fail(format!(
            "No --- divider found between the {} H2 sections",
            h2_lines.len()
        ))
    }
}

/// Code lead-ins: every fenced code block is preceded, within three lines,
/// by prose — not a heading, not another fence, not blank.
pub fn check_code_context(content: &str) -> CheckOutcome {
    let lines: Vec<&str> = content.lines().collect();
    let mut in_code = false;
    let mut violations: Vec<usize> = Vec::new();
    let mut block_count = 0usize;

    for (i, line) in lines.iter().enumerate() {
        if !line.trim_start().starts_with("```") {
            continue;
        }
        if in_code {
            in_code = false;
            continue;
        }
        in_code = true;
        block_count += 1;

        // The first non-blank line above the fence decides: prose is a
        // lead-in; a heading or another fence is not.
        let window_start = i.saturating_sub(3);
        let has_lead_in = lines[window_start..i]
            .iter()
            .rev()
            .map(|prev| prev.trim())
            .find(|trimmed| !trimmed.is_empty())
            .is_some_and(|trimmed| !trimmed.starts_with('#') && !trimmed.starts_with("```"));
        if !has_lead_in {
            violations.push(i + 1);
        }
    }

    if block_count == 0 {
        return CheckOutcome::pass("No code blocks to validate");
    }

    if violations.is_empty() {
        CheckOutcome::pass(format!(
            "All {block_count} code block(s) have a lead-in explanation"
        ))
    } else {
        let shown: Vec<String> = violations.iter().take(3).map(|l| format!("Line {l}")).collect();
        let suffix = if violations.len() > 3 { "..." } else { "" };
        CheckOutcome::fail(format!(
            "{} code block(s) lack a lead-in: {}{suffix}",
            violations.len(),
            shown.join(", ")
        ))
    }
}

/// Image placeholders: at least one `[IMAGE: description]`, none empty.
pub fn check_image_placeholders(patterns: &RubricPatterns, content: &str) -> CheckOutcome {
    let empty = patterns.image_empty.find_iter(content).count();
    if empty > 0 {
        return CheckOutcome::fail(format!(
            "Found {empty} empty image placeholder(s) - must include descriptions"
        ));
    }

    let count = patterns.image_placeholder.find_iter(content).count();
    if count == 0 {
        return CheckOutcome::fail(
            "No [IMAGE: description] placeholders found, need at least one",
        );
    }

    CheckOutcome::pass(format!(
        "Found {count} image placeholder(s) with descriptions"
    ))
}
