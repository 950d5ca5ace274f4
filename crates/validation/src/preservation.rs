//! Content and LaTeX preservation checks.
//!
//! These compare a baseline document against a formatting candidate and flag
//! deletions. They tolerate added structure (headings, bullets, callouts,
//! dividers, image placeholders) and whitespace churn, but not missing
//! sentences or rewritten equations.

use std::collections::HashMap;

/// Minimum fraction of baseline words the candidate must retain.
const WORD_RETENTION_FLOOR: f64 = 0.95;

/// Minimum fraction of baseline words that must reappear in the candidate.
const WORD_OVERLAP_FLOOR: f64 = 0.90;

/// Strip markdown decoration and lowercase-tokenize a document.
///
/// Decoration the formatter is allowed to add must not count as content:
/// blockquote markers, bullet markers, heading hashes, dividers, callout
/// glyphs, emphasis markers, and `[IMAGE: ...]` placeholders are removed
/// before splitting into words.
fn content_words(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut in_code = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("```") {
            in_code = !in_code;
            continue;
        }
        if in_code {
            // Code blocks are compared verbatim, modulo whitespace.
            words.extend(trimmed.split_whitespace().map(str::to_lowercase));
            continue;
        }
        if trimmed.chars().all(|c| c == '-' || c == ' ') && trimmed.starts_with("---") {
            continue;
        }

        let stripped = strip_image_placeholders(trimmed);
        for raw in stripped.split_whitespace() {
            let word: String = raw
                .chars()
                .filter(|c| {
                    !matches!(c, '>' | '#' | '*' | '_' | '`' | '|')
                        && !matches!(c, '\u{1F4A1}' | '\u{26A0}' | '\u{FE0F}' | '\u{1F3AF}')
                })
                .collect();
            let word = word.trim_matches(|c: char| c == '-' || c == ':').to_lowercase();
            if !word.is_empty() {
                words.push(word);
            }
        }
    }
    words
}

fn strip_image_placeholders(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(start) = rest.find("[IMAGE:") {
        out.push_str(&rest[..start]);
        match rest[start..].find(']') {
            Some(end) => rest = &rest[start + end + 1..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Check that formatting preserved the baseline's prose.
///
/// Word-level and order-insensitive: fails when the candidate retains fewer
/// than 95% of the baseline's words, or when less than 90% of the baseline's
/// word occurrences reappear in the candidate.
pub fn content_preserved(baseline: &str, candidate: &str) -> (bool, String) {
    let base_words = content_words(baseline);
    let cand_words = content_words(candidate);

    if base_words.is_empty() {
        return (true, "No baseline content to compare".into());
    }

    let retention = cand_words.len() as f64 / base_words.len() as f64;
    if retention < WORD_RETENTION_FLOOR {
        return (
            false,
            format!(
                "Content loss detected: {:.0}% of baseline words retained (need >=95%)",
                retention * 100.0
            ),
        );
    }

    // Multiset overlap: how many baseline word occurrences survive.
    let mut cand_counts: HashMap<&str, usize> = HashMap::new();
    for word in &cand_words {
        *cand_counts.entry(word.as_str()).or_insert(0) += 1;
    }
    let mut surviving = 0usize;
    for word in &base_words {
        if let Some(count) = cand_counts.get_mut(word.as_str()) {
            if *count > 0 {
                *count -= 1;
                surviving += 1;
            }
        }
    }

    let overlap = surviving as f64 / base_words.len() as f64;
    if overlap < WORD_OVERLAP_FLOOR {
        return (
            false,
            format!(
                "Significant content changes detected: {:.0}% of baseline words found (need >=90%)",
                overlap * 100.0
            ),
        );
    }

    (
        true,
        format!(
            "Content preserved: {:.0}% retention, {:.0}% overlap",
            retention * 100.0,
            overlap * 100.0
        ),
    )
}

/// One extracted LaTeX expression, whitespace-normalized.
#[derive(Debug, Clone, PartialEq)]
struct LatexExpr {
    display: bool,
    normalized: String,
}

/// Extract the ordered sequence of LaTeX expressions from a document.
///
/// Display blocks (`$$...$$`) are found first; inline `$...$` pairs are then
/// scanned in the remaining segments. Expressions are returned in document
/// order with all whitespace removed.
fn extract_latex(text: &str) -> Vec<LatexExpr> {
    let mut found: Vec<(usize, LatexExpr)> = Vec::new();
    let bytes = text.as_bytes();

    // Display blocks.
    let mut display_spans: Vec<(usize, usize)> = Vec::new();
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'$' && bytes[i + 1] == b'$' {
            if let Some(rel) = text[i + 2..].find("$$") {
                let end = i + 2 + rel;
                let body = &text[i + 2..end];
                if !body.trim().is_empty() {
                    display_spans.push((i, end + 2));
                    found.push((
                        i,
                        LatexExpr {
                            display: true,
                            normalized: normalize_expr(body),
                        },
                    ));
                }
                i = end + 2;
                continue;
            }
        }
        i += 1;
    }

    // Inline expressions outside the display spans.
    let mut i = 0;
    while i < bytes.len() {
        if let Some((_, span_end)) = display_spans
            .iter()
            .find(|(start, end)| i >= *start && i < *end)
        {
            i = *span_end;
            continue;
        }
        if bytes[i] == b'$' {
            let mut j = i + 1;
            let mut closed = false;
            while j < bytes.len() {
                // A `$` that opens a display block cannot close an inline
                // expression.
                if display_spans.iter().any(|(start, _)| j == *start) {
                    break;
                }
                if bytes[j] == b'$' {
                    closed = true;
                    break;
                }
                if bytes[j] == b'\n' {
                    break;
                }
                j += 1;
            }
            if closed && j > i + 1 {
                let body = &text[i + 1..j];
                if !body.trim().is_empty() {
                    found.push((
                        i,
                        LatexExpr {
                            display: false,
                            normalized: normalize_expr(body),
                        },
                    ));
                }
                i = j + 1;
                continue;
            }
        }
        i += 1;
    }

    found.sort_by_key(|(pos, _)| *pos);
    found.into_iter().map(|(_, expr)| expr).collect()
}

fn normalize_expr(body: &str) -> String {
    body.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Check that every baseline LaTeX expression survives, in order, in the
/// candidate.
///
/// Grouping several baseline equations into one candidate display block is
/// allowed; dropping, garbling, or reordering an expression is not.
pub fn latex_preserved(baseline: &str, candidate: &str) -> (bool, String) {
    let base_exprs = extract_latex(baseline);
    if base_exprs.is_empty() {
        return (true, "No LaTeX equations in baseline".into());
    }
    let cand_exprs = extract_latex(candidate);

    // Forward-only pairing walk. Each baseline expression must be found at
    // or after the previous match position; several baseline expressions may
    // land inside the same candidate block (grouping).
    let mut block = 0usize;
    let mut offset = 0usize;
    for expr in &base_exprs {
        let mut matched = false;
        let mut k = block;
        while k < cand_exprs.len() {
            let haystack = &cand_exprs[k].normalized;
            let from = if k == block { offset } else { 0 };
            if from <= haystack.len() {
                if let Some(pos) = haystack[from..].find(expr.normalized.as_str()) {
                    block = k;
                    offset = from + pos + expr.normalized.len();
                    matched = true;
                    break;
                }
            }
            k += 1;
        }
        if !matched {
            let shown: String = expr.normalized.chars().take(40).collect();
            return (
                false,
                format!(
                    "LaTeX expression missing or altered in candidate: ${shown}$ \
                     (baseline has {}, candidate has {})",
                    base_exprs.len(),
                    cand_exprs.len()
                ),
            );
        }
    }

    let inline = cand_exprs.iter().filter(|e| !e.display).count();
    let display = cand_exprs.len() - inline;
    (
        true,
        format!("LaTeX preserved: {inline} inline, {display} display block(s)"),
    )
}
