//! Title option parsing.
//!
//! Models return a JSON array, usually. This module strips stray code
//! fences, salvages partially valid objects, and falls back to stock
//! options rather than failing the pipeline over malformed JSON.

use draftsmith_core::state::TitleOption;
use serde_json::Value;
use tracing::warn;

/// Parse a model response into title options.
///
/// Never returns an empty list: unusable responses yield [`fallback_options`].
pub fn parse_title_options(response: &str) -> Vec<TitleOption> {
    let cleaned = strip_code_fences(response);
    if cleaned.is_empty() {
        warn!("Empty title response, using fallback options");
        return fallback_options();
    }

    let parsed: Value = match serde_json::from_str(cleaned) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Failed to parse title options JSON, using fallback options");
            return fallback_options();
        }
    };

    let Value::Array(items) = parsed else {
        warn!("Title response is not a JSON array, using fallback options");
        return fallback_options();
    };

    let mut options = Vec::new();
    for (i, item) in items.into_iter().enumerate() {
        let Value::Object(map) = item else {
            warn!(index = i, "Skipping non-object title entry");
            continue;
        };
        options.push(salvage_option(&map, i));
    }

    if options.is_empty() {
        warn!("No usable title options in response, using fallback options");
        return fallback_options();
    }
    options
}

/// Build one option from a JSON object, defaulting any missing field.
fn salvage_option(map: &serde_json::Map<String, Value>, index: usize) -> TitleOption {
    let title = map
        .get("title")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Blog Post Title {}", index + 1));

    // Accept either a "subtitle" string or the first entry of a "subtitles"
    // list (plain string or `{ "subtitle": ... }` object).
    let subtitle = map
        .get("subtitle")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| {
            map.get("subtitles")
                .and_then(Value::as_array)
                .and_then(|list| list.first())
                .and_then(|first| match first {
                    Value::String(s) => Some(s.clone()),
                    Value::Object(obj) => obj
                        .get("subtitle")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    _ => None,
                })
        })
        .unwrap_or_else(|| "Insights and practical applications".to_string());

    let reasoning = ["reasoning", "approach", "value_promise"]
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_str))
        .unwrap_or("Generated title option")
        .to_string();

    TitleOption {
        title,
        subtitle: Some(subtitle),
        reasoning,
    }
}

/// Stock options used when the model response is unusable.
pub fn fallback_options() -> Vec<TitleOption> {
    vec![
        TitleOption {
            title: "Technical Deep Dive".into(),
            subtitle: Some("Exploring concepts and implementation details".into()),
            reasoning: "Default title due to generation error".into(),
        },
        TitleOption {
            title: "Practical Guide".into(),
            subtitle: Some("Step-by-step approach and best practices".into()),
            reasoning: "Alternative title option".into(),
        },
        TitleOption {
            title: "Technical Analysis".into(),
            subtitle: Some("Key insights and practical considerations".into()),
            reasoning: "Third fallback option".into(),
        },
    ]
}

fn strip_code_fences(response: &str) -> &str {
    let mut cleaned = response.trim();
    if let Some(rest) = cleaned.strip_prefix("```json") {
        cleaned = rest;
    } else if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = rest;
    }
    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest;
    }
    cleaned.trim()
}
