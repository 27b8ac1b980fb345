//! Tolerant parsing of language-model output.
//!
//! Models asked for a JSON array frequently wrap it in prose or a Markdown
//! code fence. The helpers here never error: unusable output maps to `None`
//! (or to all-neutral labels), and the caller's fallback takes over.

use verifact_core::Stance;

/// Strip a Markdown code fence wrapper, if present.
///
/// Drops the opening fence line (which may carry a language tag) and a
/// trailing ``` marker. Text without a leading fence is returned unchanged.
fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    let body = match trimmed.find('\n') {
        Some(pos) => &trimmed[pos + 1..],
        None => return trimmed,
    };
    let body = body.trim_end();
    body.strip_suffix("```").map(str::trim).unwrap_or(body)
}

/// Locate the first balanced JSON array in `text` and return it as a slice.
///
/// Walks from the first `[` tracking bracket depth, ignoring brackets inside
/// quoted strings. Returns `None` when no balanced array exists.
fn first_balanced_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Extract a JSON array of strings from model output.
///
/// Handles a raw `[...]` as well as fenced or prose-wrapped variants. Keeps
/// only non-empty trimmed string elements. Returns `None` when nothing
/// parseable (or nothing non-empty) is found.
pub fn json_string_array(text: &str) -> Option<Vec<String>> {
    let body = strip_fences(text);
    let candidate = first_balanced_array(body)?;
    let values: Vec<serde_json::Value> = serde_json::from_str(candidate).ok()?;
    let out: Vec<String> = values
        .iter()
        .filter_map(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Map model output onto exactly `expected` stance labels.
///
/// Unrecognized labels become neutral; a short array is padded with neutral;
/// a long one is truncated. Unparseable output yields all-neutral, so stance
/// classification can never shrink or grow the evidence set.
pub fn stance_labels(text: &str, expected: usize) -> Vec<Stance> {
    let mut stances = match json_string_array(text) {
        Some(labels) => labels
            .iter()
            .map(|label| Stance::from_label(label))
            .collect(),
        None => Vec::new(),
    };
    stances.truncate(expected);
    stances.resize(expected, Stance::Neutral);
    stances
}
