//! Tolerant parser for the jargon extraction reply
//!
//! The model is asked for a flat JSON dictionary but routinely wraps it in
//! markdown fences or prose. This parser has exactly one failure mode: an
//! empty mapping. Jargon extraction must never take the run down with it.

use serde_json::Value;
use std::collections::BTreeMap;

/// Parse a model reply into a term -> definition mapping
///
/// Strips markdown fences, locates the outermost JSON object by bracket
/// matching, and keeps only entries where both term and definition are
/// non-empty strings. Anything unparseable yields an empty mapping.
pub fn parse_jargon_reply(raw: &str) -> BTreeMap<String, String> {
    let cleaned = raw.replace("```json", "").replace("```", "");

    let Some(object) = extract_object(&cleaned) else {
        return BTreeMap::new();
    };

    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(object) else {
        return BTreeMap::new();
    };

    map.into_iter()
        .filter_map(|(term, definition)| {
            let term = term.trim().to_string();
            let definition = match definition {
                Value::String(s) => s.trim().to_string(),
                _ => return None,
            };
            if term.is_empty() || definition.is_empty() {
                return None;
            }
            Some((term, definition))
        })
        .collect()
}

/// Locate the outermost `{...}` in the text, ignoring braces inside
/// string literals
fn extract_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, &byte) in bytes.iter().enumerate() {
        let ch = byte as char;

        if escape_next {
            escape_next = false;
            continue;
        }

        if ch == '\\' && in_string {
            escape_next = true;
            continue;
        }

        if ch == '"' {
            in_string = !in_string;
            continue;
        }

        if in_string {
            continue;
        }

        match ch {
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' => {
                if depth == 0 {
                    // Stray closing brace before any object opened
                    return None;
                }
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start?..=i]);
                }
            }
            _ => {}
        }
    }

    None
}
