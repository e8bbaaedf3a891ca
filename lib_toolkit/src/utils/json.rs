//! # JSON Helpers
//!
//! Small conversions used for request construction and diagnostic output.

use serde::de::IgnoredAny;
use serde_json::{Map, Value};
use url::form_urlencoded;

/// Re-indents a JSON document with a single space per level.
///
/// Only whitespace between tokens changes: number text, duplicate keys and key
/// order come out exactly as they appear in `raw`. Empty objects and arrays stay
/// on one line and no trailing newline is added.
///
/// # Errors
/// When `raw` is not valid JSON the raw text (lossily decoded as UTF-8) is
/// returned as the error, so callers can display it unchanged.
pub fn pretty_print(raw: &[u8]) -> Result<String, String> {
    let fallback = || String::from_utf8_lossy(raw).into_owned();

    let text = std::str::from_utf8(raw).map_err(|_| fallback())?;
    serde_json::from_str::<IgnoredAny>(text).map_err(|_| fallback())?;

    Ok(reindent(text, " "))
}

/// Token-level re-indent of text already known to be valid JSON.
fn reindent(text: &str, indent: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    // An opening bracket was written and its first member is still pending
    let mut open_pending = false;

    let newline = |out: &mut String, depth: usize| {
        out.push('\n');
        for _ in 0..depth {
            out.push_str(indent);
        }
    };

    for ch in text.chars() {
        if in_string {
            out.push(ch);
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
            ' ' | '\t' | '\n' | '\r' => {}
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                if !open_pending {
                    newline(&mut out, depth);
                }
                open_pending = false;
                out.push(ch);
            }
            ',' => {
                out.push(',');
                newline(&mut out, depth);
            }
            ':' => out.push_str(": "),
            _ => {
                if open_pending {
                    newline(&mut out, depth);
                    open_pending = false;
                }
                out.push(ch);
                match ch {
                    '{' | '[' => {
                        depth += 1;
                        open_pending = true;
                    }
                    '"' => in_string = true,
                    _ => {}
                }
            }
        }
    }
    out
}

/// Same as [`pretty_print`] but always yields something printable.
pub fn pretty_or_raw(raw: &[u8]) -> String {
    pretty_print(raw).unwrap_or_else(|text| text)
}

/// Encodes a JSON object as an `application/x-www-form-urlencoded` string.
///
/// Keys are emitted in sorted order. String values are used as-is, every other
/// value is rendered with its compact JSON text (`1`, `true`, `null`, `[1,2]`).
pub fn map_to_url_values(map: &Map<String, Value>) -> String {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let mut form = form_urlencoded::Serializer::new(String::new());
    for (key, value) in entries {
        match value {
            Value::String(s) => form.append_pair(key, s),
            other => form.append_pair(key, &other.to_string()),
        };
    }
    form.finish()
}

/// Serializes a JSON object map into a compact JSON string.
pub fn map_to_json_string(map: &Map<String, Value>) -> String {
    serde_json::to_string(map).unwrap_or_default()
}

/// Parses a JSON string that must hold an object.
///
/// # Errors
/// Returns the `serde_json` error when the text is not JSON or not an object.
pub fn json_to_map(text: &str) -> Result<Map<String, Value>, serde_json::Error> {
    serde_json::from_str(text)
}
