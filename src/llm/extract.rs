//! Recovery of structured JSON from free-form model output.
//!
//! Models asked for "ONLY a JSON object" still wrap their answer in fenced
//! code blocks, prepend prose, leave trailing commas, or emit raw newlines
//! inside string values. Both the classifier and the evaluator decode
//! through the same ordered recovery pipeline:
//!
//! 1. strip a fenced code block wrapper, if present
//! 2. extract the first balanced `{...}` region
//! 3. attempt a direct decode
//! 4. on failure, escape bare newlines inside strings and strip trailing
//!    commas, then retry the decode once

use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::OnceLock;

use crate::error::LlmError;

/// Decode a structured value from raw model output.
///
/// Applies the full recovery pipeline. The returned error carries the
/// original decode failure so callers can surface a useful message.
pub fn parse_structured<T: DeserializeOwned>(content: &str) -> Result<T, LlmError> {
    let candidate = extract_object(content)
        .ok_or_else(|| LlmError::ParseError("no JSON object found in response".to_string()))?;

    match serde_json::from_str(&candidate) {
        Ok(value) => Ok(value),
        Err(direct) => {
            let repaired = strip_trailing_commas(&escape_bare_newlines(&candidate));
            serde_json::from_str(&repaired)
                .map_err(|_| LlmError::ParseError(format!("unrecoverable response: {}", direct)))
        }
    }
}

/// Extract the first balanced JSON object from the content, handling
/// fenced code block wrappers.
pub fn extract_object(content: &str) -> Option<String> {
    let trimmed = content.trim();

    // A response that already leads with the object is taken as-is; fences
    // inside its string values must not trigger fence stripping.
    if trimmed.starts_with('{') {
        let end = find_matching_brace(trimmed)?;
        return Some(trimmed[..=end].to_string());
    }

    let unfenced = strip_code_fences(trimmed);
    let start = unfenced.find('{')?;
    let end = find_matching_brace(&unfenced[start..])?;
    Some(unfenced[start..=start + end].to_string())
}

/// Strip a fenced code block wrapper, returning the inner content.
///
/// Returns the trimmed input unchanged when no complete fence is found.
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();

    if let Some(open) = trimmed.find("```") {
        let after = &trimmed[open + 3..];
        // Skip the language tag on the opening fence line, if any
        let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after[body_start..];
        if let Some(close) = body.find("```") {
            return body[..close].trim();
        }
    }

    trimmed
}

/// Find the index of the brace closing the object that opens the string.
///
/// String-literal aware: braces inside quoted strings are ignored.
fn find_matching_brace(s: &str) -> Option<usize> {
    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, c) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => {
                escape_next = true;
            }
            '"' => {
                in_string = !in_string;
            }
            '{' if !in_string => {
                depth += 1;
            }
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }

    None
}

/// Escape raw newline, carriage-return, and tab characters occurring inside
/// JSON string literals.
fn escape_bare_newlines(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escape_next = false;

    for c in json.chars() {
        if escape_next {
            escape_next = false;
            out.push(c);
            continue;
        }

        match c {
            '\\' if in_string => {
                escape_next = true;
                out.push(c);
            }
            '"' => {
                in_string = !in_string;
                out.push(c);
            }
            '\n' if in_string => out.push_str("\\n"),
            '\r' if in_string => out.push_str("\\r"),
            '\t' if in_string => out.push_str("\\t"),
            _ => out.push(c),
        }
    }

    out
}

/// Strip trailing commas before closing braces and brackets.
fn strip_trailing_commas(json: &str) -> String {
    static TRAILING_COMMA: OnceLock<Regex> = OnceLock::new();
    let re = TRAILING_COMMA.get_or_init(|| Regex::new(r",\s*([}\]])").expect("valid regex"));
    re.replace_all(json, "$1").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        value: i64,
    }

    #[test]
    fn test_find_matching_brace() {
        assert_eq!(find_matching_brace(r#"{}"#), Some(1));
        assert_eq!(find_matching_brace(r#"{"a": 1}"#), Some(7));
        assert_eq!(find_matching_brace(r#"{"a": {"b": 2}}"#), Some(14));
        assert_eq!(find_matching_brace(r#"{"a": "}"}"#), Some(9));
        assert_eq!(find_matching_brace(r#"{"a": "\"}"}"#), Some(11));
        assert_eq!(find_matching_brace(r#"{"#), None);
    }

    #[test]
    fn test_extract_object_bare() {
        let content = r#"{"name": "x", "value": 1}"#;
        assert_eq!(extract_object(content), Some(content.to_string()));
    }

    #[test]
    fn test_extract_object_fenced_json() {
        let content = "```json\n{\"name\": \"x\", \"value\": 1}\n```";
        assert_eq!(
            extract_object(content),
            Some(r#"{"name": "x", "value": 1}"#.to_string())
        );
    }

    #[test]
    fn test_extract_object_generic_fence() {
        let content = "```\n{\"name\": \"x\", \"value\": 1}\n```";
        assert_eq!(
            extract_object(content),
            Some(r#"{"name": "x", "value": 1}"#.to_string())
        );
    }

    #[test]
    fn test_extract_object_with_surrounding_prose() {
        let content = "Here is the result:\n{\"name\": \"x\", \"value\": 1}\nHope it helps!";
        assert_eq!(
            extract_object(content),
            Some(r#"{"name": "x", "value": 1}"#.to_string())
        );
    }

    #[test]
    fn test_extract_object_none() {
        assert_eq!(extract_object("no json here"), None);
    }

    #[test]
    fn test_extract_object_keeps_fences_inside_string_values() {
        let content = r#"{"name": "```python\nsorted(xs)\n```", "value": 3}"#;
        assert_eq!(extract_object(content), Some(content.to_string()));
    }

    #[test]
    fn test_escape_bare_newlines_only_inside_strings() {
        let json = "{\n  \"name\": \"line one\nline two\"\n}";
        let escaped = escape_bare_newlines(json);
        assert_eq!(escaped, "{\n  \"name\": \"line one\\nline two\"\n}");
    }

    #[test]
    fn test_strip_trailing_commas() {
        assert_eq!(strip_trailing_commas(r#"{"a": 1,}"#), r#"{"a": 1}"#);
        assert_eq!(strip_trailing_commas(r#"[1, 2, ]"#), r#"[1, 2]"#);
        assert_eq!(
            strip_trailing_commas("{\"a\": 1,\n}"),
            r#"{"a": 1}"#
        );
        // Commas inside well-formed content are untouched
        assert_eq!(strip_trailing_commas(r#"{"a": 1, "b": 2}"#), r#"{"a": 1, "b": 2}"#);
    }

    #[test]
    fn test_parse_structured_well_formed() {
        let parsed: Sample = parse_structured(r#"{"name": "x", "value": 1}"#).expect("parses");
        assert_eq!(
            parsed,
            Sample {
                name: "x".to_string(),
                value: 1
            }
        );
    }

    #[test]
    fn test_parse_structured_repairs_trailing_comma() {
        let parsed: Sample =
            parse_structured(r#"{"name": "x", "value": 1,}"#).expect("repaired parse");
        assert_eq!(parsed.value, 1);
    }

    #[test]
    fn test_parse_structured_repairs_bare_newline() {
        let content = "{\"name\": \"first\nsecond\", \"value\": 2}";
        let parsed: Sample = parse_structured(content).expect("repaired parse");
        assert_eq!(parsed.name, "first\nsecond");
    }

    #[test]
    fn test_parse_structured_repaired_matches_well_formed() {
        let clean: Sample = parse_structured(r#"{"name": "x", "value": 7}"#).expect("parses");
        let fenced_with_comma: Sample =
            parse_structured("```json\n{\"name\": \"x\", \"value\": 7,}\n```").expect("parses");
        assert_eq!(clean, fenced_with_comma);
    }

    #[test]
    fn test_parse_structured_unrecoverable() {
        let result: Result<Sample, _> = parse_structured("total garbage");
        assert!(result.is_err());

        let result: Result<Sample, _> = parse_structured(r#"{"name": unquoted}"#);
        assert!(result.is_err());
    }
}
