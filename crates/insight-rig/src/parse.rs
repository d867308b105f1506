//! Interpretation of raw model output.

use serde_json::Value;

use crate::{Error, Result};

/// Extracts the JSON array spanning the first `[` to the last `]`.
///
/// Surrounding prose is ignored. The parsed value is returned as-is.
///
/// # Errors
///
/// Returns [`Error::Parse`] carrying `raw` if either bracket is missing,
/// they are out of order, or the slice is not valid JSON.
pub fn extract_json_array(raw: &str) -> Result<Value> {
    let (Some(start), Some(end)) = (raw.find('['), raw.rfind(']')) else {
        return Err(Error::parse("no JSON array found in model output", raw));
    };

    if end < start {
        return Err(Error::parse("no JSON array found in model output", raw));
    }

    serde_json::from_str(&raw[start..=end])
        .map_err(|e| Error::parse(format!("invalid JSON in model output: {e}"), raw))
}

/// Removes a surrounding markdown code fence, with or without a language tag.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the language tag on the opening line.
    let body = match body.find('\n') {
        Some(newline) => &body[newline + 1..],
        None => body,
    };

    body.strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn extracts_array_from_prose() {
        let raw = "Here you go:\n[{\"type\":\"bar\",\"data\":null}]\nEnjoy!";
        let value = extract_json_array(raw).unwrap();
        assert_eq!(value, json!([{"type": "bar", "data": null}]));
    }

    #[test]
    fn spans_first_to_last_bracket() {
        let raw = "[{\"type\":\"pie\",\"data\":{\"labels\":[\"a\"],\"values\":[1]}}]";
        let value = extract_json_array(raw).unwrap();
        assert_eq!(value[0]["data"]["values"], json!([1]));
    }

    #[test]
    fn missing_bracket_is_parse_error() {
        let err = extract_json_array("no charts here").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert_eq!(err.raw(), Some("no charts here"));
    }

    #[test]
    fn reversed_brackets_are_parse_error() {
        let err = extract_json_array("] oops [").unwrap_err();
        assert_eq!(err.raw(), Some("] oops ["));
    }

    #[test]
    fn invalid_json_is_parse_error() {
        let err = extract_json_array("[{type: bar}]").unwrap_err();
        assert!(err.to_string().starts_with("invalid JSON"));
        assert_eq!(err.raw(), Some("[{type: bar}]"));
    }

    #[test]
    fn strips_fences() {
        assert_eq!(strip_code_fences("```sql\nSELECT 1;\n```"), "SELECT 1;");
        assert_eq!(strip_code_fences("```\nSELECT 1\n```\n"), "SELECT 1");
        assert_eq!(strip_code_fences("  SELECT 1  "), "SELECT 1");
    }
}
