use insight_postgres::target::TargetParams;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Previous error reported by the client, or `false` when there is none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ErrorContext {
    Message(String),
    Flag(bool),
}

/// Error context used when a request flags a failure without describing it.
const PREVIOUS_ATTEMPT_FAILED: &str = "The previously generated query failed to execute.";

/// Request payload for SQL generation.
#[must_use]
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct GenerateSqlRequest {
    /// The question to answer.
    #[serde(default)]
    pub natural_language: Option<String>,
    /// Target database; the configured default when omitted.
    #[serde(default)]
    pub db_config: Option<TargetParams>,
    /// Error from running a previously generated statement.
    #[serde(default)]
    pub error: Option<ErrorContext>,
}

impl GenerateSqlRequest {
    /// Returns the question unless it is absent or blank.
    pub fn natural_language(&self) -> Option<&str> {
        self.natural_language
            .as_deref()
            .filter(|q| !q.trim().is_empty())
    }

    /// Returns the previous error text; `false`, `null` and blank mean none.
    ///
    /// A bare `true` carries no text, so it stands for a generic failure of
    /// the previous attempt.
    pub fn error_context(&self) -> Option<&str> {
        match &self.error {
            Some(ErrorContext::Message(message)) if !message.trim().is_empty() => Some(message),
            Some(ErrorContext::Flag(true)) => Some(PREVIOUS_ATTEMPT_FAILED),
            _ => None,
        }
    }
}

/// Request payload for chart suggestions.
#[must_use]
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct GenerateVisualizationsRequest {
    /// Dataset sample: a string used verbatim or any JSON value.
    #[serde(default)]
    pub dataset: Option<Value>,
}

impl GenerateVisualizationsRequest {
    /// Returns the dataset as prompt text.
    ///
    /// Non-string values are serialized compactly. `null`, blank strings and
    /// empty arrays or objects count as missing.
    pub fn dataset_text(&self) -> Option<String> {
        match self.dataset.as_ref()? {
            Value::Null => None,
            Value::String(text) if text.trim().is_empty() => None,
            Value::String(text) => Some(text.clone()),
            Value::Array(items) if items.is_empty() => None,
            Value::Object(fields) if fields.is_empty() => None,
            other => Some(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sql_request(value: Value) -> GenerateSqlRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn error_context_accepts_string_false_and_null() {
        let request = sql_request(json!({"natural_language": "q", "error": "bad column"}));
        assert_eq!(request.error_context(), Some("bad column"));

        let request = sql_request(json!({"natural_language": "q", "error": false}));
        assert_eq!(request.error_context(), None);

        let request = sql_request(json!({"natural_language": "q", "error": null}));
        assert_eq!(request.error_context(), None);

        let request = sql_request(json!({"natural_language": "q", "error": "  "}));
        assert_eq!(request.error_context(), None);
    }

    #[test]
    fn error_flag_true_is_a_generic_failure() {
        let request = sql_request(json!({"natural_language": "q", "error": true}));
        assert_eq!(request.error_context(), Some(PREVIOUS_ATTEMPT_FAILED));
    }

    #[test]
    fn missing_question_is_none() {
        assert!(sql_request(json!({})).natural_language().is_none());
        assert!(sql_request(json!({"natural_language": ""})).natural_language().is_none());
    }

    #[test]
    fn dataset_text_serializes_rows() {
        let request = GenerateVisualizationsRequest {
            dataset: Some(json!([{"month": "Jan", "sales": 3}])),
        };
        assert_eq!(
            request.dataset_text().as_deref(),
            Some(r#"[{"month":"Jan","sales":3}]"#)
        );
    }

    #[test]
    fn empty_dataset_is_missing() {
        for value in [json!(null), json!(""), json!([]), json!({})] {
            let request = GenerateVisualizationsRequest {
                dataset: Some(value),
            };
            assert!(request.dataset_text().is_none());
        }
        assert!(GenerateVisualizationsRequest::default().dataset_text().is_none());
    }

    #[test]
    fn dataset_string_is_verbatim() {
        let request = GenerateVisualizationsRequest {
            dataset: Some(json!("some dataset")),
        };
        assert_eq!(request.dataset_text().as_deref(), Some("some dataset"));
    }
}
