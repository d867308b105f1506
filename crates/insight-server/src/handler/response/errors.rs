use std::borrow::Cow;
use std::collections::HashMap;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use schemars::JsonSchema;
use serde::Serialize;
use validator::ValidationErrors;

/// Field-specific validation failure.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ValidationErrorDetail {
    /// Field name that failed validation
    pub field: String,
    /// Error code for the validation failure
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Additional parameters related to the validation error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<HashMap<String, serde_json::Value>>,
}

impl ValidationErrorDetail {
    /// Creates a detail without parameters.
    pub fn new(
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
            params: None,
        }
    }

    /// Flattens validator output into details, one per failed rule.
    pub fn from_validation_errors(errors: &ValidationErrors) -> Vec<Self> {
        let mut details = Vec::new();

        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                let params: HashMap<String, serde_json::Value> = error
                    .params
                    .iter()
                    // Submitted values may be passwords.
                    .filter(|(key, _)| *key != "value")
                    .map(|(key, value)| (key.to_string(), value.clone()))
                    .collect();

                details.push(Self {
                    field: field.to_string(),
                    code: error.code.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Validation failed for field '{}'", field)),
                    params: (!params.is_empty()).then_some(params),
                });
            }
        }

        details
    }
}

/// HTTP error body: `{"error": "...", "raw"?: "...", "validation"?: [...]}`.
///
/// Only `error`, `raw` and `validation` are serialized. The remaining fields
/// drive logging and the status line.
#[must_use = "error responses do nothing unless serialized"]
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ErrorResponse<'a> {
    /// Human-readable error message
    #[serde(rename = "error")]
    pub message: Cow<'a, str>,
    /// Unparsed model output, present on visualization parse failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<Cow<'a, str>>,
    /// Validation error details for field-specific errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<Vec<ValidationErrorDetail>>,

    /// The error name/type identifier
    #[serde(skip)]
    pub name: Cow<'a, str>,
    /// The resource that the error relates to
    #[serde(skip)]
    pub resource: Option<Cow<'a, str>>,
    /// Internal context for debugging
    #[serde(skip)]
    pub context: Option<Cow<'a, str>>,
    /// HTTP status code
    #[serde(skip)]
    pub status: StatusCode,
}

impl<'a> ErrorResponse<'a> {
    pub const BAD_REQUEST: Self = Self::new(
        "bad_request",
        "Invalid request data.",
        StatusCode::BAD_REQUEST,
    );
    pub const CONFIG_ERROR: Self = Self::new(
        "config_error",
        "Incomplete database configuration.",
        StatusCode::BAD_REQUEST,
    );
    pub const CONNECTION_ERROR: Self = Self::new(
        "connection_error",
        "Could not connect to the database.",
        StatusCode::BAD_REQUEST,
    );
    pub const GENERATION_ERROR: Self = Self::new(
        "generation_error",
        "Generation failed.",
        StatusCode::BAD_REQUEST,
    );
    pub const INTERNAL_SERVER_ERROR: Self = Self::new(
        "internal_server_error",
        "Internal server error.",
        StatusCode::INTERNAL_SERVER_ERROR,
    );
    pub const MISSING_INPUT: Self = Self::new(
        "missing_input",
        "Missing required input.",
        StatusCode::BAD_REQUEST,
    );
    pub const NOT_FOUND: Self =
        Self::new("not_found", "Not found.", StatusCode::NOT_FOUND);
    pub const PARSE_ERROR: Self = Self::new(
        "parse_error",
        "Failed to parse visualization data.",
        StatusCode::BAD_REQUEST,
    );
    pub const QUERY_ERROR: Self = Self::new(
        "query_error",
        "Query failed.",
        StatusCode::BAD_REQUEST,
    );
    pub const VALIDATION_ERROR: Self = Self::new(
        "validation_error",
        "Validation failed.",
        StatusCode::BAD_REQUEST,
    );

    /// Creates a new error response.
    #[inline]
    pub const fn new(name: &'a str, message: &'a str, status: StatusCode) -> Self {
        Self {
            message: Cow::Borrowed(message),
            raw: None,
            validation: None,
            name: Cow::Borrowed(name),
            resource: None,
            context: None,
            status,
        }
    }

    /// Replaces the message.
    ///
    /// Operation failures carry downstream text (engine errors, LLM errors)
    /// that the client expects verbatim, so the default is not kept.
    pub fn with_message(mut self, message: impl Into<Cow<'a, str>>) -> Self {
        self.message = message.into();
        self
    }

    /// Sets the resource; merges with an existing one using a separator.
    pub fn with_resource(mut self, resource: impl Into<Cow<'a, str>>) -> Self {
        let new_resource = resource.into();
        self.resource = Some(match self.resource {
            Some(existing) => Cow::Owned(format!("{}/{}", existing, new_resource)),
            None => new_resource,
        });
        self
    }

    /// Attaches context; merges with existing context using a separator.
    pub fn with_context(mut self, context: impl Into<Cow<'a, str>>) -> Self {
        let new_context = context.into();
        self.context = Some(match self.context {
            Some(existing) => Cow::Owned(format!("{}; {}", existing, new_context)),
            None => new_context,
        });
        self
    }

    /// Attaches unparsed model output.
    pub fn with_raw(mut self, raw: impl Into<Cow<'a, str>>) -> Self {
        self.raw = Some(raw.into());
        self
    }

    /// Adds validation errors to the error response.
    pub fn with_validation_errors(mut self, errors: Vec<ValidationErrorDetail>) -> Self {
        self.validation = Some(errors);
        self
    }
}

impl Default for ErrorResponse<'_> {
    #[inline]
    fn default() -> Self {
        Self::INTERNAL_SERVER_ERROR
    }
}

impl From<ValidationErrors> for ErrorResponse<'_> {
    fn from(errors: ValidationErrors) -> Self {
        Self::VALIDATION_ERROR
            .with_validation_errors(ValidationErrorDetail::from_validation_errors(&errors))
    }
}

impl IntoResponse for ErrorResponse<'_> {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(
                status = %self.status,
                name = %self.name,
                message = %self.message,
                resource = ?self.resource,
                context = ?self.context,
                "HTTP error response"
            );
        } else {
            tracing::warn!(
                status = %self.status,
                name = %self.name,
                message = %self.message,
                resource = ?self.resource,
                context = ?self.context,
                "HTTP error response"
            );
        }

        (self.status, Json(self)).into_response()
    }
}
