//! JSON extractor followed by `validator` checks.

use axum::extract::{FromRequest, Request};
use derive_more::{Deref, DerefMut, From};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError, ValidationErrors};

use super::Json;
use crate::handler::{Error, ErrorKind, ValidationErrorDetail};

/// Deserializes like [`Json`], then runs [`Validate::validate`].
///
/// Validation failures become `400` with a readable `error` message and a
/// per-field `validation` list.
#[must_use]
#[derive(Debug, Clone, Copy, Default, Deref, DerefMut, From)]
pub struct ValidateJson<T>(pub T);

impl<T> ValidateJson<T> {
    /// Wraps a validated value.
    #[inline]
    pub fn new(inner: T) -> Self {
        Self(inner)
    }

    /// Returns the inner validated value.
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T, S> FromRequest<S> for ValidateJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = <Json<T> as FromRequest<S>>::from_request(req, state).await?;
        data.validate()?;
        Ok(Self::new(data))
    }
}

fn param_u64(error: &ValidationError, name: &str) -> Option<u64> {
    error.params.get(name).and_then(serde_json::Value::as_u64)
}

fn param_i64(error: &ValidationError, name: &str) -> Option<i64> {
    error.params.get(name).and_then(serde_json::Value::as_i64)
}

/// Formats one failed rule as a sentence.
fn format_validation_error(field: &str, error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return format!("Field '{field}': {message}");
    }

    match error.code.as_ref() {
        "length" => match (param_u64(error, "min"), param_u64(error, "max")) {
            (Some(1), Some(max)) => {
                format!("Field '{field}' must not be empty and at most {max} characters long")
            }
            (Some(min), Some(max)) => {
                format!("Field '{field}' must be between {min} and {max} characters long")
            }
            (Some(min), None) => format!("Field '{field}' must be at least {min} characters long"),
            (None, Some(max)) => format!("Field '{field}' must be at most {max} characters long"),
            _ => format!("Field '{field}' has invalid length"),
        },
        "range" => match (param_i64(error, "min"), param_i64(error, "max")) {
            (Some(min), Some(max)) => format!("Field '{field}' must be between {min} and {max}"),
            (Some(min), None) => format!("Field '{field}' must be at least {min}"),
            (None, Some(max)) => format!("Field '{field}' must be at most {max}"),
            _ => format!("Field '{field}' is out of valid range"),
        },
        "required" => format!("Field '{field}' is required"),
        code => format!("Field '{field}' failed validation: {code}"),
    }
}

impl From<ValidationErrors> for Error<'static> {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, field_errors)| {
                field_errors
                    .iter()
                    .map(move |error| format_validation_error(field, error))
            })
            .collect();
        // Field order of the underlying map is unspecified.
        messages.sort();

        let message = match messages.as_slice() {
            [] => "Validation failed".to_owned(),
            _ => messages.join(". "),
        };

        tracing::warn!(
            fields = ?errors.field_errors().keys().collect::<Vec<_>>(),
            "Request validation failed"
        );

        ErrorKind::Validation
            .with_message(message)
            .with_validation(ValidationErrorDetail::from_validation_errors(&errors))
    }
}

impl<T> aide::OperationInput for ValidateJson<T>
where
    T: schemars::JsonSchema,
{
    fn operation_input(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) {
        Json::<T>::operation_input(ctx, operation);
    }

    fn inferred_early_responses(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Vec<(Option<u16>, aide::openapi::Response)> {
        Json::<T>::inferred_early_responses(ctx, operation)
    }
}
