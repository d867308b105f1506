//! HTTP error handling with builder pattern for dynamic error responses.

use std::borrow::Cow;
use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::handler::response::{ErrorResponse, ValidationErrorDetail};

/// The error type for HTTP handlers in the server.
///
/// Every failure reaching a handler boundary becomes one of these. The
/// `message` is what the client receives in the `error` field; when it is
/// absent the kind's default message is used.
#[derive(Clone)]
#[must_use = "errors do nothing unless serialized"]
pub struct Error<'a> {
    kind: ErrorKind,
    context: Option<Cow<'a, str>>,
    message: Option<Cow<'a, str>>,
    resource: Option<Cow<'a, str>>,
    raw: Option<Cow<'a, str>>,
    validation: Option<Vec<ValidationErrorDetail>>,
}

impl Error<'static> {
    /// Creates a new [`Error`] with the specified kind.
    #[inline]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
            message: None,
            resource: None,
            raw: None,
            validation: None,
        }
    }
}

impl<'a> Error<'a> {
    /// Attaches internal context. Logged, never sent to the client.
    #[inline]
    pub fn with_context(self, context: impl Into<Cow<'a, str>>) -> Self {
        Self {
            context: Some(context.into()),
            ..self
        }
    }

    /// Sets the client-facing message.
    #[inline]
    pub fn with_message(self, message: impl Into<Cow<'a, str>>) -> Self {
        Self {
            message: Some(message.into()),
            ..self
        }
    }

    /// Sets the resource that caused the error.
    #[inline]
    pub fn with_resource(self, resource: impl Into<Cow<'a, str>>) -> Self {
        Self {
            resource: Some(resource.into()),
            ..self
        }
    }

    /// Attaches unparsed model output, returned to the client as `raw`.
    #[inline]
    pub fn with_raw(self, raw: impl Into<Cow<'a, str>>) -> Self {
        Self {
            raw: Some(raw.into()),
            ..self
        }
    }

    /// Attaches field-level validation failures.
    #[inline]
    pub fn with_validation(self, details: Vec<ValidationErrorDetail>) -> Self {
        Self {
            validation: Some(details),
            ..self
        }
    }

    /// Returns the error kind.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the context if present.
    #[inline]
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Returns the custom message if present.
    #[inline]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns the resource if present.
    #[inline]
    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    /// Returns the raw model output if present.
    #[inline]
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    /// Returns the validation details if present.
    #[inline]
    pub fn validation(&self) -> Option<&[ValidationErrorDetail]> {
        self.validation.as_deref()
    }

    /// Converts this error into a static version by cloning all borrowed data.
    pub fn into_static(self) -> Error<'static> {
        Error {
            kind: self.kind,
            context: self.context.map(|c| Cow::Owned(c.into_owned())),
            message: self.message.map(|m| Cow::Owned(m.into_owned())),
            resource: self.resource.map(|r| Cow::Owned(r.into_owned())),
            raw: self.raw.map(|r| Cow::Owned(r.into_owned())),
            validation: self.validation,
        }
    }
}

impl Default for Error<'static> {
    #[inline]
    fn default() -> Self {
        Self::new(ErrorKind::default())
    }
}

impl fmt::Debug for Error<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let response = self.kind.response();

        let mut debug_struct = f.debug_struct("Error");
        debug_struct
            .field("kind", &self.kind)
            .field("name", &response.name)
            .field("status", &response.status);

        if let Some(ref message) = self.message {
            debug_struct.field("message", message);
        }

        if let Some(ref context) = self.context {
            debug_struct.field("context", context);
        }

        if let Some(ref resource) = self.resource {
            debug_struct.field("resource", resource);
        }

        if let Some(ref raw) = self.raw {
            debug_struct.field("raw", raw);
        }

        debug_struct.finish()
    }
}

impl fmt::Display for Error<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let response = self.kind.response();
        let message = self.message.as_deref().unwrap_or(response.message.as_ref());

        write!(f, "{} ({}): {}", response.name, response.status, message)?;

        if let Some(ref context) = self.context {
            write!(f, " - {}", context)?;
        }

        if let Some(ref resource) = self.resource {
            write!(f, " [resource: {}]", resource)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error<'_> {}

impl IntoResponse for Error<'_> {
    fn into_response(self) -> Response {
        let mut response = self.kind.response();

        if let Some(message) = self.message {
            response = response.with_message(message);
        }

        if let Some(resource) = self.resource {
            response = response.with_resource(resource);
        }

        if let Some(context) = self.context {
            response = response.with_context(context);
        }

        if let Some(raw) = self.raw {
            response = response.with_raw(raw);
        }

        if let Some(validation) = self.validation {
            response = response.with_validation_errors(validation);
        }

        response.into_response()
    }
}

impl aide::OperationOutput for Error<'_> {
    type Inner = ErrorResponse<'static>;

    fn operation_response(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Option<aide::openapi::Response> {
        axum::Json::<ErrorResponse<'static>>::operation_response(ctx, operation)
    }
}

impl From<ErrorKind> for Error<'static> {
    #[inline]
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

/// A specialized [`Result`] type for HTTP operations.
///
/// [`Result`]: std::result::Result
pub type Result<T, E = Error<'static>> = std::result::Result<T, E>;

/// Enumeration of all HTTP error kinds.
///
/// The operation endpoints only ever produce the 400-class kinds.
#[must_use = "error kinds do nothing unless used to create errors"]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 400 - A required field is absent or empty.
    MissingInput,
    /// 400 - Target connection parameters are incomplete or invalid.
    Config,
    /// 400 - The target database is unreachable.
    Connection,
    /// 400 - The statement failed on the target database.
    Query,
    /// 400 - The LLM call, or the schema probe it needs, failed.
    Generation,
    /// 400 - Model output holds no valid JSON array.
    Parse,
    /// 400 - Malformed request body or path parameter.
    BadRequest,
    /// 400 - Record validation failed.
    Validation,
    /// 404 - Resource not found.
    NotFound,
    /// 500 - Unexpected server error.
    #[default]
    InternalServerError,
}

impl ErrorKind {
    /// Converts this error kind into a full [`Error`].
    #[inline]
    pub fn into_error(self) -> Error<'static> {
        Error::new(self)
    }

    /// Creates an [`Error`] with the specified context.
    #[inline]
    pub fn with_context<'a>(self, context: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_context(context)
    }

    /// Creates an [`Error`] with the specified message.
    #[inline]
    pub fn with_message<'a>(self, message: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_message(message)
    }

    /// Creates an [`Error`] with the specified resource.
    #[inline]
    pub fn with_resource<'a>(self, resource: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_resource(resource)
    }

    /// Returns the HTTP status code for this error kind.
    #[inline]
    pub fn status_code(self) -> StatusCode {
        self.response().status
    }

    /// Returns the response template for this error kind.
    #[inline]
    pub fn response(self) -> ErrorResponse<'static> {
        match self {
            Self::MissingInput => ErrorResponse::MISSING_INPUT,
            Self::Config => ErrorResponse::CONFIG_ERROR,
            Self::Connection => ErrorResponse::CONNECTION_ERROR,
            Self::Query => ErrorResponse::QUERY_ERROR,
            Self::Generation => ErrorResponse::GENERATION_ERROR,
            Self::Parse => ErrorResponse::PARSE_ERROR,
            Self::BadRequest => ErrorResponse::BAD_REQUEST,
            Self::Validation => ErrorResponse::VALIDATION_ERROR,
            Self::NotFound => ErrorResponse::NOT_FOUND,
            Self::InternalServerError => ErrorResponse::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.response().name.as_ref())
    }
}

impl IntoResponse for ErrorKind {
    #[inline]
    fn into_response(self) -> Response {
        self.response().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_http_error() {
        let error = Error::default();
        assert_eq!(error.kind(), ErrorKind::InternalServerError);
        assert_eq!(error.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn operation_kinds_are_bad_requests() {
        let kinds = [
            ErrorKind::MissingInput,
            ErrorKind::Config,
            ErrorKind::Connection,
            ErrorKind::Query,
            ErrorKind::Generation,
            ErrorKind::Parse,
            ErrorKind::BadRequest,
            ErrorKind::Validation,
        ];

        for kind in kinds {
            assert_eq!(kind.status_code(), StatusCode::BAD_REQUEST, "{kind:?}");
            assert!(!kind.response().name.is_empty());
        }
    }

    #[test]
    fn not_found_is_404() {
        assert_eq!(ErrorKind::NotFound.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn error_builder_chaining() {
        let error = ErrorKind::Parse
            .with_message("no JSON array found in model output")
            .with_raw("sorry")
            .with_resource("visualization")
            .with_context("provider: mock");

        assert_eq!(error.kind(), ErrorKind::Parse);
        assert_eq!(error.message(), Some("no JSON array found in model output"));
        assert_eq!(error.raw(), Some("sorry"));
        assert_eq!(error.resource(), Some("visualization"));
        assert_eq!(error.context(), Some("provider: mock"));
    }

    #[test]
    fn std_fmt_display() {
        let error = ErrorKind::NotFound
            .with_message("Connection not found")
            .with_resource("connection")
            .with_context("id: 7");

        let display = error.to_string();
        assert!(display.contains("not_found"));
        assert!(display.contains("404"));
        assert!(display.contains("Connection not found"));
        assert!(display.contains("id: 7"));
        assert!(display.contains("connection"));
    }

    #[test]
    fn error_into_static() {
        let raw = String::from("[oops");
        let error = ErrorKind::Parse
            .into_error()
            .with_raw(raw.as_str())
            .into_static();
        drop(raw);
        assert_eq!(error.raw(), Some("[oops"));
    }
}
