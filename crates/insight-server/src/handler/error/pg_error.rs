//! Application database errors to HTTP errors.

use insight_postgres::PgError;
use insight_postgres::types::{ConnectionConstraints, ConstraintViolation};

use crate::handler::response::ValidationErrorDetail;
use crate::handler::{Error, ErrorKind};

/// Tracing target for application database error conversions.
const TRACING_TARGET: &str = "insight_server::handler::postgres";

impl From<ConnectionConstraints> for Error<'static> {
    fn from(constraint: ConnectionConstraints) -> Self {
        let (field, code, message) = match constraint {
            ConnectionConstraints::NameUnique => (
                "connection_name",
                "unique",
                "connection with this connection name already exists.",
            ),
            ConnectionConstraints::NameNotEmpty => (
                "connection_name",
                "required",
                "This field may not be blank.",
            ),
            ConnectionConstraints::PortRange => (
                "port",
                "range",
                "Ensure this value is between 1 and 65535.",
            ),
            ConnectionConstraints::UpdatedAfterCreated => {
                return ErrorKind::InternalServerError
                    .with_context(format!("constraint violated: {constraint}"));
            }
        };

        ErrorKind::Validation
            .with_message(message)
            .with_resource("connection")
            .with_validation(vec![ValidationErrorDetail::new(field, code, message)])
    }
}

impl From<ConstraintViolation> for Error<'static> {
    fn from(constraint: ConstraintViolation) -> Self {
        match constraint {
            ConstraintViolation::Connection(c) => c.into(),
        }
    }
}

impl From<PgError> for Error<'static> {
    fn from(error: PgError) -> Self {
        if let Some(constraint) = error.constraint_violation() {
            tracing::warn!(
                target: TRACING_TARGET,
                table = constraint.table_name(),
                category = ?constraint.categorize(),
                error = %error,
                "constraint violation"
            );
            return constraint.into();
        }

        match &error {
            PgError::Timeout(timeout) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    timeout = ?timeout,
                    "database timeout"
                );
            }
            PgError::Config(_)
            | PgError::Connection(_)
            | PgError::Migration(_)
            | PgError::Query(_)
            | PgError::Unexpected(_) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %error,
                    transient = error.is_transient(),
                    "database error"
                );
            }
        }

        ErrorKind::InternalServerError.with_context(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_name_is_validation_error() {
        let error = Error::from(ConnectionConstraints::NameUnique);
        assert_eq!(error.kind(), ErrorKind::Validation);
        let details = error.validation().unwrap_or_default();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].field, "connection_name");
    }

    #[test]
    fn port_range_names_port_field() {
        let error = Error::from(ConstraintViolation::Connection(ConnectionConstraints::PortRange));
        assert_eq!(error.validation().unwrap_or_default()[0].field, "port");
    }

    #[test]
    fn generic_database_error_is_internal() {
        let error = Error::from(PgError::Unexpected("boom".into()));
        assert_eq!(error.kind(), ErrorKind::InternalServerError);
    }
}
