/// Failure of an operation against a target database.
///
/// The message of each variant is what the API returns to the caller; for
/// engine-reported failures it is the engine's own text, passed through
/// unmodified so the client can react to it (for example by regenerating SQL).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    /// The supplied connection parameters are incomplete or invalid.
    #[error("{0}")]
    Config(String),

    /// The target database could not be reached or refused the session.
    #[error("{0}")]
    Connection(String),

    /// The statement failed on the target database.
    #[error("{0}")]
    Query(String),
}

impl TargetError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Wraps a connect-phase driver error.
    pub(crate) fn connection(error: &tokio_postgres::Error) -> Self {
        Self::Connection(engine_message(error))
    }

    /// Wraps an execution-phase driver error.
    pub(crate) fn query(error: &tokio_postgres::Error) -> Self {
        Self::Query(engine_message(error))
    }

    /// Returns the caller-facing message.
    pub fn message(&self) -> &str {
        match self {
            Self::Config(message) | Self::Connection(message) | Self::Query(message) => message,
        }
    }
}

/// Prefers the server-reported message over the driver's wrapper text.
fn engine_message(error: &tokio_postgres::Error) -> String {
    match error.as_db_error() {
        Some(db_error) => db_error.message().to_owned(),
        None => error.to_string(),
    }
}

/// Specialized [`Result`] type for target-database operations.
pub type TargetResult<T, E = TargetError> = Result<T, E>;
