//! Target database errors to HTTP errors.
//!
//! The engine's own message is passed through as the client-facing
//! `error` text so callers can act on it (for example, regenerate SQL).

use insight_postgres::target::TargetError;

use crate::handler::{Error, ErrorKind};

/// Tracing target for target database error conversions.
const TRACING_TARGET: &str = "insight_server::handler::target";

impl From<TargetError> for Error<'static> {
    fn from(error: TargetError) -> Self {
        let kind = match &error {
            TargetError::Config(_) => ErrorKind::Config,
            TargetError::Connection(_) => ErrorKind::Connection,
            TargetError::Query(_) => ErrorKind::Query,
        };

        tracing::warn!(
            target: TRACING_TARGET,
            kind = %kind,
            error = %error,
            "target database operation failed"
        );

        kind.with_message(error.message().to_owned())
    }
}

/// Maps a failed prerequisite schema probe to a generation error.
pub(crate) fn generation_error(error: TargetError) -> Error<'static> {
    tracing::warn!(
        target: TRACING_TARGET,
        error = %error,
        "schema probe for generation failed"
    );

    ErrorKind::Generation.with_message(error.message().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_error_passes_engine_text_through() {
        let message = "relation \"missing\" does not exist";
        let error = Error::from(TargetError::Query(message.to_owned()));
        assert_eq!(error.kind(), ErrorKind::Query);
        assert_eq!(error.message(), Some(message));
    }

    #[test]
    fn config_error_keeps_kind() {
        let error = Error::from(TargetError::config("Incomplete database configuration"));
        assert_eq!(error.kind(), ErrorKind::Config);
    }

    #[test]
    fn probe_failure_becomes_generation_error() {
        let error = generation_error(TargetError::Connection("connection refused".to_owned()));
        assert_eq!(error.kind(), ErrorKind::Generation);
        assert_eq!(error.message(), Some("connection refused"));
    }
}
