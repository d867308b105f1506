//! LLM errors to HTTP errors.

use crate::handler::{Error, ErrorKind};

/// Tracing target for LLM error conversions.
const TRACING_TARGET: &str = "insight_server::handler::rig";

impl From<insight_rig::Error> for Error<'static> {
    fn from(error: insight_rig::Error) -> Self {
        match error {
            insight_rig::Error::Parse { message, raw } => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    error = %message,
                    raw_len = raw.len(),
                    "model output could not be parsed"
                );
                ErrorKind::Parse.with_message(message).with_raw(raw)
            }
            error => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    error = %error,
                    retryable = error.is_retryable(),
                    "generation failed"
                );
                ErrorKind::Generation.with_message(error.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_carries_raw_output() {
        let error = Error::from(insight_rig::Error::parse("no JSON array", "just text"));
        assert_eq!(error.kind(), ErrorKind::Parse);
        assert_eq!(error.raw(), Some("just text"));
    }

    #[test]
    fn provider_error_is_generation_error() {
        let error = Error::from(insight_rig::Error::provider("groq", "rate limited"));
        assert_eq!(error.kind(), ErrorKind::Generation);
        assert!(error.message().unwrap_or_default().contains("rate limited"));
    }
}
