//! Completion providers.

mod groq;
#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
mod mock;

use async_trait::async_trait;
pub use groq::GroqProvider;
#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockProvider;

use crate::Result;

/// A single-turn completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// System instruction.
    pub system: String,
    /// User prompt.
    pub prompt: String,
}

impl CompletionRequest {
    /// Creates a new request.
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
        }
    }
}

/// A chat-completion backend.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Sends one request and returns the text of the first choice.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Returns the provider name, used in logs and errors.
    fn provider_name(&self) -> &str;

    /// Returns the model name.
    fn model_name(&self) -> &str;
}
