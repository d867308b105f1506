//! Groq chat-completion provider.

use std::fmt;

use async_trait::async_trait;
use rig::completion::{AssistantContent, CompletionModel as _};
use rig::one_or_many::OneOrMany;
use rig::prelude::CompletionClient;
use rig::providers::groq;

use super::{CompletionProvider, CompletionRequest};
use crate::{Error, Result, RigConfig};

const PROVIDER: &str = "groq";

/// [`CompletionProvider`] backed by Groq through rig-core.
#[derive(Clone)]
pub struct GroqProvider {
    model: groq::CompletionModel,
    model_name: String,
    temperature: Option<f64>,
}

impl GroqProvider {
    /// Creates a provider from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an invalid configuration and
    /// [`Error::Provider`] if the HTTP client cannot be built.
    pub fn new(config: &RigConfig) -> Result<Self> {
        config.validate()?;

        let client = groq::Client::new(&config.groq_api_key)
            .map_err(|e| Error::provider(PROVIDER, e.to_string()))?;

        Ok(Self {
            model: client.completion_model(&config.groq_model),
            model_name: config.groq_model.clone(),
            temperature: config.llm_temperature,
        })
    }
}

#[async_trait]
impl CompletionProvider for GroqProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let mut builder = self
            .model
            .completion_request(request.prompt.as_str())
            .preamble(request.system.clone());

        if let Some(temperature) = self.temperature {
            builder = builder.temperature(temperature);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER, e.to_string()))?;

        Ok(extract_text_content(&response.choice))
    }

    fn provider_name(&self) -> &str {
        PROVIDER
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Concatenates the text parts of the first choice.
fn extract_text_content(choice: &OneOrMany<AssistantContent>) -> String {
    choice
        .iter()
        .filter_map(|content| match content {
            AssistantContent::Text(text) => Some(text.text()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("")
}

impl fmt::Debug for GroqProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroqProvider")
            .field("model", &self.model_name)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}
