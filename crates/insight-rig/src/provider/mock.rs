//! Scripted [`CompletionProvider`] for tests.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use super::{CompletionProvider, CompletionRequest};
use crate::{Error, Result};

/// A provider that returns a fixed reply and records every request.
#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    reply: String,
    failure: Option<String>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockProvider {
    /// Creates a provider that always answers `reply`.
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            ..Default::default()
        }
    }

    /// Creates a provider whose calls always fail with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Default::default()
        }
    }

    /// Returns the requests received so far.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the user prompt of the most recent request.
    pub fn last_prompt(&self) -> Option<String> {
        self.requests().last().map(|request| request.prompt.clone())
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        match &self.failure {
            Some(message) => Err(Error::provider(self.provider_name(), message)),
            None => Ok(self.reply.clone()),
        }
    }

    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}
