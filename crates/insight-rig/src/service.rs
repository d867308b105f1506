//! Shared, logged completion handle.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use insight_postgres::target::SchemaDescription;
use serde_json::Value;

use crate::parse::{extract_json_array, strip_code_fences};
use crate::prompt::{chart_request, sql_request};
use crate::{CompletionProvider, CompletionRequest, Result, TRACING_TARGET, TRACING_TARGET_PROVIDER};

/// Generation operations over a [`CompletionProvider`].
///
/// Cheap to clone; stored in the server state.
#[derive(Clone)]
pub struct CompletionService {
    inner: Arc<dyn CompletionProvider>,
}

impl CompletionService {
    /// Wraps a provider.
    pub fn new<P>(provider: P) -> Self
    where
        P: CompletionProvider + 'static,
    {
        Self {
            inner: Arc::new(provider),
        }
    }

    /// Sends one request and returns the trimmed reply.
    pub async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let start = Instant::now();
        let provider = self.inner.provider_name();
        let model = self.inner.model_name();

        tracing::debug!(
            target: TRACING_TARGET_PROVIDER,
            provider,
            model,
            prompt_len = request.prompt.len(),
            "Sending completion request"
        );

        match self.inner.complete(request).await {
            Ok(reply) => {
                tracing::info!(
                    target: TRACING_TARGET_PROVIDER,
                    provider,
                    model,
                    reply_len = reply.len(),
                    elapsed_ms = start.elapsed().as_millis(),
                    "Completion finished"
                );
                Ok(reply.trim().to_owned())
            }
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET_PROVIDER,
                    provider,
                    model,
                    elapsed_ms = start.elapsed().as_millis(),
                    error = %error,
                    "Completion failed"
                );
                Err(error)
            }
        }
    }

    /// Generates one PostgreSQL statement answering `question`.
    ///
    /// The reply is returned unvalidated, with any markdown fence removed.
    pub async fn generate_sql(
        &self,
        schema: &SchemaDescription,
        question: &str,
        error_context: Option<&str>,
    ) -> Result<String> {
        let request = sql_request(schema, question, error_context);
        let reply = self.complete(&request).await?;
        let sql = strip_code_fences(&reply).to_owned();

        tracing::debug!(
            target: TRACING_TARGET,
            tables = schema.table_count(),
            retry = error_context.is_some_and(|e| !e.trim().is_empty()),
            "SQL generated"
        );

        Ok(sql)
    }

    /// Generates chart specifications for a dataset sample.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Parse`] with the raw reply if it holds no
    /// JSON array.
    pub async fn generate_visualizations(&self, dataset: &str) -> Result<Value> {
        let request = chart_request(dataset);
        let reply = self.complete(&request).await?;
        extract_json_array(&reply)
    }
}

impl fmt::Debug for CompletionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionService")
            .field("provider", &self.inner.provider_name())
            .field("model", &self.inner.model_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{Error, MockProvider};

    #[tokio::test]
    async fn generate_sql_trims_and_strips_fences() -> anyhow::Result<()> {
        let provider = MockProvider::new("\n```sql\nSELECT \"id\" FROM \"public\".\"users\";\n```\n");
        let service = CompletionService::new(provider.clone());

        let sql = service
            .generate_sql(&SchemaDescription::default(), "all user ids", None)
            .await?;

        assert_eq!(sql, "SELECT \"id\" FROM \"public\".\"users\";");
        assert_eq!(provider.requests().len(), 1);
        assert!(provider.last_prompt().unwrap_or_default().contains("all user ids"));
        Ok(())
    }

    #[tokio::test]
    async fn generate_sql_passes_error_context() -> anyhow::Result<()> {
        let provider = MockProvider::new("SELECT 1");
        let service = CompletionService::new(provider.clone());

        service
            .generate_sql(&SchemaDescription::default(), "q", Some("syntax error at or near \"FROM\""))
            .await?;

        let prompt = provider.last_prompt().unwrap_or_default();
        assert!(prompt.contains("syntax error at or near \"FROM\""));
        Ok(())
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let service = CompletionService::new(MockProvider::failing("rate limited"));
        let err = service
            .generate_sql(&SchemaDescription::default(), "q", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Provider { .. }));
        assert!(err.to_string().contains("rate limited"));
    }

    #[tokio::test]
    async fn generate_visualizations_extracts_array() -> anyhow::Result<()> {
        let reply = "Sure! [{\"type\":\"bar\",\"data\":{\"xlabel\":\"m\",\"ylabel\":\"s\",\
                     \"xvalues\":[\"Jan\"],\"yvalues\":[3]}},{\"type\":\"pie\",\"data\":null}]";
        let service = CompletionService::new(MockProvider::new(reply));

        let charts = service.generate_visualizations("[{\"m\":\"Jan\",\"s\":3}]").await?;
        assert_eq!(charts[1], json!({"type": "pie", "data": null}));
        assert_eq!(charts[0]["data"]["yvalues"], json!([3]));
        Ok(())
    }

    #[tokio::test]
    async fn generate_visualizations_reports_raw_output() {
        let service = CompletionService::new(MockProvider::new("  I cannot chart this.  "));
        let err = service.generate_visualizations("x").await.unwrap_err();
        assert_eq!(err.raw(), Some("I cannot chart this."));
    }
}
