//! LLM-backed generation: SQL from questions, charts from datasets.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use insight_postgres::target::{TargetConfig, TargetDefaults, TargetService};
use insight_rig::CompletionService;

use crate::extract::Json;
use crate::handler::error::generation_error;
use crate::handler::request::{GenerateSqlRequest, GenerateVisualizationsRequest};
use crate::handler::response::{ErrorResponse, GenerateSqlResponse, VisualizationsResponse};
use crate::handler::{ErrorKind, Result};
use crate::service::ServiceState;

/// Tracing target for generation operations.
const TRACING_TARGET: &str = "insight_server::handler::generation";

/// Turns a natural-language question into one PostgreSQL statement.
///
/// The target schema is probed first and sent to the model together with
/// the question. The statement is not executed.
#[tracing::instrument(skip_all)]
async fn generate_sql(
    State(target): State<TargetService>,
    State(target_defaults): State<TargetDefaults>,
    State(completion): State<CompletionService>,
    Json(request): Json<GenerateSqlRequest>,
) -> Result<(StatusCode, Json<GenerateSqlResponse>)> {
    let Some(question) = request.natural_language() else {
        return Err(ErrorKind::MissingInput.with_message("Natural language query is required"));
    };

    let config = TargetConfig::resolve(request.db_config.as_ref(), &target_defaults)?;
    let schema = target
        .probe_schema(&config)
        .await
        .map_err(generation_error)?;

    let error_context = request.error_context();
    let sql_query = completion
        .generate_sql(&schema, question, error_context)
        .await?;

    tracing::info!(
        target: TRACING_TARGET,
        tables = schema.table_count(),
        retry = error_context.is_some(),
        "SQL generated",
    );

    Ok((
        StatusCode::OK,
        Json(GenerateSqlResponse { sql_query, schema }),
    ))
}

fn generate_sql_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Generate SQL")
        .description(
            "Probes the target schema and asks the model for one PostgreSQL statement \
             answering the question. Pass the error from running a previous attempt in \
             `error` to ask for a more robust statement.",
        )
        .response::<200, Json<GenerateSqlResponse>>()
        .response::<400, Json<ErrorResponse>>()
}

/// Suggests charts for a dataset sample.
#[tracing::instrument(skip_all)]
async fn generate_visualizations(
    State(completion): State<CompletionService>,
    Json(request): Json<GenerateVisualizationsRequest>,
) -> Result<(StatusCode, Json<VisualizationsResponse>)> {
    let Some(dataset) = request.dataset_text() else {
        return Err(ErrorKind::MissingInput.with_message("Dataset is required"));
    };

    let visualizations = completion.generate_visualizations(&dataset).await?;

    tracing::info!(
        target: TRACING_TARGET,
        dataset_len = dataset.len(),
        "Visualizations generated",
    );

    Ok((StatusCode::OK, Json(VisualizationsResponse { visualizations })))
}

fn generate_visualizations_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Generate visualizations")
        .description(
            "Asks the model for bar, pie and line chart specifications fitting the \
             dataset. When the reply holds no JSON array the response carries the raw \
             reply in `raw`.",
        )
        .response::<200, Json<VisualizationsResponse>>()
        .response::<400, Json<ErrorResponse>>()
}

/// Returns routes for LLM-backed generation.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/api/generate-sql/",
            post_with(generate_sql, generate_sql_docs),
        )
        .api_route(
            "/api/generate-visualizations/",
            post_with(generate_visualizations, generate_visualizations_docs),
        )
        .with_path_items(|item| item.tag("Generation"))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use insight_postgres::target::{ColumnDescriptor, ColumnRow, MockTarget, TargetError};
    use insight_rig::MockProvider;
    use serde_json::{Value, json};

    use super::*;
    use crate::handler::test::{create_test_server_with_router, test_state_with};

    fn users_table() -> ColumnRow {
        ColumnRow {
            table_schema: "public".to_owned(),
            table_name: "users".to_owned(),
            column: ColumnDescriptor {
                column_name: "id".to_owned(),
                data_type: "integer".to_owned(),
                is_nullable: "NO".to_owned(),
                column_default: None,
            },
        }
    }

    #[tokio::test]
    async fn returns_generated_sql_and_schema() -> anyhow::Result<()> {
        let provider = MockProvider::new("SELECT * FROM users;");
        let state = test_state_with(MockTarget::new().with_columns([users_table()]), provider.clone());
        let server = create_test_server_with_router(|_| routes(), state).await?;

        let response = server
            .post("/api/generate-sql/")
            .json(&json!({"natural_language": "Show all users"}))
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["sql_query"], "SELECT * FROM users;");
        assert_eq!(body["schema"]["public"]["users"][0]["column_name"], "id");

        let prompt = provider.last_prompt().unwrap_or_default();
        assert!(prompt.contains("Show all users"));
        assert!(prompt.contains("Table: users"));
        Ok(())
    }

    #[tokio::test]
    async fn previous_error_reaches_the_prompt() -> anyhow::Result<()> {
        let provider = MockProvider::new("SELECT 1");
        let state = test_state_with(MockTarget::new(), provider.clone());
        let server = create_test_server_with_router(|_| routes(), state).await?;

        server
            .post("/api/generate-sql/")
            .json(&json!({
                "natural_language": "count orders",
                "error": "column \"total\" does not exist"
            }))
            .await
            .assert_status_ok();
        let prompt = provider.last_prompt().unwrap_or_default();
        assert!(prompt.contains("column \"total\" does not exist"));

        server
            .post("/api/generate-sql/")
            .json(&json!({"natural_language": "count orders", "error": false}))
            .await
            .assert_status_ok();
        let prompt = provider.last_prompt().unwrap_or_default();
        assert!(!prompt.contains("does not exist"));
        Ok(())
    }

    #[tokio::test]
    async fn fenced_answer_is_unwrapped() -> anyhow::Result<()> {
        let provider = MockProvider::new("```sql\nSELECT 1;\n```");
        let state = test_state_with(MockTarget::new(), provider);
        let server = create_test_server_with_router(|_| routes(), state).await?;

        let response = server
            .post("/api/generate-sql/")
            .json(&json!({"natural_language": "one"}))
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["sql_query"], "SELECT 1;");
        Ok(())
    }

    #[tokio::test]
    async fn missing_question_is_bad_request() -> anyhow::Result<()> {
        let provider = MockProvider::new("SELECT 1");
        let state = test_state_with(MockTarget::new(), provider.clone());
        let server = create_test_server_with_router(|_| routes(), state).await?;

        let response = server.post("/api/generate-sql/").json(&json!({})).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({"error": "Natural language query is required"}));
        assert!(provider.requests().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn probe_failure_is_bad_request_without_llm_call() -> anyhow::Result<()> {
        let provider = MockProvider::new("SELECT 1");
        let target =
            MockTarget::new().with_failure(TargetError::Connection("connection refused".to_owned()));
        let state = test_state_with(target, provider.clone());
        let server = create_test_server_with_router(|_| routes(), state).await?;

        let response = server
            .post("/api/generate-sql/")
            .json(&json!({"natural_language": "anything"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({"error": "connection refused"}));
        assert!(provider.requests().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn llm_failure_is_bad_request() -> anyhow::Result<()> {
        let state = test_state_with(MockTarget::new(), MockProvider::failing("rate limited"));
        let server = create_test_server_with_router(|_| routes(), state).await?;

        let response = server
            .post("/api/generate-sql/")
            .json(&json!({"natural_language": "anything"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let error = response.json::<Value>()["error"].as_str().unwrap_or_default().to_owned();
        assert!(error.contains("rate limited"));
        Ok(())
    }

    #[tokio::test]
    async fn visualizations_pass_through() -> anyhow::Result<()> {
        let reply = r#"Here you go: [{"type": "bar", "data": {"xlabel": "month"}}, {"type": "pie", "data": null}]"#;
        let provider = MockProvider::new(reply);
        let state = test_state_with(MockTarget::new(), provider.clone());
        let server = create_test_server_with_router(|_| routes(), state).await?;

        let response = server
            .post("/api/generate-visualizations/")
            .json(&json!({"dataset": [{"month": "Jan", "sales": 3}]}))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({
            "visualizations": [
                {"type": "bar", "data": {"xlabel": "month"}},
                {"type": "pie", "data": null}
            ]
        }));

        let prompt = provider.last_prompt().unwrap_or_default();
        assert!(prompt.contains(r#"[{"month":"Jan","sales":3}]"#));
        Ok(())
    }

    #[tokio::test]
    async fn unparseable_reply_carries_raw() -> anyhow::Result<()> {
        let state = test_state_with(MockTarget::new(), MockProvider::new("no charts today"));
        let server = create_test_server_with_router(|_| routes(), state).await?;

        let response = server
            .post("/api/generate-visualizations/")
            .json(&json!({"dataset": "some dataset"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body = response.json::<Value>();
        assert!(body["error"].is_string());
        assert_eq!(body["raw"], "no charts today");
        Ok(())
    }

    #[tokio::test]
    async fn empty_dataset_is_bad_request() -> anyhow::Result<()> {
        let provider = MockProvider::new("[]");
        let state = test_state_with(MockTarget::new(), provider.clone());
        let server = create_test_server_with_router(|_| routes(), state).await?;

        let response = server
            .post("/api/generate-visualizations/")
            .json(&json!({"dataset": []}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({"error": "Dataset is required"}));
        assert!(provider.requests().is_empty());
        Ok(())
    }
}
