//! Raw SQL execution and schema description against a target database.
//!
//! Both operations resolve `db_config` against the configured defaults and
//! open exactly one target connection per request.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use insight_postgres::target::{TargetConfig, TargetDefaults, TargetService};

use crate::extract::Json;
use crate::handler::request::{DatabaseSchemaRequest, RawSqlRequest};
use crate::handler::response::{DatabaseSchemaResponse, ErrorResponse, RawSqlResponse};
use crate::handler::{ErrorKind, Result};
use crate::service::ServiceState;

/// Tracing target for query operations.
const TRACING_TARGET: &str = "insight_server::handler::queries";

/// Runs one caller-supplied statement and commits.
///
/// Engine errors are returned verbatim in the `error` field.
#[tracing::instrument(skip_all)]
async fn raw_sql(
    State(target): State<TargetService>,
    State(target_defaults): State<TargetDefaults>,
    Json(request): Json<RawSqlRequest>,
) -> Result<(StatusCode, Json<RawSqlResponse>)> {
    let Some(query) = request.query() else {
        return Err(ErrorKind::MissingInput.with_message("Query is required"));
    };

    let config = TargetConfig::resolve(request.db_config.as_ref(), &target_defaults)?;

    tracing::debug!(
        target: TRACING_TARGET,
        database = %config,
        query_len = query.len(),
        "Executing raw SQL",
    );

    let result = target.execute_sql(&config, query).await?;
    Ok((StatusCode::OK, Json(result)))
}

fn raw_sql_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Run SQL")
        .description(
            "Executes one statement verbatim against the target database and commits. \
             SELECT statements return `results`; anything else returns `affected_rows`.",
        )
        .response::<200, Json<RawSqlResponse>>()
        .response::<400, Json<ErrorResponse>>()
}

/// Describes the target database's user-visible columns.
#[tracing::instrument(skip_all)]
async fn database_schema(
    State(target): State<TargetService>,
    State(target_defaults): State<TargetDefaults>,
    Json(request): Json<DatabaseSchemaRequest>,
) -> Result<(StatusCode, Json<DatabaseSchemaResponse>)> {
    let config = TargetConfig::resolve(request.db_config.as_ref(), &target_defaults)?;
    let schema = target.probe_schema(&config).await?;

    tracing::debug!(
        target: TRACING_TARGET,
        tables = schema.table_count(),
        "Schema described",
    );

    Ok((StatusCode::OK, Json(DatabaseSchemaResponse { schema })))
}

fn database_schema_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Describe schema")
        .description(
            "Returns schema, table and column metadata from `information_schema`, \
             in catalog order.",
        )
        .response::<200, Json<DatabaseSchemaResponse>>()
        .response::<400, Json<ErrorResponse>>()
}

/// Returns routes for SQL execution and schema description.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route("/api/raw-sql/", post_with(raw_sql, raw_sql_docs))
        .api_route(
            "/api/database-schema/",
            post_with(database_schema, database_schema_docs),
        )
        .with_path_items(|item| item.tag("Queries"))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use insight_postgres::target::{
        ColumnDescriptor, ColumnRow, MockTarget, Row, TargetError,
    };
    use insight_rig::MockProvider;
    use serde_json::{Value, json};

    use super::*;
    use crate::handler::test::{create_test_server_with_router, test_state_with};

    fn id_row() -> Row {
        let mut row = Row::new();
        row.insert("id".to_owned(), json!(1));
        row
    }

    fn full_db_config() -> Value {
        json!({
            "name": "warehouse",
            "user": "analyst",
            "password": "hunter2",
            "host": "db.internal",
            "port": "19551"
        })
    }

    #[tokio::test]
    async fn missing_query_is_bad_request() -> anyhow::Result<()> {
        let target = MockTarget::new();
        let state = test_state_with(target.clone(), MockProvider::new(""));
        let server = create_test_server_with_router(|_| routes(), state).await?;

        let response = server.post("/api/raw-sql/").json(&json!({})).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({"error": "Query is required"}));
        assert!(target.configs().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn select_returns_results() -> anyhow::Result<()> {
        let target = MockTarget::new().with_rows([id_row()]);
        let state = test_state_with(target.clone(), MockProvider::new(""));
        let server = create_test_server_with_router(|_| routes(), state).await?;

        let response = server
            .post("/api/raw-sql/")
            .json(&json!({"query": "SELECT * FROM test_table"}))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({"results": [{"id": 1}]}));
        assert_eq!(target.statements(), ["SELECT * FROM test_table"]);

        let configs = target.configs();
        let config = &configs[0];
        assert_eq!(config.dbname, "querydb");
        assert_eq!(config.port, 5432);
        Ok(())
    }

    #[tokio::test]
    async fn insert_returns_affected_rows() -> anyhow::Result<()> {
        let target = MockTarget::new().with_affected_rows(1);
        let state = test_state_with(target, MockProvider::new(""));
        let server = create_test_server_with_router(|_| routes(), state).await?;

        let response = server
            .post("/api/raw-sql/")
            .json(&json!({"query": "INSERT INTO test_table (id) VALUES (1)"}))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({"affected_rows": 1}));
        Ok(())
    }

    #[tokio::test]
    async fn supplied_db_config_is_used() -> anyhow::Result<()> {
        let target = MockTarget::new().with_affected_rows(0);
        let state = test_state_with(target.clone(), MockProvider::new(""));
        let server = create_test_server_with_router(|_| routes(), state).await?;

        let response = server
            .post("/api/raw-sql/")
            .json(&json!({"query": "CREATE TABLE t (id int)", "db_config": full_db_config()}))
            .await;

        response.assert_status_ok();
        let configs = target.configs();
        let config = &configs[0];
        assert_eq!(config.dbname, "warehouse");
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 19551);
        Ok(())
    }

    #[tokio::test]
    async fn incomplete_db_config_fails_before_connecting() -> anyhow::Result<()> {
        let target = MockTarget::new();
        let state = test_state_with(target.clone(), MockProvider::new(""));
        let server = create_test_server_with_router(|_| routes(), state).await?;

        let response = server
            .post("/api/raw-sql/")
            .json(&json!({"query": "SELECT 1", "db_config": {"name": "warehouse"}}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let error = response.json::<Value>()["error"].as_str().unwrap_or_default().to_owned();
        assert!(error.contains("user"));
        assert!(error.contains("host"));
        assert!(target.configs().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn engine_error_text_passes_through() -> anyhow::Result<()> {
        let message = "relation \"missing\" does not exist";
        let target = MockTarget::new().with_failure(TargetError::Query(message.to_owned()));
        let state = test_state_with(target, MockProvider::new(""));
        let server = create_test_server_with_router(|_| routes(), state).await?;

        let response = server
            .post("/api/raw-sql/")
            .json(&json!({"query": "SELECT * FROM missing"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({"error": message}));
        Ok(())
    }

    #[tokio::test]
    async fn schema_keeps_catalog_order() -> anyhow::Result<()> {
        let column = |schema: &str, table: &str| ColumnRow {
            table_schema: schema.to_owned(),
            table_name: table.to_owned(),
            column: ColumnDescriptor {
                column_name: "id".to_owned(),
                data_type: "integer".to_owned(),
                is_nullable: "NO".to_owned(),
                column_default: None,
            },
        };
        let target = MockTarget::new().with_columns([
            column("sales", "orders"),
            column("analytics", "events"),
        ]);
        let state = test_state_with(target, MockProvider::new(""));
        let server = create_test_server_with_router(|_| routes(), state).await?;

        let response = server.post("/api/database-schema/").json(&json!({})).await;
        response.assert_status_ok();

        let text = response.text();
        assert!(text.find("sales") < text.find("analytics"));
        let body = response.json::<Value>();
        assert_eq!(body["schema"]["sales"]["orders"][0]["is_nullable"], "NO");
        assert!(body["schema"]["sales"]["orders"][0]["column_default"].is_null());
        Ok(())
    }

    #[tokio::test]
    async fn schema_connection_failure_is_bad_request() -> anyhow::Result<()> {
        let target = MockTarget::new()
            .with_failure(TargetError::Connection("connection refused".to_owned()));
        let state = test_state_with(target, MockProvider::new(""));
        let server = create_test_server_with_router(|_| routes(), state).await?;

        let response = server.post("/api/database-schema/").json(&json!({})).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(response.json::<Value>()["error"].is_string());
        Ok(())
    }
}
