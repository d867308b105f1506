//! Service health check.

use std::time::Instant;

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use insight_postgres::PgClient;
use jiff::Timestamp;

use crate::extract::Json;
use crate::handler::response::HealthResponse;
use crate::service::ServiceState;

/// Tracing target for monitor operations.
const TRACING_TARGET: &str = "insight_server::handler::monitors";

/// Reports whether the application database accepts connections.
#[tracing::instrument(skip_all)]
async fn health_status(State(pg_client): State<PgClient>) -> (StatusCode, Json<HealthResponse>) {
    let start = Instant::now();
    let is_healthy = match pg_client.get_connection().await {
        Ok(_conn) => true,
        Err(error) => {
            tracing::warn!(
                target: TRACING_TARGET,
                error = %error,
                "Application database unreachable"
            );
            false
        }
    };

    let status_code = if is_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    tracing::debug!(
        target: TRACING_TARGET,
        is_healthy,
        elapsed_ms = start.elapsed().as_millis(),
        "Health status checked"
    );

    let response = HealthResponse {
        is_healthy,
        updated_at: Timestamp::now(),
    };

    (status_code, Json(response))
}

fn health_status_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Health status")
        .description("Returns 503 when the application database cannot be reached.")
        .response::<200, Json<HealthResponse>>()
        .response::<503, Json<HealthResponse>>()
}

/// Returns routes for health monitoring.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route("/health", get_with(health_status, health_status_docs))
        .with_path_items(|item| item.tag("Monitors"))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;
    use crate::handler::test::{create_test_server_with_router, test_state};

    #[tokio::test]
    async fn unreachable_database_is_unhealthy() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes(), test_state()).await?;

        let response = server.get("/health").await;
        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);

        let status = response.json::<HealthResponse>();
        assert!(!status.is_healthy);
        assert!(Timestamp::now().duration_since(status.updated_at).as_secs() < 60);
        Ok(())
    }
}
