//! Stored connection record handlers.
//!
//! Records describe target databases by name. Passwords are accepted on
//! write and never serialized back.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use insight_postgres::model;
use insight_postgres::query::ConnectionRepository;
use insight_postgres::target::{TargetConfig, TargetDefaults, TargetService};
use insight_postgres::{PgClient, PgConn};

use crate::extract::{Json, Path, ValidateJson};
use crate::handler::request::{ConnectionPathParams, CreateConnection, UpdateConnection};
use crate::handler::response::{Connection, Connections, ErrorResponse};
use crate::handler::{ErrorKind, Result};
use crate::service::ServiceState;

/// Tracing target for connection record operations.
const TRACING_TARGET: &str = "insight_server::handler::connections";

/// Creates a stored connection.
#[tracing::instrument(skip_all)]
async fn create_connection(
    State(pg_client): State<PgClient>,
    ValidateJson(request): ValidateJson<CreateConnection>,
) -> Result<(StatusCode, Json<Connection>)> {
    tracing::debug!(target: TRACING_TARGET, "Creating connection");

    let mut conn = pg_client.get_connection().await?;
    let connection = conn.create_connection(request.into_model()).await?;

    tracing::info!(
        target: TRACING_TARGET,
        connection_id = connection.id,
        "Connection created",
    );

    Ok((
        StatusCode::CREATED,
        Json(Connection::from_model(connection)),
    ))
}

fn create_connection_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Create connection")
        .description(
            "Stores connection parameters for a target database. The password is \
             write-only and never returned.",
        )
        .response::<201, Json<Connection>>()
        .response::<400, Json<ErrorResponse>>()
}

/// Lists stored connections, newest first.
#[tracing::instrument(skip_all)]
async fn list_connections(
    State(pg_client): State<PgClient>,
) -> Result<(StatusCode, Json<Connections>)> {
    let mut conn = pg_client.get_connection().await?;
    let connections = conn.list_connections().await?;

    tracing::debug!(
        target: TRACING_TARGET,
        connection_count = connections.len(),
        "Connections listed",
    );

    let connections = connections.into_iter().map(Connection::from_model).collect();
    Ok((StatusCode::OK, Json(connections)))
}

fn list_connections_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List connections")
        .description("Returns every stored connection, newest first.")
        .response::<200, Json<Connections>>()
}

/// Retrieves one stored connection.
#[tracing::instrument(skip_all, fields(connection_id = path_params.id))]
async fn read_connection(
    State(pg_client): State<PgClient>,
    Path(path_params): Path<ConnectionPathParams>,
) -> Result<(StatusCode, Json<Connection>)> {
    let mut conn = pg_client.get_connection().await?;
    let connection = find_connection(&mut conn, path_params.id).await?;

    Ok((StatusCode::OK, Json(Connection::from_model(connection))))
}

fn read_connection_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get connection")
        .description("Returns one stored connection without its password.")
        .response::<200, Json<Connection>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Updates a stored connection.
///
/// Serves both `PUT` and `PATCH`; fields missing from the body keep their
/// stored values.
#[tracing::instrument(skip_all, fields(connection_id = path_params.id))]
async fn update_connection(
    State(pg_client): State<PgClient>,
    Path(path_params): Path<ConnectionPathParams>,
    ValidateJson(request): ValidateJson<UpdateConnection>,
) -> Result<(StatusCode, Json<Connection>)> {
    tracing::debug!(target: TRACING_TARGET, "Updating connection");

    let mut conn = pg_client.get_connection().await?;
    let changes = request.into_model();

    let connection = conn
        .update_connection(path_params.id, changes)
        .await?
        .ok_or_else(connection_not_found)?;

    tracing::info!(target: TRACING_TARGET, "Connection updated");

    Ok((StatusCode::OK, Json(Connection::from_model(connection))))
}

fn update_connection_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Update connection")
        .description("Updates the given fields of a stored connection.")
        .response::<200, Json<Connection>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Deletes a stored connection.
#[tracing::instrument(skip_all, fields(connection_id = path_params.id))]
async fn delete_connection(
    State(pg_client): State<PgClient>,
    Path(path_params): Path<ConnectionPathParams>,
) -> Result<StatusCode> {
    let mut conn = pg_client.get_connection().await?;

    if !conn.delete_connection(path_params.id).await? {
        return Err(connection_not_found());
    }

    tracing::info!(target: TRACING_TARGET, "Connection deleted");

    Ok(StatusCode::NO_CONTENT)
}

fn delete_connection_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Delete connection")
        .description("Permanently removes a stored connection.")
        .response::<204, ()>()
        .response::<404, Json<ErrorResponse>>()
}

/// Opens and closes one session against the stored target.
///
/// On success `last_connected_at` is stamped and the record returned.
#[tracing::instrument(skip_all, fields(connection_id = path_params.id))]
async fn test_connection(
    State(pg_client): State<PgClient>,
    State(target): State<TargetService>,
    State(target_defaults): State<TargetDefaults>,
    Path(path_params): Path<ConnectionPathParams>,
) -> Result<(StatusCode, Json<Connection>)> {
    let mut conn = pg_client.get_connection().await?;
    let stored = find_connection(&mut conn, path_params.id).await?;

    let params = stored.target_params();
    let config = TargetConfig::resolve(Some(&params), &target_defaults)?;
    target.check_connection(&config).await?;

    let connection = conn
        .touch_connection(stored.id)
        .await?
        .ok_or_else(connection_not_found)?;

    tracing::info!(target: TRACING_TARGET, "Connection verified");

    Ok((StatusCode::OK, Json(Connection::from_model(connection))))
}

fn test_connection_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Test connection")
        .description(
            "Opens one session against the stored target database and records the \
             time of the successful attempt.",
        )
        .response::<200, Json<Connection>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

fn connection_not_found() -> crate::handler::Error<'static> {
    ErrorKind::NotFound
        .with_message("Connection not found")
        .with_resource("connection")
}

/// Finds a connection by ID or returns NotFound error.
async fn find_connection(conn: &mut PgConn, connection_id: i32) -> Result<model::Connection> {
    conn.find_connection_by_id(connection_id)
        .await?
        .ok_or_else(connection_not_found)
}

/// Returns routes for stored connection management.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/api/connections/",
            post_with(create_connection, create_connection_docs)
                .get_with(list_connections, list_connections_docs),
        )
        .api_route(
            "/api/connections/{id}/",
            get_with(read_connection, read_connection_docs)
                .put_with(update_connection, update_connection_docs)
                .patch_with(update_connection, update_connection_docs)
                .delete_with(delete_connection, delete_connection_docs),
        )
        .api_route(
            "/api/connections/{id}/test/",
            post_with(test_connection, test_connection_docs),
        )
        .with_path_items(|item| item.tag("Connections"))
}
