//! Connection record repository.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use jiff_diesel::Timestamp;

use crate::model::{Connection, NewConnection, UpdateConnection};
use crate::{PgConnection, PgError, PgResult, TRACING_TARGET_QUERY, schema};

/// Repository for stored connection records.
pub trait ConnectionRepository {
    /// Inserts a new connection record.
    fn create_connection(
        &mut self,
        new_connection: NewConnection,
    ) -> impl Future<Output = PgResult<Connection>> + Send;

    /// Lists all connection records, newest first.
    fn list_connections(&mut self) -> impl Future<Output = PgResult<Vec<Connection>>> + Send;

    /// Finds a connection record by its identifier.
    fn find_connection_by_id(
        &mut self,
        connection_id: i32,
    ) -> impl Future<Output = PgResult<Option<Connection>>> + Send;

    /// Applies a partial update and sets `updated_at` to now, returning
    /// `None` if the record does not exist.
    fn update_connection(
        &mut self,
        connection_id: i32,
        updates: UpdateConnection,
    ) -> impl Future<Output = PgResult<Option<Connection>>> + Send;

    /// Deletes a connection record, returning whether one was removed.
    fn delete_connection(
        &mut self,
        connection_id: i32,
    ) -> impl Future<Output = PgResult<bool>> + Send;

    /// Records a successful connectivity check.
    fn touch_connection(
        &mut self,
        connection_id: i32,
    ) -> impl Future<Output = PgResult<Option<Connection>>> + Send;
}

impl ConnectionRepository for PgConnection {
    async fn create_connection(&mut self, new_connection: NewConnection) -> PgResult<Connection> {
        use schema::connections;

        let connection = diesel::insert_into(connections::table)
            .values(&new_connection)
            .returning(Connection::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        tracing::debug!(
            target: TRACING_TARGET_QUERY,
            connection_id = connection.id,
            "Connection record created"
        );

        Ok(connection)
    }

    async fn list_connections(&mut self) -> PgResult<Vec<Connection>> {
        use schema::connections::{self, dsl};

        let connections = connections::table
            .order((dsl::created_at.desc(), dsl::id.desc()))
            .select(Connection::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(connections)
    }

    async fn find_connection_by_id(&mut self, connection_id: i32) -> PgResult<Option<Connection>> {
        use schema::connections::{self, dsl};

        let connection = connections::table
            .filter(dsl::id.eq(connection_id))
            .select(Connection::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(connection)
    }

    async fn update_connection(
        &mut self,
        connection_id: i32,
        updates: UpdateConnection,
    ) -> PgResult<Option<Connection>> {
        use schema::connections::{self, dsl};

        // Every write moves `updated_at`, including one with no field changes.
        let touch_only = updates.is_empty();

        let connection = diesel::update(connections::table.filter(dsl::id.eq(connection_id)))
            .set((&updates, dsl::updated_at.eq(diesel::dsl::now)))
            .returning(Connection::as_returning())
            .get_result(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        tracing::debug!(
            target: TRACING_TARGET_QUERY,
            connection_id,
            touch_only,
            found = connection.is_some(),
            "Connection record updated"
        );

        Ok(connection)
    }

    async fn delete_connection(&mut self, connection_id: i32) -> PgResult<bool> {
        use schema::connections::{self, dsl};

        let deleted = diesel::delete(connections::table.filter(dsl::id.eq(connection_id)))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(deleted > 0)
    }

    async fn touch_connection(&mut self, connection_id: i32) -> PgResult<Option<Connection>> {
        let updates = UpdateConnection {
            last_connected_at: Some(Some(Timestamp::from(jiff::Timestamp::now()))),
            ..Default::default()
        };

        self.update_connection(connection_id, updates).await
    }
}
