//! Hooks run around [`run_pending_migrations`].
//!
//! [`run_pending_migrations`]: super::run_pending_migrations

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::PoolableConnection;

use crate::{PgError, PgResult, TRACING_TARGET_MIGRATION};

/// Refuses to start migrating on a connection that is already broken.
pub async fn pre_migrate(conn: &mut AsyncPgConnection) -> PgResult<()> {
    if conn.is_broken() {
        tracing::error!(
            target: TRACING_TARGET_MIGRATION,
            hook = "pre_migrate",
            "Connection is broken before migrations"
        );
        return Err(PgError::Migration("connection is broken".into()));
    }

    tracing::debug!(target: TRACING_TARGET_MIGRATION, hook = "pre_migrate", "Preparing to run migrations");
    Ok(())
}

/// Reports the connection state once migrations have finished.
pub async fn post_migrate(conn: &mut AsyncPgConnection) -> PgResult<()> {
    if conn.is_broken() {
        tracing::error!(
            target: TRACING_TARGET_MIGRATION,
            hook = "post_migrate",
            "Connection is broken after migrations, possible migration failure"
        );
    }

    Ok(())
}
