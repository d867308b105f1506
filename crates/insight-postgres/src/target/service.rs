use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use super::{
    QueryResult, SchemaDescription, TargetConfig, TargetConnection, TargetDefaults, TargetResult,
    TargetTls,
};
use crate::TRACING_TARGET_TARGET;

/// Operations the API performs against a target database.
///
/// Implementations open and release their own connection per call.
#[async_trait]
pub trait TargetDatabase: Send + Sync {
    /// Introspects the target's user-visible columns.
    async fn probe_schema(&self, config: &TargetConfig) -> TargetResult<SchemaDescription>;

    /// Executes one caller-supplied statement and commits.
    async fn execute_sql(&self, config: &TargetConfig, sql: &str) -> TargetResult<QueryResult>;

    /// Opens and closes one connection.
    async fn check_connection(&self, config: &TargetConfig) -> TargetResult<()>;
}

/// [`TargetDatabase`] backed by real PostgreSQL connections.
#[derive(Debug, Clone)]
pub struct PostgresTarget {
    tls: TargetTls,
}

impl PostgresTarget {
    /// Connects with the given TLS setup.
    pub fn new(tls: TargetTls) -> Self {
        Self { tls }
    }
}

#[async_trait]
impl TargetDatabase for PostgresTarget {
    async fn probe_schema(&self, config: &TargetConfig) -> TargetResult<SchemaDescription> {
        let conn = TargetConnection::connect(config, &self.tls).await?;
        conn.probe_schema().await
    }

    async fn execute_sql(&self, config: &TargetConfig, sql: &str) -> TargetResult<QueryResult> {
        let mut conn = TargetConnection::connect(config, &self.tls).await?;
        conn.execute(sql).await
    }

    async fn check_connection(&self, config: &TargetConfig) -> TargetResult<()> {
        TargetConnection::connect(config, &self.tls).await.map(drop)
    }
}

/// Shared handle to a [`TargetDatabase`] with logging.
///
/// Cheap to clone; stored in the server state.
#[derive(Clone)]
pub struct TargetService {
    inner: Arc<dyn TargetDatabase>,
}

impl TargetService {
    /// Wraps a target database implementation.
    pub fn new<T>(target: T) -> Self
    where
        T: TargetDatabase + 'static,
    {
        Self {
            inner: Arc::new(target),
        }
    }

    /// Creates a service backed by real PostgreSQL connections.
    ///
    /// # Errors
    ///
    /// Returns [`TargetError::Config`](super::TargetError::Config) if the
    /// TLS connector cannot be built.
    pub fn postgres(defaults: &TargetDefaults) -> TargetResult<Self> {
        let tls = TargetTls::from_defaults(defaults)?;
        Ok(Self::new(PostgresTarget::new(tls)))
    }

    /// Introspects the target schema.
    pub async fn probe_schema(&self, config: &TargetConfig) -> TargetResult<SchemaDescription> {
        let start = Instant::now();
        let result = self.inner.probe_schema(config).await;
        log_outcome("probe_schema", config, start, result.as_ref().err());
        result
    }

    /// Executes one statement against the target.
    pub async fn execute_sql(
        &self,
        config: &TargetConfig,
        sql: &str,
    ) -> TargetResult<QueryResult> {
        let start = Instant::now();
        let result = self.inner.execute_sql(config, sql).await;
        log_outcome("execute_sql", config, start, result.as_ref().err());
        result
    }

    /// Verifies that the target accepts a session.
    pub async fn check_connection(&self, config: &TargetConfig) -> TargetResult<()> {
        let start = Instant::now();
        let result = self.inner.check_connection(config).await;
        log_outcome("check_connection", config, start, result.as_ref().err());
        result
    }
}

fn log_outcome(
    operation: &'static str,
    config: &TargetConfig,
    start: Instant,
    error: Option<&super::TargetError>,
) {
    let elapsed_ms = start.elapsed().as_millis();
    match error {
        None => tracing::info!(
            target: TRACING_TARGET_TARGET,
            operation,
            database = %config,
            elapsed_ms,
            "Target operation succeeded"
        ),
        Some(error) => tracing::warn!(
            target: TRACING_TARGET_TARGET,
            operation,
            database = %config,
            elapsed_ms,
            error = %error,
            "Target operation failed"
        ),
    }
}

impl fmt::Debug for TargetService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetService").finish_non_exhaustive()
    }
}
