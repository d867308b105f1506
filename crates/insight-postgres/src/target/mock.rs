//! In-memory [`TargetDatabase`] for tests.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use super::{
    ColumnRow, QueryResult, Row, SchemaDescription, StatementKind, TargetConfig, TargetDatabase,
    TargetError, TargetResult,
};

/// A target database that answers from canned data.
///
/// `SELECT` statements return the configured rows, everything else the
/// configured row count. Every executed statement and every config it was
/// called with is recorded.
#[derive(Debug, Clone, Default)]
pub struct MockTarget {
    columns: Vec<ColumnRow>,
    rows: Vec<Row>,
    affected_rows: u64,
    failure: Option<TargetError>,
    statements: Arc<Mutex<Vec<String>>>,
    configs: Arc<Mutex<Vec<TargetConfig>>>,
}

impl MockTarget {
    /// Creates an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the catalog rows returned by schema probes.
    pub fn with_columns(mut self, columns: impl IntoIterator<Item = ColumnRow>) -> Self {
        self.columns = columns.into_iter().collect();
        self
    }

    /// Sets the rows returned by `SELECT` statements.
    pub fn with_rows(mut self, rows: impl IntoIterator<Item = Row>) -> Self {
        self.rows = rows.into_iter().collect();
        self
    }

    /// Sets the row count returned by other statements.
    pub fn with_affected_rows(mut self, affected_rows: u64) -> Self {
        self.affected_rows = affected_rows;
        self
    }

    /// Makes every operation fail with `error`.
    pub fn with_failure(mut self, error: TargetError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Returns the statements executed so far.
    pub fn statements(&self) -> Vec<String> {
        self.statements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the configs operations were called with.
    pub fn configs(&self) -> Vec<TargetConfig> {
        self.configs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, config: &TargetConfig) -> TargetResult<()> {
        self.configs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(config.clone());

        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TargetDatabase for MockTarget {
    async fn probe_schema(&self, config: &TargetConfig) -> TargetResult<SchemaDescription> {
        self.record(config)?;
        Ok(SchemaDescription::from_rows(self.columns.clone()))
    }

    async fn execute_sql(&self, config: &TargetConfig, sql: &str) -> TargetResult<QueryResult> {
        self.statements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sql.to_owned());
        self.record(config)?;

        Ok(match StatementKind::classify(sql) {
            StatementKind::Rows => QueryResult::Rows {
                results: self.rows.clone(),
            },
            StatementKind::Command => QueryResult::Affected {
                affected_rows: self.affected_rows,
            },
        })
    }

    async fn check_connection(&self, config: &TargetConfig) -> TargetResult<()> {
        self.record(config)
    }
}
