use insight_postgres::target::SchemaDescription;
pub use insight_postgres::target::QueryResult as RawSqlResponse;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Target database description.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DatabaseSchemaResponse {
    /// Schema → table → ordered columns.
    pub schema: SchemaDescription,
}
