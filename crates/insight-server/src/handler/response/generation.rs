use insight_postgres::target::SchemaDescription;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Generated SQL together with the schema it was generated against.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GenerateSqlResponse {
    /// The model's statement, unvalidated.
    pub sql_query: String,
    /// The probed schema.
    pub schema: SchemaDescription,
}

/// Chart suggestions for a dataset.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VisualizationsResponse {
    /// JSON array of `{"type": "bar" | "pie" | "line", "data": {...} | null}`,
    /// passed through as produced by the model.
    pub visualizations: serde_json::Value,
}
