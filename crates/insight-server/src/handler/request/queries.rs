use insight_postgres::target::TargetParams;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Request payload for running one statement.
///
/// Fields are optional on the wire so that a missing `query` is reported
/// as missing input rather than a malformed body.
#[must_use]
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RawSqlRequest {
    /// Statement to run, verbatim.
    #[serde(default)]
    pub query: Option<String>,
    /// Target database; the configured default when omitted.
    #[serde(default)]
    pub db_config: Option<TargetParams>,
}

impl RawSqlRequest {
    /// Returns the statement unless it is absent or blank.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref().filter(|q| !q.trim().is_empty())
    }
}

/// Request payload for describing a target database.
#[must_use]
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct DatabaseSchemaRequest {
    /// Target database; the configured default when omitted.
    #[serde(default)]
    pub db_config: Option<TargetParams>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_query_is_missing() {
        let request: RawSqlRequest = serde_json::from_str(r#"{"query": "   "}"#).unwrap();
        assert!(request.query().is_none());

        let request: RawSqlRequest = serde_json::from_str("{}").unwrap();
        assert!(request.query().is_none());
    }

    #[test]
    fn string_port_is_accepted() {
        let request: DatabaseSchemaRequest = serde_json::from_str(
            r#"{"db_config": {"name": "d", "user": "u", "password": "p", "host": "h", "port": "19551"}}"#,
        )
        .unwrap();
        assert!(request.db_config.is_some_and(|c| c.port.is_some()));
    }
}
