//! Execution of caller-supplied SQL against a target database.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use tokio_postgres::{SimpleColumn, SimpleQueryMessage};
use tokio_postgres::types::Type;

use super::{TargetConnection, TargetError, TargetResult};
use crate::TRACING_TARGET_TARGET;

/// One result row: column name to JSON value, in declared column order.
pub type Row = Map<String, Value>;

/// Outcome of a raw SQL statement.
///
/// Serializes untagged, as either `{"results": [...]}` or
/// `{"affected_rows": n}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(untagged)]
pub enum QueryResult {
    /// Rows returned by a `SELECT`.
    Rows { results: Vec<Row> },
    /// Row count reported for the last completed command.
    Affected { affected_rows: u64 },
}

/// How a statement is run, decided from its leading keyword only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// Prepared for its column types, then run; produces rows.
    Rows,
    /// Run through the simple-query protocol; produces a row count.
    Command,
}

impl StatementKind {
    /// Classifies statement text: anything starting with `SELECT`
    /// (case-insensitive, ignoring surrounding whitespace) returns rows.
    pub fn classify(sql: &str) -> Self {
        if sql.trim().to_uppercase().starts_with("SELECT") {
            Self::Rows
        } else {
            Self::Command
        }
    }
}

const INTEGER_TYPES: &[Type] = &[Type::INT2, Type::INT4, Type::INT8, Type::OID];
const FLOAT_TYPES: &[Type] = &[Type::FLOAT4, Type::FLOAT8, Type::NUMERIC];
const JSON_TYPES: &[Type] = &[Type::JSON, Type::JSONB];

/// Converts the engine's text rendering of a value into JSON.
///
/// Values that do not fit the JSON counterpart of their type (non-finite
/// floats, out-of-range numerics) keep their text form.
pub(crate) fn column_value(ty: &Type, text: Option<&str>) -> Value {
    let Some(text) = text else {
        return Value::Null;
    };

    let as_text = || Value::String(text.to_owned());
    if *ty == Type::BOOL {
        match text {
            "t" => Value::Bool(true),
            "f" => Value::Bool(false),
            _ => as_text(),
        }
    } else if INTEGER_TYPES.contains(ty) {
        text.parse::<i64>().map(Value::from).unwrap_or_else(|_| as_text())
    } else if FLOAT_TYPES.contains(ty) {
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map_or_else(as_text, Value::Number)
    } else if JSON_TYPES.contains(ty) {
        serde_json::from_str(text).unwrap_or_else(|_| as_text())
    } else {
        as_text()
    }
}

impl TargetConnection {
    /// Executes `sql` exactly once inside a transaction and commits.
    ///
    /// The commit happens regardless of statement kind, so data-modifying
    /// statements that happen to return rows are persisted too.
    ///
    /// # Errors
    ///
    /// Returns [`TargetError::Query`] carrying the engine's message if
    /// preparing, executing or committing fails. The transaction is rolled
    /// back in that case.
    pub async fn execute(&mut self, sql: &str) -> TargetResult<QueryResult> {
        let start = Instant::now();
        let kind = StatementKind::classify(sql);

        let result = self.execute_in_transaction(sql, kind).await;
        match &result {
            Ok(QueryResult::Rows { results }) => tracing::debug!(
                target: TRACING_TARGET_TARGET,
                rows = results.len(),
                elapsed_ms = start.elapsed().as_millis(),
                "Statement returned rows"
            ),
            Ok(QueryResult::Affected { affected_rows }) => tracing::debug!(
                target: TRACING_TARGET_TARGET,
                affected_rows,
                elapsed_ms = start.elapsed().as_millis(),
                "Statement completed"
            ),
            Err(error) => tracing::debug!(
                target: TRACING_TARGET_TARGET,
                error = %error,
                kind = ?kind,
                elapsed_ms = start.elapsed().as_millis(),
                "Statement failed"
            ),
        }

        result
    }

    async fn execute_in_transaction(
        &mut self,
        sql: &str,
        kind: StatementKind,
    ) -> TargetResult<QueryResult> {
        // Prepared outside the transaction: a failed parse would otherwise
        // abort it before the simple-query fallback could run.
        let prepared = match kind {
            StatementKind::Rows => Some(self.client().prepare(sql).await),
            StatementKind::Command => None,
        };

        let transaction = self
            .client_mut()
            .transaction()
            .await
            .map_err(|e| TargetError::query(&e))?;

        let result = match kind {
            StatementKind::Rows => match prepared {
                Some(Ok(statement)) => {
                    let columns: Vec<(String, Type)> = statement
                        .columns()
                        .iter()
                        .map(|column| (column.name().to_owned(), column.type_().clone()))
                        .collect();

                    let results = if columns.is_empty() {
                        transaction
                            .execute(&statement, &[])
                            .await
                            .map_err(|e| TargetError::query(&e))?;
                        Vec::new()
                    } else {
                        // The simple-query protocol returns every value as
                        // text, which is then typed using the prepared
                        // column types.
                        let messages = transaction
                            .simple_query(sql)
                            .await
                            .map_err(|e| TargetError::query(&e))?;

                        messages
                            .iter()
                            .filter_map(|message| match message {
                                SimpleQueryMessage::Row(row) => Some(row),
                                _ => None,
                            })
                            .map(|row| {
                                columns
                                    .iter()
                                    .enumerate()
                                    .map(|(index, (name, ty))| {
                                        (name.clone(), column_value(ty, row.get(index)))
                                    })
                                    .collect::<Row>()
                            })
                            .collect()
                    };

                    QueryResult::Rows { results }
                }
                prepare_failed => {
                    if let Some(Err(error)) = &prepare_failed {
                        tracing::debug!(
                            target: TRACING_TARGET_TARGET,
                            error = %error,
                            "Statement cannot be prepared, running it as a simple query"
                        );
                    }

                    let messages = transaction
                        .simple_query(sql)
                        .await
                        .map_err(|e| TargetError::query(&e))?;

                    QueryResult::Rows {
                        results: last_result_set(&messages),
                    }
                }
            },
            StatementKind::Command => {
                let messages = transaction
                    .simple_query(sql)
                    .await
                    .map_err(|e| TargetError::query(&e))?;

                let affected_rows = messages
                    .iter()
                    .filter_map(|message| match message {
                        SimpleQueryMessage::CommandComplete(count) => Some(*count),
                        _ => None,
                    })
                    .last()
                    .unwrap_or(0);

                QueryResult::Affected { affected_rows }
            }
        };

        transaction
            .commit()
            .await
            .map_err(|e| TargetError::query(&e))?;

        Ok(result)
    }
}

/// Collects the rows of the last result set in a simple-query response.
///
/// Column names come from the last row description; values stay text since
/// no column types are known.
fn last_result_set(messages: &[SimpleQueryMessage]) -> Vec<Row> {
    let mut columns: Option<&[SimpleColumn]> = None;
    let mut rows = Vec::new();

    for message in messages {
        match message {
            SimpleQueryMessage::RowDescription(description) => {
                columns = Some(&description[..]);
                rows.clear();
            }
            SimpleQueryMessage::Row(row) => {
                let names = columns.unwrap_or_else(|| row.columns());
                let values = names
                    .iter()
                    .enumerate()
                    .map(|(index, column)| {
                        let value = row.get(index).map_or(Value::Null, |text| {
                            Value::String(text.to_owned())
                        });
                        (column.name().to_owned(), value)
                    })
                    .collect();
                rows.push(values);
            }
            _ => {}
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn select_prefix_is_case_and_whitespace_insensitive() {
        assert_eq!(StatementKind::classify("SELECT 1"), StatementKind::Rows);
        assert_eq!(StatementKind::classify("  select * from t\n"), StatementKind::Rows);
        assert_eq!(StatementKind::classify("\tSeLeCt 1"), StatementKind::Rows);
    }

    #[test]
    fn other_statements_are_commands() {
        assert_eq!(
            StatementKind::classify("INSERT INTO t VALUES (1)"),
            StatementKind::Command
        );
        assert_eq!(
            StatementKind::classify("WITH x AS (SELECT 1) SELECT * FROM x"),
            StatementKind::Command
        );
        assert_eq!(StatementKind::classify(""), StatementKind::Command);
    }

    #[test]
    fn scalar_values_are_typed() {
        assert_eq!(column_value(&Type::BOOL, Some("t")), json!(true));
        assert_eq!(column_value(&Type::BOOL, Some("f")), json!(false));
        assert_eq!(column_value(&Type::INT4, Some("42")), json!(42));
        assert_eq!(column_value(&Type::INT8, Some("-9000000000")), json!(-9_000_000_000_i64));
        assert_eq!(column_value(&Type::FLOAT8, Some("1.5")), json!(1.5));
        assert_eq!(column_value(&Type::NUMERIC, Some("10.25")), json!(10.25));
        assert_eq!(column_value(&Type::TEXT, Some("hello")), json!("hello"));
        assert_eq!(column_value(&Type::INT4, None), Value::Null);
    }

    #[test]
    fn unrepresentable_numbers_keep_their_text() {
        assert_eq!(column_value(&Type::FLOAT8, Some("NaN")), json!("NaN"));
        assert_eq!(column_value(&Type::FLOAT4, Some("Infinity")), json!("Infinity"));
    }

    #[test]
    fn json_columns_are_parsed() {
        assert_eq!(
            column_value(&Type::JSONB, Some(r#"{"a": [1, 2]}"#)),
            json!({"a": [1, 2]})
        );
    }

    #[test]
    fn other_types_use_engine_text() {
        assert_eq!(
            column_value(&Type::TIMESTAMPTZ, Some("2024-01-01 00:00:00+00")),
            json!("2024-01-01 00:00:00+00")
        );
        assert!(column_value(&Type::UUID, Some("00000000-0000-0000-0000-000000000000")).is_string());
    }

    #[test]
    fn results_serialize_untagged() -> serde_json::Result<()> {
        let mut row = Row::new();
        row.insert("id".to_owned(), json!(1));

        let rows = QueryResult::Rows { results: vec![row] };
        assert_eq!(serde_json::to_value(&rows)?, json!({"results": [{"id": 1}]}));

        let affected = QueryResult::Affected { affected_rows: 1 };
        assert_eq!(serde_json::to_value(&affected)?, json!({"affected_rows": 1}));
        Ok(())
    }
}
