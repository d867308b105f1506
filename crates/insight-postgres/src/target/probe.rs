//! Introspection of a target database's `information_schema`.

use std::time::Instant;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{TargetConnection, TargetError, TargetResult};
use crate::TRACING_TARGET_TARGET;

/// Catalog columns are domain types (`sql_identifier`, `yes_or_no`, ...),
/// cast to `text` so they decode as strings.
const PROBE_QUERY: &str = "\
SELECT table_schema::text, table_name::text, column_name::text, data_type::text, \
       is_nullable::text, column_default::text \
FROM information_schema.columns \
WHERE table_schema NOT IN ('information_schema', 'pg_catalog') \
ORDER BY table_schema, table_name, ordinal_position";

/// One column of a table, as reported by `information_schema.columns`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct ColumnDescriptor {
    pub column_name: String,
    pub data_type: String,
    /// `YES` or `NO`.
    pub is_nullable: String,
    pub column_default: Option<String>,
}

impl ColumnDescriptor {
    /// Returns whether the column accepts NULL.
    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.is_nullable == "YES"
    }
}

/// A flat `information_schema.columns` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRow {
    pub table_schema: String,
    pub table_name: String,
    pub column: ColumnDescriptor,
}

/// Ordered columns of one table.
pub type TableColumns = IndexMap<String, Vec<ColumnDescriptor>>;

/// Schema → table → columns, in the order the catalog reported them.
///
/// Serializes as a plain nested object, e.g.
/// `{"public": {"users": [{"column_name": "id", ...}]}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(transparent)]
pub struct SchemaDescription(IndexMap<String, TableColumns>);

impl SchemaDescription {
    /// Folds ordered catalog rows into the nested description.
    ///
    /// Schemas and tables keep first-seen order, columns keep row order.
    pub fn from_rows(rows: impl IntoIterator<Item = ColumnRow>) -> Self {
        let mut schemas: IndexMap<String, TableColumns> = IndexMap::new();
        for row in rows {
            schemas
                .entry(row.table_schema)
                .or_default()
                .entry(row.table_name)
                .or_default()
                .push(row.column);
        }

        Self(schemas)
    }

    /// Iterates schemas and their tables.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TableColumns)> {
        self.0.iter().map(|(schema, tables)| (schema.as_str(), tables))
    }

    /// Returns the tables of one schema.
    pub fn schema(&self, name: &str) -> Option<&TableColumns> {
        self.0.get(name)
    }

    /// Returns whether no user table was found.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of tables across all schemas.
    pub fn table_count(&self) -> usize {
        self.0.values().map(IndexMap::len).sum()
    }
}

impl TargetConnection {
    /// Reads every user-visible column of the target database.
    ///
    /// # Errors
    ///
    /// Returns [`TargetError::Query`] with the engine's message if the
    /// catalog query fails.
    pub async fn probe_schema(&self) -> TargetResult<SchemaDescription> {
        let start = Instant::now();
        let rows = self
            .client()
            .query(PROBE_QUERY, &[])
            .await
            .map_err(|e| TargetError::query(&e))?;

        let rows = rows
            .iter()
            .map(|row| {
                Ok(ColumnRow {
                    table_schema: row.try_get(0)?,
                    table_name: row.try_get(1)?,
                    column: ColumnDescriptor {
                        column_name: row.try_get(2)?,
                        data_type: row.try_get(3)?,
                        is_nullable: row.try_get(4)?,
                        column_default: row.try_get(5)?,
                    },
                })
            })
            .collect::<Result<Vec<_>, tokio_postgres::Error>>()
            .map_err(|e| TargetError::query(&e))?;

        let description = SchemaDescription::from_rows(rows);
        tracing::debug!(
            target: TRACING_TARGET_TARGET,
            tables = description.table_count(),
            elapsed_ms = start.elapsed().as_millis(),
            "Target schema probed"
        );

        Ok(description)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn row(schema: &str, table: &str, column: &str, nullable: &str) -> ColumnRow {
        ColumnRow {
            table_schema: schema.to_owned(),
            table_name: table.to_owned(),
            column: ColumnDescriptor {
                column_name: column.to_owned(),
                data_type: "integer".to_owned(),
                is_nullable: nullable.to_owned(),
                column_default: None,
            },
        }
    }

    #[test]
    fn single_column_serializes_as_nested_object() -> serde_json::Result<()> {
        let description = SchemaDescription::from_rows([row("public", "test_table", "id", "NO")]);

        assert_eq!(
            serde_json::to_value(&description)?,
            json!({
                "public": {
                    "test_table": [{
                        "column_name": "id",
                        "data_type": "integer",
                        "is_nullable": "NO",
                        "column_default": null
                    }]
                }
            })
        );
        Ok(())
    }

    #[test]
    fn keys_keep_first_seen_order() -> serde_json::Result<()> {
        let description = SchemaDescription::from_rows([
            row("sales", "orders", "id", "NO"),
            row("sales", "orders", "total", "YES"),
            row("sales", "customers", "id", "NO"),
            row("analytics", "events", "id", "NO"),
        ]);

        let schemas: Vec<&str> = description.iter().map(|(name, _)| name).collect();
        assert_eq!(schemas, ["sales", "analytics"]);

        let tables = description.schema("sales").map(|t| t.keys().cloned().collect::<Vec<_>>());
        assert_eq!(tables, Some(vec!["orders".to_owned(), "customers".to_owned()]));
        assert_eq!(description.table_count(), 3);

        let text = serde_json::to_string(&description)?;
        assert!(text.find("sales") < text.find("analytics"));
        Ok(())
    }

    #[test]
    fn columns_keep_row_order() {
        let description = SchemaDescription::from_rows([
            row("public", "t", "b", "NO"),
            row("public", "t", "a", "YES"),
        ]);

        let columns = &description.schema("public").expect("schema")["t"];
        assert_eq!(columns[0].column_name, "b");
        assert!(columns[1].is_nullable());
    }

    #[test]
    fn no_rows_yield_empty_description() {
        assert!(SchemaDescription::from_rows(Vec::new()).is_empty());
    }
}
