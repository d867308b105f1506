//! Prompt templates for SQL and chart generation.

use std::fmt::Write as _;

use insight_postgres::target::SchemaDescription;

use crate::CompletionRequest;

/// System instruction for SQL generation.
pub const SQL_SYSTEM_PROMPT: &str = "You are an expert PostgreSQL assistant. \
You translate questions about a database into a single valid PostgreSQL query.";

/// System instruction for chart generation.
pub const CHART_SYSTEM_PROMPT: &str = "You are a data visualization assistant. \
You answer with JSON only.";

/// Renders a schema as indented text, one line per schema, table and column.
///
/// ```text
/// Schema: public
///   Table: users
///     - id (integer)
///     - email (text) NULL
/// ```
pub fn render_schema(schema: &SchemaDescription) -> String {
    let mut out = String::new();
    for (schema_name, tables) in schema.iter() {
        let _ = writeln!(out, "Schema: {schema_name}");
        for (table_name, columns) in tables {
            let _ = writeln!(out, "  Table: {table_name}");
            for column in columns {
                let _ = write!(out, "    - {} ({})", column.column_name, column.data_type);
                if column.is_nullable() {
                    out.push_str(" NULL");
                }
                out.push('\n');
            }
        }
    }

    out
}

/// Builds the SQL generation request.
///
/// A non-empty `error_context` appends a block asking the model to favour
/// a query that runs over a precise one.
pub fn sql_request(
    schema: &SchemaDescription,
    question: &str,
    error_context: Option<&str>,
) -> CompletionRequest {
    let mut prompt = format!(
        "Given the following PostgreSQL database schema:\n\n\
         {schema}\n\
         Write a PostgreSQL query that answers this request:\n\
         {question}\n\n\
         Rules:\n\
         - Respond with exactly one SQL statement and nothing else.\n\
         - Wrap every table and column identifier in double quotes, e.g. \"public\".\"users\".\"id\".\n\
         - Use only the tables and columns listed above.\n\
         - Do not add explanations, comments or markdown formatting.\n",
        schema = render_schema(schema),
    );

    if let Some(error) = error_context.map(str::trim).filter(|e| !e.is_empty()) {
        let _ = write!(
            prompt,
            "\nA previous attempt for this request failed with the error:\n\
             {error}\n\n\
             Prefer a query that runs successfully over one that is precise. \
             Avoid columns, tables, casts or functions that are not clearly \
             supported by the schema above, and simplify the query if needed.\n"
        );
    }

    CompletionRequest::new(SQL_SYSTEM_PROMPT, prompt)
}

/// Builds the chart generation request for a dataset sample.
pub fn chart_request(dataset: &str) -> CompletionRequest {
    let prompt = format!(
        "Suggest charts for the dataset below.\n\n\
         Respond with only a JSON array. Each element must have the shape \
         {{\"type\": \"bar\" | \"pie\" | \"line\", \"data\": {{...}}}}.\n\
         - For \"bar\" and \"line\", data has the fields \"xlabel\", \"ylabel\", \
         \"xvalues\" and \"yvalues\".\n\
         - For \"pie\", data has the fields \"labels\" and \"values\".\n\
         - If a chart type does not fit the dataset, set its data to null.\n\
         Include one element per chart type. Do not add any text outside the array.\n\n\
         Dataset:\n{dataset}\n"
    );

    CompletionRequest::new(CHART_SYSTEM_PROMPT, prompt)
}

#[cfg(test)]
mod tests {
    use insight_postgres::target::{ColumnDescriptor, ColumnRow};

    use super::*;

    fn row(schema: &str, table: &str, column: &str, data_type: &str, nullable: bool) -> ColumnRow {
        ColumnRow {
            table_schema: schema.to_owned(),
            table_name: table.to_owned(),
            column: ColumnDescriptor {
                column_name: column.to_owned(),
                data_type: data_type.to_owned(),
                is_nullable: if nullable { "YES" } else { "NO" }.to_owned(),
                column_default: None,
            },
        }
    }

    fn sample_schema() -> SchemaDescription {
        SchemaDescription::from_rows(vec![
            row("public", "users", "id", "integer", false),
            row("public", "users", "email", "text", true),
            row("sales", "orders", "total", "numeric", false),
        ])
    }

    #[test]
    fn renders_schema_lines() {
        let text = render_schema(&sample_schema());
        assert_eq!(
            text,
            "Schema: public\n  Table: users\n    - id (integer)\n    - email (text) NULL\n\
             Schema: sales\n  Table: orders\n    - total (numeric)\n"
        );
    }

    #[test]
    fn renders_empty_schema() {
        assert!(render_schema(&SchemaDescription::default()).is_empty());
    }

    #[test]
    fn sql_request_embeds_schema_and_question() {
        let request = sql_request(&sample_schema(), "count users", None);
        assert_eq!(request.system, SQL_SYSTEM_PROMPT);
        assert!(request.prompt.contains("    - email (text) NULL"));
        assert!(request.prompt.contains("count users"));
        assert!(request.prompt.contains("double quotes"));
        assert!(!request.prompt.contains("previous attempt"));
    }

    #[test]
    fn sql_request_appends_error_block() {
        let plain = sql_request(&sample_schema(), "count users", None);
        let retry = sql_request(
            &sample_schema(),
            "count users",
            Some("column \"name\" does not exist"),
        );

        assert!(retry.prompt.starts_with(&plain.prompt));
        assert!(retry.prompt.contains("previous attempt"));
        assert!(retry.prompt.contains("column \"name\" does not exist"));
    }

    #[test]
    fn blank_error_context_is_ignored() {
        let plain = sql_request(&sample_schema(), "q", None);
        let blank = sql_request(&sample_schema(), "q", Some("  "));
        assert_eq!(plain, blank);
    }

    #[test]
    fn chart_request_embeds_dataset() {
        let request = chart_request("[{\"month\":\"Jan\",\"sales\":3}]");
        assert_eq!(request.system, CHART_SYSTEM_PROMPT);
        assert!(request.prompt.contains("[{\"month\":\"Jan\",\"sales\":3}]"));
        assert!(request.prompt.contains("\"xvalues\""));
        assert!(request.prompt.contains("\"labels\""));
    }
}
