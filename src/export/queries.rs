//! SQL text for export queries.
//!
//! Every statement the orchestrator sends to a gateway is built here so the
//! buffered and streamed sources read exactly the same select list.

use crate::export::types::ColumnDescriptor;
use crate::storage::Dialect;

/// Double-quotes an identifier for use in query text, doubling embedded quotes.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `SELECT COUNT(*)` for one table.
pub(crate) fn count_rows_sql(table: &str) -> String {
    format!("SELECT COUNT(*) FROM {}", quote_ident(table))
}

/// Selects every column of a table as text, in declared column order.
///
/// Values are cast in SQL so the driver always hands back text or NULL,
/// whatever the column type. SQLite blobs are rendered as `\x`-prefixed
/// lowercase hex, the same text PostgreSQL produces for `bytea`.
pub(crate) fn select_rows_sql(dialect: Dialect, table: &str, columns: &[ColumnDescriptor]) -> String {
    if columns.is_empty() {
        return format!("SELECT NULL FROM {}", quote_ident(table));
    }

    let select_list = columns
        .iter()
        .map(|c| {
            let ident = quote_ident(&c.name);
            match dialect {
                Dialect::Postgres => format!("{ident}::text AS {ident}"),
                Dialect::Sqlite => format!(
                    "CASE WHEN typeof({ident}) = 'blob' THEN '\\x' || lower(hex({ident})) \
                     ELSE CAST({ident} AS TEXT) END AS {ident}"
                ),
            }
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!("SELECT {} FROM {}", select_list, quote_ident(table))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::new("id", "integer", false),
            ColumnDescriptor::new("name", "text", true),
        ]
    }

    #[test]
    fn test_quote_ident_doubles_embedded_quotes() {
        assert_eq!(quote_ident("users"), "\"users\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_count_rows_sql() {
        assert_eq!(count_rows_sql("users"), "SELECT COUNT(*) FROM \"users\"");
    }

    #[test]
    fn test_select_rows_sql_postgres() {
        assert_eq!(
            select_rows_sql(Dialect::Postgres, "users", &columns()),
            "SELECT \"id\"::text AS \"id\", \"name\"::text AS \"name\" FROM \"users\""
        );
    }

    #[test]
    fn test_select_rows_sql_sqlite() {
        assert_eq!(
            select_rows_sql(Dialect::Sqlite, "users", &columns()),
            "SELECT CASE WHEN typeof(\"id\") = 'blob' THEN '\\x' || lower(hex(\"id\")) \
             ELSE CAST(\"id\" AS TEXT) END AS \"id\", \
             CASE WHEN typeof(\"name\") = 'blob' THEN '\\x' || lower(hex(\"name\")) \
             ELSE CAST(\"name\" AS TEXT) END AS \"name\" FROM \"users\""
        );
    }

    #[test]
    fn test_select_rows_sql_without_columns() {
        assert_eq!(
            select_rows_sql(Dialect::Sqlite, "empty", &[]),
            "SELECT NULL FROM \"empty\""
        );
    }
}
