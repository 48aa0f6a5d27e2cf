//! INSERT statement encoding.
//!
//! Values are written as their trimmed text in single quotes, or as bare
//! `NULL` when the text is empty, `null` or `undefined`. Embedded single
//! quotes are NOT escaped: a value such as `O'Brien` produces a statement
//! that will not replay. This is a known limitation of the dump format.

use std::borrow::Cow;

use crate::export::types::{ColumnDescriptor, RowRecord};

/// Encodes the rows of one table.
///
/// The column list is rendered once, from the descriptor order, and every
/// row's values are looked up by name in that same order.
#[derive(Debug, Clone)]
pub struct SqlEncoder {
    prefix: String,
    columns: Vec<String>,
}

impl SqlEncoder {
    pub fn new(table: &str, columns: &[ColumnDescriptor]) -> Self {
        let column_list = columns
            .iter()
            .map(|c| format!("\"{}\"", c.name))
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            prefix: format!("INSERT INTO \"{table}\" ({column_list}) VALUES ("),
            columns: columns.iter().map(|c| c.name.clone()).collect(),
        }
    }

    /// One `INSERT` line, newline included.
    pub fn encode(&self, row: &RowRecord) -> String {
        let values = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, column)| encode_value(&row.text_at(column, Some(i))).into_owned())
            .collect::<Vec<_>>()
            .join(", ");

        format!("{}{});\n", self.prefix, values)
    }
}

/// Encodes one row of `table` without keeping an encoder around.
pub fn encode(row: &RowRecord, columns: &[ColumnDescriptor], table: &str) -> String {
    SqlEncoder::new(table, columns).encode(row)
}

/// Applies the NULL rule to a field's textual form.
pub fn encode_value(text: &str) -> Cow<'static, str> {
    if text.is_empty() || text == "null" || text == "undefined" {
        Cow::Borrowed("NULL")
    } else {
        Cow::Owned(format!("'{}'", text.trim()))
    }
}
