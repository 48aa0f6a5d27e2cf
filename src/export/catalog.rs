//! Schema discovery.
//!
//! Thin layer over the gateway's introspection calls that maps driver
//! failures to `IntrospectionError` and builds immutable table descriptors.

use log::{debug, warn};

use crate::error_handling::ExportError;
use crate::export::types::{ColumnDescriptor, TableDescriptor};
use crate::storage::DatabaseGateway;

/// Reads table and column metadata from the database.
pub struct SchemaCatalog<'a> {
    gateway: &'a dyn DatabaseGateway,
}

impl<'a> SchemaCatalog<'a> {
    pub fn new(gateway: &'a dyn DatabaseGateway) -> Self {
        Self { gateway }
    }

    /// Table names of the default application schema, system catalogs excluded.
    pub async fn discover_tables(&self) -> Result<Vec<String>, ExportError> {
        let tables = self
            .gateway
            .list_tables()
            .await
            .map_err(ExportError::IntrospectionError)?;
        debug!("Discovered {} tables", tables.len());
        Ok(tables)
    }

    /// Columns of one table, sorted by ordinal position.
    pub async fn discover_columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>, ExportError> {
        let columns = self
            .gateway
            .describe_columns(table)
            .await
            .map_err(ExportError::IntrospectionError)?;
        if columns.is_empty() {
            warn!("Table \"{table}\" has no columns");
        }
        Ok(columns)
    }

    /// Describes every table in `tables`, preserving their order.
    pub async fn describe_tables(&self, tables: &[String]) -> Result<Vec<TableDescriptor>, ExportError> {
        let mut descriptors = Vec::with_capacity(tables.len());
        for table in tables {
            let columns = self.discover_columns(table).await?;
            descriptors.push(TableDescriptor::new(table.clone(), columns));
        }
        Ok(descriptors)
    }
}
