//! Per-table column list cache
//!
//! The single source of truth for "is this column name real" checks in the
//! query builder. Entries are populated lazily from the catalog and kept for
//! the process lifetime: a table whose structure changes mid-process will
//! validate against stale columns until restart. That staleness is accepted
//! in exchange for skipping repeated metadata round-trips.

use std::collections::HashMap;
use std::sync::Arc;

use sqlx::mysql::MySqlConnection;

use crate::catalog;
use crate::types::GuardResult;

/// Memoized `(database, table) -> ordered column names` map.
#[derive(Debug, Default)]
pub struct SchemaCache {
    columns: HashMap<(String, String), Arc<Vec<String>>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Authoritative column list for a table, ordinal order.
    ///
    /// Fetched from the catalog on first reference, memoized afterwards.
    /// Returned as an `Arc` snapshot: callers get a stable, immutable view
    /// even if they hold it across other cache operations.
    pub async fn columns_of(
        &mut self,
        conn: &mut MySqlConnection,
        db: &str,
        table: &str,
    ) -> GuardResult<Arc<Vec<String>>> {
        let key = (db.to_string(), table.to_string());
        if let Some(columns) = self.columns.get(&key) {
            return Ok(Arc::clone(columns));
        }

        let columns = Arc::new(catalog::table_columns(conn, db, table).await?);
        self.columns.insert(key, Arc::clone(&columns));
        Ok(columns)
    }

    #[cfg(test)]
    pub(crate) fn insert_for_test(&mut self, db: &str, table: &str, columns: Vec<String>) {
        self.columns
            .insert((db.to_string(), table.to_string()), Arc::new(columns));
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.columns.len()
    }
}
