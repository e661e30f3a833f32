//! Guard state: the connection, the schema cache, and database resolution
//!
//! One `GuardState` owns everything mutable in the process: the single
//! MySQL connection, the column-list cache, and the sticky inferred
//! database. The server wraps it in one mutex, so every tool invocation
//! runs to completion before the next touches the connection (the driver
//! connection is not safe for overlapping statements).

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use sqlx::mysql::MySqlConnection;
use sqlx::Connection;

use crate::cache::SchemaCache;
use crate::catalog;
use crate::config::GuardConfig;
use crate::infer;
use crate::query;
use crate::types::{Evidence, GuardError, GuardResult, TableSchema};

pub struct GuardState {
    conn: MySqlConnection,
    cache: SchemaCache,
    /// Last database resolved by inference or fallback. Sticky for the
    /// process lifetime, never cleared.
    inferred_db: Option<String>,
}

/// Resolution steps that need no database round-trip: an explicit caller
/// name wins outright, then the cached inference result.
fn preferred_database(explicit: Option<&str>, cached: Option<&str>) -> Option<String> {
    explicit.or(cached).map(str::to_string)
}

impl GuardState {
    /// Connect once, non-lazily. A failure here is fatal at startup.
    pub async fn connect(config: &GuardConfig) -> GuardResult<Self> {
        let conn = MySqlConnection::connect_with(&config.connect_options()).await?;
        Ok(Self {
            conn,
            cache: SchemaCache::new(),
            inferred_db: None,
        })
    }

    /// Accessible non-system databases.
    pub async fn list_databases(&mut self) -> GuardResult<Vec<String>> {
        catalog::list_schemas(&mut self.conn).await
    }

    /// Run one inference pass and cache a successful selection.
    ///
    /// `project_root` defaults to the process working directory.
    pub async fn infer_database(
        &mut self,
        project_root: Option<&Path>,
    ) -> GuardResult<(Option<String>, Evidence)> {
        let candidates = catalog::list_schemas(&mut self.conn).await?;
        let root = match project_root {
            Some(path) => path.to_path_buf(),
            None => default_root(),
        };

        let (selected, evidence) = infer::infer(&root, candidates);
        if let Some(db) = &selected {
            tracing::info!(db = %db, "inference selected a database");
            self.inferred_db = Some(db.clone());
        }
        Ok((selected, evidence))
    }

    /// Produce the database to operate against, in priority order:
    /// explicit caller name, cached inference, fresh inference at the
    /// working directory, single accessible schema. Each step
    /// short-circuits; exhaustion is `AmbiguousDatabase`.
    ///
    /// An explicit name is taken as-is with no accessibility check - a
    /// wrong name fails naturally at query time.
    async fn resolve_database(&mut self, db: Option<&str>) -> GuardResult<String> {
        if let Some(db) = preferred_database(db, self.inferred_db.as_deref()) {
            return Ok(db);
        }

        let candidates = catalog::list_schemas(&mut self.conn).await?;
        let (guessed, _) = infer::infer(&default_root(), candidates.clone());
        if let Some(db) = guessed {
            self.inferred_db = Some(db.clone());
            return Ok(db);
        }

        if let [only] = candidates.as_slice() {
            self.inferred_db = Some(only.clone());
            return Ok(only.clone());
        }

        Err(GuardError::AmbiguousDatabase)
    }

    /// Tables of the resolved database, lexicographic order.
    pub async fn list_tables(&mut self, db: Option<&str>) -> GuardResult<Vec<String>> {
        let db = self.resolve_database(db).await?;
        catalog::list_tables(&mut self.conn, &db).await
    }

    /// Full description of one table: columns, primary key, indexes.
    pub async fn get_table_schema(
        &mut self,
        table: &str,
        db: Option<&str>,
    ) -> GuardResult<TableSchema> {
        let db = self.resolve_database(db).await?;
        catalog::describe_table(&mut self.conn, &db, table).await
    }

    /// Validated, parameterized SELECT against one table.
    pub async fn select_rows(
        &mut self,
        table: &str,
        db: Option<&str>,
        columns: Option<&[String]>,
        conditions: Option<&Map<String, Value>>,
        order_by: Option<&[String]>,
        limit: i64,
    ) -> GuardResult<Vec<Map<String, Value>>> {
        let db = self.resolve_database(db).await?;
        let allowed = self.cache.columns_of(&mut self.conn, &db, table).await?;

        let built = query::build_select(&db, table, &allowed, columns, conditions, order_by, limit)?;
        tracing::debug!(sql = %built.sql, binds = built.binds.len(), "executing select");

        // Session guard against accidental mutation, then the statement
        // itself with every value bound.
        sqlx::query("SET SESSION sql_safe_updates=1")
            .execute(&mut self.conn)
            .await?;

        let mut statement = sqlx::query(&built.sql);
        for value in &built.binds {
            statement = query::bind_value(statement, value);
        }
        let rows = statement.fetch_all(&mut self.conn).await?;

        Ok(rows
            .iter()
            .map(|row| query::row_to_json(row, &built.columns))
            .collect())
    }
}

fn default_root() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_name_wins_over_cache() {
        let resolved = preferred_database(Some("billing"), Some("shop"));
        assert_eq!(resolved.as_deref(), Some("billing"));
    }

    #[test]
    fn test_cache_used_when_no_explicit_name() {
        let resolved = preferred_database(None, Some("shop"));
        assert_eq!(resolved.as_deref(), Some("shop"));
    }

    #[test]
    fn test_nothing_precached_defers_to_inference() {
        assert_eq!(preferred_database(None, None), None);
    }
}
