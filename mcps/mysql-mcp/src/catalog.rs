//! Catalog reader: information_schema queries and typed results
//!
//! Everything here is read-only metadata access. Schema listing filters a
//! fixed set of system schemas by name; it is advisory, not a permission
//! check (a restricted account may see schemas it cannot actually query).

use sqlx::mysql::MySqlConnection;
use sqlx::Row;

use crate::types::{ColumnDescriptor, GuardError, GuardResult, IndexDescriptor, TableSchema};

/// Schemas never surfaced to callers.
const SYSTEM_SCHEMAS: &str = "'mysql','information_schema','performance_schema','sys'";

/// List accessible non-system schemas, lexicographic order.
pub async fn list_schemas(conn: &mut MySqlConnection) -> GuardResult<Vec<String>> {
    let names = sqlx::query_scalar::<_, String>(&format!(
        "SELECT SCHEMA_NAME \
         FROM information_schema.SCHEMATA \
         WHERE SCHEMA_NAME NOT IN ({}) \
         ORDER BY SCHEMA_NAME",
        SYSTEM_SCHEMAS
    ))
    .fetch_all(conn)
    .await?;
    Ok(names)
}

/// List all tables in a schema, lexicographic order.
pub async fn list_tables(conn: &mut MySqlConnection, schema: &str) -> GuardResult<Vec<String>> {
    let names = sqlx::query_scalar::<_, String>(
        "SELECT TABLE_NAME \
         FROM information_schema.TABLES \
         WHERE TABLE_SCHEMA = ? \
         ORDER BY TABLE_NAME",
    )
    .bind(schema)
    .fetch_all(conn)
    .await?;
    Ok(names)
}

/// Column names of a table in ordinal order.
///
/// A table with zero columns is indistinguishable from a missing table in
/// information_schema, so both fail with `NotFound`.
pub async fn table_columns(
    conn: &mut MySqlConnection,
    schema: &str,
    table: &str,
) -> GuardResult<Vec<String>> {
    let columns = sqlx::query_scalar::<_, String>(
        "SELECT COLUMN_NAME \
         FROM information_schema.COLUMNS \
         WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? \
         ORDER BY ORDINAL_POSITION",
    )
    .bind(schema)
    .bind(table)
    .fetch_all(conn)
    .await?;

    if columns.is_empty() {
        return Err(GuardError::NotFound(format!(
            "table not found or has no columns: {}",
            table
        )));
    }
    Ok(columns)
}

/// Describe a table: column definitions, primary key, secondary indexes,
/// and the table comment. Built fresh on every call.
pub async fn describe_table(
    conn: &mut MySqlConnection,
    schema: &str,
    table: &str,
) -> GuardResult<TableSchema> {
    let col_rows = sqlx::query(
        "SELECT COLUMN_NAME, DATA_TYPE, COLUMN_TYPE, IS_NULLABLE, COLUMN_DEFAULT, \
                COLUMN_KEY, EXTRA, COLUMN_COMMENT, ORDINAL_POSITION \
         FROM information_schema.COLUMNS \
         WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? \
         ORDER BY ORDINAL_POSITION",
    )
    .bind(schema)
    .bind(table)
    .fetch_all(&mut *conn)
    .await?;

    if col_rows.is_empty() {
        return Err(GuardError::NotFound(format!(
            "table not found or has no columns: {}",
            table
        )));
    }

    let mut columns = Vec::with_capacity(col_rows.len());
    let mut flag_pk: Vec<String> = Vec::new();
    for row in &col_rows {
        let name: String = row.try_get("COLUMN_NAME")?;
        let key: String = row.try_get("COLUMN_KEY")?;
        let is_nullable: String = row.try_get("IS_NULLABLE")?;
        if key.eq_ignore_ascii_case("PRI") {
            flag_pk.push(name.clone());
        }
        columns.push(ColumnDescriptor {
            name,
            data_type: row.try_get("DATA_TYPE")?,
            column_type: row.try_get("COLUMN_TYPE")?,
            nullable: is_nullable.eq_ignore_ascii_case("YES"),
            default: row.try_get("COLUMN_DEFAULT")?,
            key,
            extra: row.try_get("EXTRA")?,
            comment: row.try_get("COLUMN_COMMENT")?,
            ordinal_position: row.try_get::<u64, _>("ORDINAL_POSITION")? as u32,
        });
    }

    let comment: Option<String> = sqlx::query_scalar(
        "SELECT TABLE_COMMENT \
         FROM information_schema.TABLES \
         WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?",
    )
    .bind(schema)
    .bind(table)
    .fetch_optional(&mut *conn)
    .await?;

    // Rows arrive ordered by (INDEX_NAME, SEQ_IN_INDEX), so each index's
    // columns are contiguous and already in key order.
    let idx_rows = sqlx::query(
        "SELECT INDEX_NAME, NON_UNIQUE, INDEX_TYPE, COLUMN_NAME \
         FROM information_schema.STATISTICS \
         WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? \
         ORDER BY INDEX_NAME, SEQ_IN_INDEX",
    )
    .bind(schema)
    .bind(table)
    .fetch_all(&mut *conn)
    .await?;

    let mut index_pk: Vec<String> = Vec::new();
    let mut indexes: Vec<IndexDescriptor> = Vec::new();
    for row in &idx_rows {
        let index_name: String = row.try_get("INDEX_NAME")?;
        let column_name: String = row.try_get("COLUMN_NAME")?;
        if index_name.eq_ignore_ascii_case("PRIMARY") {
            index_pk.push(column_name);
            continue;
        }
        match indexes.last_mut() {
            Some(idx) if idx.name == index_name => idx.columns.push(column_name),
            _ => {
                let non_unique: i64 = row.try_get("NON_UNIQUE")?;
                indexes.push(IndexDescriptor {
                    name: index_name,
                    columns: vec![column_name],
                    unique: non_unique == 0,
                    index_type: row.try_get("INDEX_TYPE")?,
                });
            }
        }
    }

    Ok(TableSchema {
        db: schema.to_string(),
        table: table.to_string(),
        comment,
        columns,
        primary_key: reconcile_primary_key(flag_pk, index_pk),
        indexes,
    })
}

/// Merge the two views of the primary key. The PRIMARY index sequence from
/// information_schema.STATISTICS is authoritative for ordering; columns the
/// COLUMN_KEY flags reported but the index definition did not are appended
/// after it.
fn reconcile_primary_key(flag_pk: Vec<String>, index_pk: Vec<String>) -> Vec<String> {
    if index_pk.is_empty() {
        return flag_pk;
    }
    let mut merged = index_pk;
    for col in flag_pk {
        if !merged.contains(&col) {
            merged.push(col);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconcile_agreeing_views() {
        let merged = reconcile_primary_key(vec!["id".to_string()], vec!["id".to_string()]);
        assert_eq!(merged, vec!["id"]);
    }

    #[test]
    fn test_reconcile_index_order_wins() {
        // Flags report in ordinal order, the index defines (b, a).
        let merged = reconcile_primary_key(
            vec!["a".to_string(), "b".to_string()],
            vec!["b".to_string(), "a".to_string()],
        );
        assert_eq!(merged, vec!["b", "a"]);
    }

    #[test]
    fn test_reconcile_flag_stragglers_appended() {
        let merged = reconcile_primary_key(
            vec!["a".to_string(), "c".to_string()],
            vec!["b".to_string(), "a".to_string()],
        );
        assert_eq!(merged, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_reconcile_no_primary_index() {
        let merged = reconcile_primary_key(vec!["id".to_string()], vec![]);
        assert_eq!(merged, vec!["id"]);
    }
}
