//! Safe SELECT construction and result decoding
//!
//! Statement text embeds identifiers only after they pass a set-membership
//! check against the table's authoritative column list (metadata fetched
//! from the server itself). That check, not the backtick quoting, is the
//! safety argument. Values never take this path: every WHERE value is a
//! bound parameter.

use serde_json::{json, Map, Value};
use sqlx::mysql::{MySqlArguments, MySqlRow};
use sqlx::query::Query;
use sqlx::{MySql, Row, TypeInfo, ValueRef};

use crate::types::{GuardError, GuardResult};

/// Inclusive bounds for the row limit.
pub const LIMIT_MIN: i64 = 1;
pub const LIMIT_MAX: i64 = 1000;

/// A validated SELECT: statement text, ordered bind values, and the columns
/// of the projection (in SELECT-list order).
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltSelect {
    pub sql: String,
    pub binds: Vec<Value>,
    pub columns: Vec<String>,
}

/// Build a bounded SELECT against one table.
///
/// Every identifier (selected column, condition key, ordering column) must
/// be an exact member of `allowed`, the authoritative column list for the
/// table. `db` and `table` are trusted here because the caller already
/// resolved `allowed` for exactly that pair.
pub fn build_select(
    db: &str,
    table: &str,
    allowed: &[String],
    columns: Option<&[String]>,
    conditions: Option<&Map<String, Value>>,
    order_by: Option<&[String]>,
    limit: i64,
) -> GuardResult<BuiltSelect> {
    if !(LIMIT_MIN..=LIMIT_MAX).contains(&limit) {
        return Err(GuardError::InvalidArgument(format!(
            "limit must be between {} and {}, got {}",
            LIMIT_MIN, LIMIT_MAX, limit
        )));
    }

    // An explicitly empty list means "no projection requested" and falls
    // through to all columns, same as omitting the argument.
    let selected: Vec<String> = match columns {
        Some(requested) if !requested.is_empty() => {
            for column in requested {
                if !allowed.contains(column) {
                    return Err(GuardError::InvalidArgument(format!(
                        "unknown column: {}",
                        column
                    )));
                }
            }
            requested.to_vec()
        }
        _ => allowed.to_vec(),
    };

    let mut where_clauses: Vec<String> = Vec::new();
    let mut binds: Vec<Value> = Vec::new();
    if let Some(conditions) = conditions {
        for (key, value) in conditions {
            if !allowed.contains(key) {
                return Err(GuardError::InvalidArgument(format!(
                    "unknown condition column: {}",
                    key
                )));
            }
            where_clauses.push(format!("`{}` = ?", key));
            binds.push(value.clone());
        }
    }

    let mut order_parts: Vec<String> = Vec::new();
    if let Some(order_by) = order_by {
        for entry in order_by {
            let column = entry.trim_start_matches(['-', '+']);
            if !allowed.iter().any(|c| c == column) {
                return Err(GuardError::InvalidArgument(format!(
                    "unknown ordering column: {}",
                    column
                )));
            }
            let direction = if entry.starts_with('-') { "DESC" } else { "ASC" };
            order_parts.push(format!("`{}` {}", column, direction));
        }
    }

    let mut sql = format!(
        "SELECT {} FROM `{}`.`{}`",
        selected
            .iter()
            .map(|c| format!("`{}`", c))
            .collect::<Vec<_>>()
            .join(", "),
        db,
        table
    );
    if !where_clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&where_clauses.join(" AND "));
    }
    if !order_parts.is_empty() {
        sql.push_str(" ORDER BY ");
        sql.push_str(&order_parts.join(", "));
    }
    sql.push_str(&format!(" LIMIT {}", limit));

    Ok(BuiltSelect {
        sql,
        binds,
        columns: selected,
    })
}

/// Bind one JSON value as a query parameter. Scalars map to their natural
/// driver types; arrays and objects are bound as their JSON text.
pub fn bind_value<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &Value,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(u) = n.as_u64() {
                query.bind(u)
            } else {
                query.bind(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => query.bind(s.clone()),
        other => query.bind(other.to_string()),
    }
}

/// Convert one result row into a JSON object keyed by column name, in
/// SELECT-list order (`columns` is the projection from [`BuiltSelect`]).
pub fn row_to_json(row: &MySqlRow, columns: &[String]) -> Map<String, Value> {
    let mut obj = Map::new();
    for (idx, name) in columns.iter().enumerate() {
        obj.insert(name.clone(), decode_column(row, idx));
    }
    obj
}

/// Decode one column by trying the plausible Rust types in order and
/// falling back to a placeholder. MySQL TINYINT(1) comes back through the
/// integer arm; DECIMAL and temporal types are rendered as strings.
fn decode_column(row: &MySqlRow, idx: usize) -> Value {
    match row.try_get_raw(idx) {
        Ok(raw) => {
            if raw.is_null() {
                return Value::Null;
            }
            let type_name = raw.type_info().name().to_string();
            drop(raw);
            decode_non_null(row, idx, &type_name)
        }
        Err(_) => Value::Null,
    }
}

fn decode_non_null(row: &MySqlRow, idx: usize, type_name: &str) -> Value {
    if let Ok(v) = row.try_get::<i64, _>(idx) {
        json!(v)
    } else if let Ok(v) = row.try_get::<u64, _>(idx) {
        json!(v)
    } else if let Ok(v) = row.try_get::<f64, _>(idx) {
        json!(v)
    } else if let Ok(v) = row.try_get::<bool, _>(idx) {
        json!(v)
    } else if let Ok(v) = row.try_get::<String, _>(idx) {
        json!(v)
    } else if let Ok(v) = row.try_get::<chrono::NaiveDateTime, _>(idx) {
        json!(v.to_string())
    } else if let Ok(v) = row.try_get::<chrono::NaiveDate, _>(idx) {
        json!(v.to_string())
    } else if let Ok(v) = row.try_get::<chrono::NaiveTime, _>(idx) {
        json!(v.to_string())
    } else if let Ok(v) = row.try_get::<bigdecimal::BigDecimal, _>(idx) {
        json!(v.to_string())
    } else if let Ok(v) = row.try_get::<Value, _>(idx) {
        v
    } else if let Ok(v) = row.try_get::<Vec<u8>, _>(idx) {
        json!(format!("<blob {} bytes>", v.len()))
    } else {
        tracing::debug!(column_type = type_name, "undecodable column value");
        Value::Null
    }
}
