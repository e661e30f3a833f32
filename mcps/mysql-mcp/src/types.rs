//! Type definitions for mysql-mcp

use mcp_common::{IntoMcpError, McpError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum GuardError {
    /// Bad limit, or a column/condition/ordering reference outside the
    /// table's authoritative column list.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Table does not exist (or has no columns, which is treated the same).
    #[error("Not found: {0}")]
    NotFound(String),

    /// The resolver could not settle on a single database.
    #[error(
        "Multiple accessible databases and none could be inferred from the project; \
         pass `db` explicitly or call the infer_database tool first"
    )]
    AmbiguousDatabase,

    /// Driver/transport failure, surfaced as-is and never retried.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type GuardResult<T> = Result<T, GuardError>;

impl IntoMcpError for GuardError {
    fn into_mcp_error(self) -> McpError {
        match self {
            GuardError::InvalidArgument(msg) => McpError::invalid_params(msg, None),
            GuardError::NotFound(msg) => McpError::resource_not_found(msg, None),
            GuardError::AmbiguousDatabase => McpError::invalid_params(self.to_string(), None),
            GuardError::Database(e) => McpError::internal_error(e.to_string(), None),
        }
    }
}

// ============================================================================
// Catalog Types
// ============================================================================

/// One column of a table, as reported by information_schema.COLUMNS.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub data_type: String,
    pub column_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    pub key: String,
    pub extra: String,
    pub comment: String,
    pub ordinal_position: u32,
}

/// A secondary index (PRIMARY is reported via `TableSchema::primary_key`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDescriptor {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
    pub index_type: String,
}

/// Full description of one table. Built fresh on every request, never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    pub db: String,
    pub table: String,
    pub comment: Option<String>,
    pub columns: Vec<ColumnDescriptor>,
    pub primary_key: Vec<String>,
    pub indexes: Vec<IndexDescriptor>,
}

// ============================================================================
// Inference Types
// ============================================================================

/// Everything one inference pass saw. Internal only: paths and file contents
/// never leave the process, so this holds just names already known to the
/// database plus the extracted hints.
#[derive(Debug, Clone, Default)]
pub struct Evidence {
    /// Accessible non-system schemas at the time of the pass.
    pub candidates: Vec<String>,
    /// Database-name hints extracted from project files, first-seen order.
    pub hints: Vec<String>,
    /// The hint (or single candidate) that was selected, if any.
    pub selected: Option<String>,
}

impl Evidence {
    /// Redacted view for external callers: counts and booleans only.
    pub fn summary(&self) -> EvidenceSummary {
        EvidenceSummary {
            candidate_count: self.candidates.len(),
            hint_count: self.hints.len(),
            selected: self.selected.is_some(),
        }
    }
}

/// Redacted inference evidence, safe to return over the tool surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceSummary {
    pub candidate_count: usize,
    pub hint_count: usize,
    pub selected: bool,
}

/// Response for the infer_database tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferDatabaseResponse {
    pub db: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<EvidenceSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evidence_summary_is_redacted() {
        let evidence = Evidence {
            candidates: vec!["shop".to_string(), "billing".to_string()],
            hints: vec!["shop".to_string()],
            selected: Some("shop".to_string()),
        };
        let summary = evidence.summary();
        assert_eq!(summary.candidate_count, 2);
        assert_eq!(summary.hint_count, 1);
        assert!(summary.selected);

        // The serialized summary must not carry names, paths, or contents.
        let json = serde_json::to_value(&summary).unwrap();
        let rendered = json.to_string();
        assert!(!rendered.contains("shop"));
        assert!(!rendered.contains("billing"));
    }

    #[test]
    fn test_invalid_argument_maps_to_invalid_params() {
        let err = GuardError::InvalidArgument("unknown column: nope".to_string());
        let mcp = mcp_common::IntoMcpError::into_mcp_error(err);
        assert!(mcp.message.contains("nope"));
    }

    #[test]
    fn test_ambiguous_database_message_names_the_tool() {
        let err = GuardError::AmbiguousDatabase;
        assert!(err.to_string().contains("infer_database"));
    }
}
