//! MySQL MCP Server implementation

use anyhow::Context as _;
use mcp_common::{json_success, McpError, ResultExt};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::GuardConfig;
use crate::guard::GuardState;
use crate::types::InferDatabaseResponse;

// ============================================================================
// Parameter Types
// ============================================================================

/// Parameters for infer_database tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct InferDatabaseParams {
    /// Project directory to scan for database hints. Defaults to the
    /// server's working directory.
    pub project_root: Option<String>,

    /// Include redacted evidence (counts and booleans only) in the response.
    #[serde(default)]
    pub include_evidence: bool,
}

/// Parameters for list_tables tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListTablesParams {
    /// Database name. Omit to use the inferred database.
    pub db: Option<String>,
}

/// Parameters for get_table_schema tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetTableSchemaParams {
    /// Name of the table to describe
    pub table: String,

    /// Database name. Omit to use the inferred database.
    pub db: Option<String>,
}

/// Parameters for select_rows tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SelectRowsParams {
    /// Name of the table to query
    pub table: String,

    /// Database name. Omit to use the inferred database.
    pub db: Option<String>,

    /// Columns to select. Omit for all columns in catalog order.
    pub columns: Option<Vec<String>>,

    /// Equality conditions, column name to value, combined with AND.
    #[serde(rename = "where")]
    pub conditions: Option<Map<String, Value>>,

    /// Ordering columns; prefix with '-' for descending.
    pub order_by: Option<Vec<String>>,

    /// Maximum rows to return, 1..=1000 (default: 100)
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

// ============================================================================
// Server Implementation
// ============================================================================

/// The MySQL guard MCP server: read-only, whitelist-validated access to one
/// MySQL server over a single serialized connection.
#[derive(Clone)]
pub struct MySqlMcpServer {
    guard: Arc<Mutex<GuardState>>,
    tool_router: ToolRouter<Self>,
}

impl MySqlMcpServer {
    /// Connect to MySQL (from env config) and build the server. Connection
    /// failure is fatal: a gateway that cannot reach its database should
    /// not start serving.
    pub async fn new() -> anyhow::Result<Self> {
        let config = GuardConfig::from_env();
        tracing::info!(host = %config.host, port = config.port, user = %config.user, "connecting to MySQL");

        let guard = GuardState::connect(&config)
            .await
            .with_context(|| format!("failed to connect to MySQL at {}:{}", config.host, config.port))?;

        Ok(Self {
            guard: Arc::new(Mutex::new(guard)),
            tool_router: Self::tool_router(),
        })
    }
}

#[tool_router]
impl MySqlMcpServer {
    /// List accessible databases
    #[tool(description = "List the non-system databases accessible to the current account.")]
    async fn list_databases(&self) -> Result<CallToolResult, McpError> {
        let mut guard = self.guard.lock().await;
        let databases = guard.list_databases().await.to_mcp_err()?;
        json_success(&databases)
    }

    /// Infer the intended database from project contents
    #[tool(description = "Infer the intended database by scanning a project directory for configuration hints (env keys, connection URLs) and matching them against accessible databases. Returns { db: null } when no unambiguous choice exists. With include_evidence=true, adds redacted evidence counts (never file paths or contents).")]
    async fn infer_database(
        &self,
        Parameters(params): Parameters<InferDatabaseParams>,
    ) -> Result<CallToolResult, McpError> {
        let mut guard = self.guard.lock().await;
        let root = params.project_root.as_ref().map(Path::new);
        let (db, evidence) = guard.infer_database(root).await.to_mcp_err()?;

        let response = InferDatabaseResponse {
            db,
            evidence: params.include_evidence.then(|| evidence.summary()),
        };
        json_success(&response)
    }

    /// List tables in a database
    #[tool(description = "List all tables in a database. When db is omitted, the inferred database is used (or inferred on the spot).")]
    async fn list_tables(
        &self,
        Parameters(params): Parameters<ListTablesParams>,
    ) -> Result<CallToolResult, McpError> {
        let mut guard = self.guard.lock().await;
        let tables = guard
            .list_tables(params.db.as_deref())
            .await
            .to_mcp_err()?;
        json_success(&tables)
    }

    /// Get the structure of a table
    #[tool(description = "Get a table's structure: column definitions, primary key, and indexes. When db is omitted, the inferred database is used.")]
    async fn get_table_schema(
        &self,
        Parameters(params): Parameters<GetTableSchemaParams>,
    ) -> Result<CallToolResult, McpError> {
        let mut guard = self.guard.lock().await;
        let schema = guard
            .get_table_schema(&params.table, params.db.as_deref())
            .await
            .to_mcp_err()?;
        json_success(&schema)
    }

    /// Query rows from a table
    #[tool(description = "Safely query rows from one table. Columns, where-condition keys, and order_by entries are validated against the table's real columns; where values are always bound parameters. order_by entries may be prefixed with '-' for DESC. Limit must be between 1 and 1000 (default 100). When db is omitted, the inferred database is used.")]
    async fn select_rows(
        &self,
        Parameters(params): Parameters<SelectRowsParams>,
    ) -> Result<CallToolResult, McpError> {
        let mut guard = self.guard.lock().await;
        let rows = guard
            .select_rows(
                &params.table,
                params.db.as_deref(),
                params.columns.as_deref(),
                params.conditions.as_ref(),
                params.order_by.as_deref(),
                params.limit,
            )
            .await
            .to_mcp_err()?;
        json_success(&rows)
    }
}

#[tool_handler]
impl rmcp::ServerHandler for MySqlMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Read-only MySQL query gateway. Use list_databases to see accessible \
                 databases, infer_database to resolve the project's database from its \
                 config files, list_tables and get_table_schema to explore structure, \
                 and select_rows for whitelisted, parameterized SELECT queries. \
                 No write operations are available."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
