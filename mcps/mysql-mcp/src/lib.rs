//! MySQL MCP Library
//!
//! A guarded, read-only query gateway over MySQL, exposed as MCP tools.
//!
//! The served database is never configured up front: it is resolved per
//! request from an explicit argument, a previously inferred value, or a
//! heuristic scan of the project directory ([`infer`]). Queries are built
//! from caller-supplied identifiers only after those identifiers pass a
//! whitelist check against the table's real columns ([`query`]); values are
//! always bound parameters.
//!
//! # Usage as Library
//!
//! ```rust,ignore
//! use mysql_mcp::MySqlMcpServer;
//!
//! let server = MySqlMcpServer::new().await?;
//! // Serve via stdio, or call the guard directly
//! ```

pub mod cache;
pub mod catalog;
pub mod config;
pub mod guard;
pub mod infer;
pub mod query;
pub mod server;
pub mod types;

// Re-export main server type
pub use server::MySqlMcpServer;

// Re-export parameter types for direct API usage
pub use server::{GetTableSchemaParams, InferDatabaseParams, ListTablesParams, SelectRowsParams};
