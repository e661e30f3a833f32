//! MySQL MCP Server
//!
//! Guarded, read-only query tools for MySQL databases. The target database
//! is inferred from project context when not given explicitly.

mod cache;
mod catalog;
mod config;
mod guard;
mod infer;
mod query;
mod server;
mod types;

use server::MySqlMcpServer;

mcp_common::serve_stdio!(MySqlMcpServer, "mysql_mcp");
