//! Error handling utilities for MCP servers

use rmcp::ErrorData as McpError;

/// Trait for converting errors into MCP-compatible errors
///
/// Implement this for a server's domain error type so tool implementations
/// can use `?` (via [`ResultExt::to_mcp_err`]) while still mapping each
/// variant to the right MCP error code.
///
/// ```rust,ignore
/// impl IntoMcpError for MyError {
///     fn into_mcp_error(self) -> McpError {
///         match self {
///             MyError::BadInput(m) => McpError::invalid_params(m, None),
///             other => McpError::internal_error(other.to_string(), None),
///         }
///     }
/// }
/// ```
pub trait IntoMcpError {
    /// Convert this error into an MCP error
    fn into_mcp_error(self) -> McpError;
}

/// Extension trait for Result types to convert to MCP errors
///
/// ```rust,ignore
/// fn my_tool(&self) -> Result<CallToolResult, McpError> {
///     let rows = self.guard.select(...).to_mcp_err()?;
///     // ...
/// }
/// ```
pub trait ResultExt<T> {
    /// Convert the error to an MCP error
    fn to_mcp_err(self) -> Result<T, McpError>;
}

impl<T, E: IntoMcpError> ResultExt<T> for Result<T, E> {
    fn to_mcp_err(self) -> Result<T, McpError> {
        self.map_err(|e| e.into_mcp_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubError(&'static str);

    impl IntoMcpError for StubError {
        fn into_mcp_error(self) -> McpError {
            McpError::invalid_params(self.0.to_string(), None)
        }
    }

    #[test]
    fn test_result_ext_maps_through_into_mcp_error() {
        let result: Result<(), StubError> = Err(StubError("bad param"));
        let err = result.to_mcp_err().unwrap_err();
        assert!(err.message.contains("bad param"));
    }

    #[test]
    fn test_result_ext_passes_ok_through() {
        let result: Result<i32, StubError> = Ok(7);
        assert_eq!(result.to_mcp_err().unwrap(), 7);
    }
}
