//! Configuration for the MySQL MCP server
//!
//! Connection settings come from the environment, read once at startup.
//! No database name is configured: the served database is resolved per
//! request (explicit argument, cached inference, or a fresh inference pass).

use sqlx::mysql::MySqlConnectOptions;

/// MySQL connection configuration
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Server host (`DB_HOST`, default 127.0.0.1)
    pub host: String,
    /// Server port (`DB_PORT`, default 3306)
    pub port: u16,
    /// Account user (`DB_USER`, default root)
    pub user: String,
    /// Account password (`DB_PASS`, default empty)
    pub password: String,
}

impl GuardConfig {
    /// Read the configuration from the environment
    ///
    /// Unset variables fall back to defaults; an unparseable `DB_PORT` falls
    /// back to 3306 rather than failing startup.
    pub fn from_env() -> Self {
        let port = std::env::var("DB_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3306);

        Self {
            host: std::env::var("DB_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port,
            user: std::env::var("DB_USER").unwrap_or_else(|_| "root".to_string()),
            password: std::env::var("DB_PASS").unwrap_or_default(),
        }
    }

    /// Build driver connect options. No database is selected: every query
    /// schema-qualifies its tables.
    pub fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GuardConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3306);
        assert_eq!(config.user, "root");
        assert!(config.password.is_empty());
    }

    #[test]
    fn test_connect_options_build() {
        let config = GuardConfig {
            host: "db.internal".to_string(),
            port: 3307,
            user: "reader".to_string(),
            password: "s3cret".to_string(),
        };
        // Options construction must not panic for any well-formed config.
        let _ = config.connect_options();
    }
}
