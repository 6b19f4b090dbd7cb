//! API server configuration.
//!
//! Configuration is loaded from environment variables with fallback to
//! development defaults. `.env` files are loaded by the entry point
//! before this runs.

use std::env;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// HTTP listen port.
    pub port: u16,

    /// Path to the SQLite database file.
    pub database_path: String,

    /// JWT secret key for signing access tokens.
    pub jwt_secret: String,

    /// JWT access token lifetime in seconds.
    pub jwt_access_lifetime_secs: i64,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ApiConfig {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,

            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "./data/kirana.db".to_string()),

            // In production this MUST be set via environment variable.
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "kirana-dev-secret-change-in-production".to_string()),

            jwt_access_lifetime_secs: env::var("JWT_ACCESS_LIFETIME_SECS")
                .unwrap_or_else(|_| "86400".to_string()) // 24 hours
                .parse()
                .map_err(|_| ConfigError::InvalidValue("JWT_ACCESS_LIFETIME_SECS".to_string()))?,
        };

        Ok(config)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_load() {
        let config = ApiConfig::load().unwrap();
        assert!(config.port > 0);
        assert!(!config.jwt_secret.is_empty());
        assert!(config.jwt_access_lifetime_secs > 0);
    }
}
