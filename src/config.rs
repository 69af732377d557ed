//! Environment-based Configuration
//!
//! Configuration is loaded from environment variables, with `.env` support
//! at startup. Secrets never have hardcoded production values.
//!
//! # Environment Variables
//!
//! - `HAYAT_ENV` - "production" or "development" (default: "development")
//! - `HAYAT_PORT` - HTTP listen port (default: 3000)
//! - `HAYAT_DB_PATH` - SQLite database path (default: "data/hayat.db")
//! - `HAYAT_JWT_SECRET` - Token signing secret (required in production)
//! - `HAYAT_TOKEN_TTL_SECS` - Token lifetime in seconds (default: 86400)
//! - `HAYAT_LOG_LEVEL` - Logging level (debug, info, warn, error)

use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "development" | "dev" => Ok(Environment::Development),
            _ => Err(ConfigError::InvalidValue(
                "HAYAT_ENV".to_string(),
                format!("unknown environment: {}", s),
            )),
        }
    }
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Deployment environment
    pub environment: Environment,

    /// HTTP listen port
    pub port: u16,

    /// Path to the SQLite database file
    pub db_path: String,

    /// Token signing secret
    pub jwt_secret: String,

    /// Token lifetime in seconds
    pub token_ttl_secs: u64,

    /// Log level
    pub log_level: String,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment: Environment = env::var("HAYAT_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .parse()?;

        let port: u16 = env::var("HAYAT_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let db_path = env::var("HAYAT_DB_PATH").unwrap_or_else(|_| "data/hayat.db".to_string());

        // Signing secret is required outside development
        let jwt_secret = match env::var("HAYAT_JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ if environment == Environment::Development => {
                eprintln!("WARNING: Using built-in dev signing secret - set HAYAT_JWT_SECRET");
                "hayat-dev-secret".to_string()
            }
            _ => return Err(ConfigError::MissingEnvVar("HAYAT_JWT_SECRET".to_string())),
        };

        let token_ttl_secs = env::var("HAYAT_TOKEN_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86_400);

        let log_level = env::var("HAYAT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            port,
            db_path,
            jwt_secret,
            token_ttl_secs,
            log_level,
        })
    }

    /// Print configuration summary (hiding sensitive values)
    pub fn print_summary(&self) {
        println!("=== Hayat Configuration ===");
        println!("Environment: {:?}", self.environment);
        println!("Port: {}", self.port);
        println!("Database: {}", self.db_path);
        println!("Token TTL: {}s", self.token_ttl_secs);
        println!("Log Level: {}", self.log_level);
        println!("===========================");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parsing() {
        assert!(matches!(
            "production".parse::<Environment>(),
            Ok(Environment::Production)
        ));
        assert!(matches!("dev".parse::<Environment>(), Ok(Environment::Development)));
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn test_is_production() {
        assert!(Environment::Production.is_production());
        assert!(!Environment::Development.is_production());
    }
}
