//! Configuration module
//!
//! Everything is read and validated once at startup. Request handlers only
//! ever see the resulting [`Config`] through `AppState`.

use std::env;
use std::time::Duration;

use thiserror::Error;

const MIN_SECRET_LEN: usize = 32;
const DEV_JWT_SECRET: &str = "aegis-development-jwt-secret-change-me-0000";

/// Startup configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("environment variable {var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Privileged service credential
    pub service_role_key: String,

    /// Server port
    pub port: u16,

    /// JWT secret key
    pub jwt_secret: String,

    /// JWT expiration in hours
    pub jwt_expiration_hours: u64,

    /// Upper bound on session resolution for page requests
    pub session_timeout: Duration,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = get("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        if !database_url.starts_with("postgres://") && !database_url.starts_with("postgresql://") {
            return Err(ConfigError::Invalid {
                var: "DATABASE_URL",
                reason: "expected a postgres:// connection URL".to_string(),
            });
        }

        let service_role_key = get("SERVICE_ROLE_KEY").ok_or(ConfigError::Missing("SERVICE_ROLE_KEY"))?;
        check_secret_len("SERVICE_ROLE_KEY", &service_role_key)?;

        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => {
                check_secret_len("JWT_SECRET", &secret)?;
                secret
            }
            None if environment == "production" => return Err(ConfigError::Missing("JWT_SECRET")),
            None => DEV_JWT_SECRET.to_string(),
        };

        let port = parse_or("PORT", get("PORT"), 8080u16)?;
        let jwt_expiration_hours = parse_or("JWT_EXPIRATION_HOURS", get("JWT_EXPIRATION_HOURS"), 24u64)?;
        if jwt_expiration_hours == 0 {
            return Err(ConfigError::Invalid {
                var: "JWT_EXPIRATION_HOURS",
                reason: "must be at least 1".to_string(),
            });
        }

        let timeout_ms = parse_or("SESSION_TIMEOUT_MS", get("SESSION_TIMEOUT_MS"), 3000u64)?;
        if timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                var: "SESSION_TIMEOUT_MS",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            database_url,
            service_role_key,
            port,
            jwt_secret,
            jwt_expiration_hours,
            session_timeout: Duration::from_millis(timeout_ms),
            environment,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Database host part of the URL, for logging
    pub fn redacted_database_url(&self) -> &str {
        self.database_url.rsplit('@').next().unwrap_or("***")
    }
}

fn check_secret_len(var: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.len() < MIN_SECRET_LEN {
        return Err(ConfigError::Invalid {
            var,
            reason: format!("must be at least {} characters", MIN_SECRET_LEN),
        });
    }
    Ok(())
}

fn parse_or<T: std::str::FromStr>(
    var: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid {
            var,
            reason: format!("cannot parse '{}'", v),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base() -> HashMap<&'static str, String> {
        let mut vars = HashMap::new();
        vars.insert("DATABASE_URL", "postgres://aegis:pw@db.internal:5432/aegis".to_string());
        vars.insert("SERVICE_ROLE_KEY", "k".repeat(40));
        vars
    }

    fn load(vars: &HashMap<&'static str, String>) -> Result<Config, ConfigError> {
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_applied() {
        let config = load(&base()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.jwt_expiration_hours, 24);
        assert_eq!(config.session_timeout, Duration::from_millis(3000));
        assert!(!config.is_production());
        assert_eq!(config.redacted_database_url(), "db.internal:5432/aegis");
    }

    #[test]
    fn test_missing_database_url_fails_fast() {
        let mut vars = base();
        vars.remove("DATABASE_URL");
        assert_eq!(load(&vars).unwrap_err(), ConfigError::Missing("DATABASE_URL"));
    }

    #[test]
    fn test_missing_service_key_fails_fast() {
        let mut vars = base();
        vars.insert("SERVICE_ROLE_KEY", "   ".to_string());
        assert_eq!(load(&vars).unwrap_err(), ConfigError::Missing("SERVICE_ROLE_KEY"));
    }

    #[test]
    fn test_short_service_key_rejected() {
        let mut vars = base();
        vars.insert("SERVICE_ROLE_KEY", "short".to_string());
        let err = load(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "SERVICE_ROLE_KEY", .. }));
    }

    #[test]
    fn test_bad_port_is_an_error_not_a_default() {
        let mut vars = base();
        vars.insert("PORT", "eighty".to_string());
        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_production_requires_jwt_secret() {
        let mut vars = base();
        vars.insert("ENVIRONMENT", "production".to_string());
        assert_eq!(load(&vars).unwrap_err(), ConfigError::Missing("JWT_SECRET"));

        vars.insert("JWT_SECRET", "s".repeat(48));
        let config = load(&vars).unwrap();
        assert!(config.is_production());
    }

    #[test]
    fn test_non_postgres_url_rejected() {
        let mut vars = base();
        vars.insert("DATABASE_URL", "mysql://localhost/aegis".to_string());
        assert!(matches!(load(&vars).unwrap_err(), ConfigError::Invalid { var: "DATABASE_URL", .. }));
    }
}
