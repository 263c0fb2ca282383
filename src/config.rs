// ABOUTME: Connection settings for the provisioning run
// ABOUTME: Reads DB_* environment variables (and .env) with defaults for every value

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// MySQL caps schema names at 64 characters.
const MAX_DATABASE_NAME_LEN: usize = 64;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid DB_PORT value '{0}': expected a number between 1 and 65535")]
    InvalidPort(String),
    #[error("Database name must not be empty")]
    EmptyDatabaseName,
    #[error("Database name '{0}' is longer than 64 characters")]
    DatabaseNameTooLong(String),
}

/// Settings for one provisioning run. Read once and never changed afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    #[serde(skip)]
    pub password: String,
    pub database: String,
    pub sql_file: PathBuf,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    3306
}

fn default_user() -> String {
    "root".to_string()
}

fn default_database() -> String {
    "ecommerce_db".to_string()
}

fn default_sql_file() -> PathBuf {
    PathBuf::from("config/db_complete.sql")
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: default_user(),
            password: String::new(),
            database: default_database(),
            sql_file: default_sql_file(),
        }
    }
}

impl DbConfig {
    /// Load settings from the process environment, after applying `.env` if one exists
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => log::debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => log::warn!("Ignoring unreadable .env file: {}", e),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let port = match get("DB_PORT") {
            Some(raw) => parse_port(&raw)?,
            None => default_port(),
        };

        let config = Self {
            host: get("DB_HOST").unwrap_or_else(default_host),
            port,
            user: get("DB_USER").unwrap_or_else(default_user),
            password: lookup("DB_PASSWORD").unwrap_or_default(),
            database: get("DB_NAME").unwrap_or_else(default_database),
            sql_file: get("DB_SQL_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(default_sql_file),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the values that cannot be sent to the server as-is
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port.to_string()));
        }
        if self.database.trim().is_empty() {
            return Err(ConfigError::EmptyDatabaseName);
        }
        if self.database.chars().count() > MAX_DATABASE_NAME_LEN {
            return Err(ConfigError::DatabaseNameTooLong(self.database.clone()));
        }
        Ok(())
    }

    /// `user@host:port`, for progress output (never includes the password)
    pub fn server_label(&self) -> String {
        format!("{}@{}:{}", self.user, self.host, self.port)
    }
}

fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    match raw.trim().parse::<u16>() {
        Ok(0) | Err(_) => Err(ConfigError::InvalidPort(raw.to_string())),
        Ok(port) => Ok(port),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = DbConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 3306);
        assert_eq!(config.user, "root");
        assert_eq!(config.password, "");
        assert_eq!(config.database, "ecommerce_db");
        assert_eq!(config.sql_file, PathBuf::from("config/db_complete.sql"));
    }

    #[test]
    fn test_environment_overrides_defaults() {
        let config = DbConfig::from_lookup(lookup_from(&[
            ("DB_HOST", "db.internal"),
            ("DB_PORT", "3307"),
            ("DB_USER", "provisioner"),
            ("DB_PASSWORD", "s3cret"),
            ("DB_NAME", "test_db"),
            ("DB_SQL_FILE", "/tmp/schema.sql"),
        ]))
        .unwrap();

        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 3307);
        assert_eq!(config.user, "provisioner");
        assert_eq!(config.password, "s3cret");
        assert_eq!(config.database, "test_db");
        assert_eq!(config.sql_file, PathBuf::from("/tmp/schema.sql"));
    }

    #[test]
    fn test_empty_values_fall_back_to_defaults() {
        let config =
            DbConfig::from_lookup(lookup_from(&[("DB_HOST", ""), ("DB_NAME", "")])).unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.database, "ecommerce_db");
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let err = DbConfig::from_lookup(lookup_from(&[("DB_PORT", "mysql")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort(ref p) if p == "mysql"));

        let err = DbConfig::from_lookup(lookup_from(&[("DB_PORT", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort(_)));
    }

    #[test]
    fn test_database_name_validation() {
        let mut config = DbConfig::default();
        config.database = "   ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::EmptyDatabaseName)));

        config.database = "x".repeat(65);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DatabaseNameTooLong(_))
        ));

        config.database = "x".repeat(64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_serialization_skips_password() {
        let mut config = DbConfig::default();
        config.password = "hunter2".to_string();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(json.contains("ecommerce_db"));
    }
}
