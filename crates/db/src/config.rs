use std::fmt;

use sqlx::postgres::PgConnectOptions;

/// Default PostgreSQL port.
const DEFAULT_PORT: u16 = 5432;

/// Error raised when the database configuration cannot be read.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is not valid: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Database connection parameters, loaded from the environment.
///
/// Built once at startup and passed by reference to whatever opens the
/// connection.
#[derive(Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub host: String,
    pub database: String,
    pub user: String,
    pub password: String,
    pub port: u16,
}

impl DbConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var             | Default     |
    /// |---------------------|-------------|
    /// | `POSTGRES_HOST`     | `localhost` |
    /// | `POSTGRES_DB`       | required    |
    /// | `POSTGRES_USER`     | required    |
    /// | `POSTGRES_PASSWORD` | empty       |
    /// | `POSTGRES_PORT`     | `5432`      |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let port = match get("POSTGRES_PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "POSTGRES_PORT",
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            host: get("POSTGRES_HOST").unwrap_or_else(|| "localhost".into()),
            database: require("POSTGRES_DB")?,
            user: require("POSTGRES_USER")?,
            password: lookup("POSTGRES_PASSWORD").unwrap_or_default(),
            port,
        })
    }

    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.user)
            .password(&self.password)
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("port", &self.port)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn reads_all_variables() {
        let config = DbConfig::from_lookup(lookup(&[
            ("POSTGRES_HOST", "db.internal"),
            ("POSTGRES_DB", "projects"),
            ("POSTGRES_USER", "entry"),
            ("POSTGRES_PASSWORD", "s3cret"),
            ("POSTGRES_PORT", "6543"),
        ]))
        .unwrap();

        assert_eq!(config.host, "db.internal");
        assert_eq!(config.database, "projects");
        assert_eq!(config.user, "entry");
        assert_eq!(config.password, "s3cret");
        assert_eq!(config.port, 6543);
    }

    #[test]
    fn applies_defaults() {
        let config =
            DbConfig::from_lookup(lookup(&[("POSTGRES_DB", "projects"), ("POSTGRES_USER", "u")]))
                .unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert_eq!(config.password, "");
    }

    #[test]
    fn missing_database_is_an_error() {
        let err = DbConfig::from_lookup(lookup(&[("POSTGRES_USER", "u"), ("POSTGRES_DB", " ")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::Missing("POSTGRES_DB"));
    }

    #[test]
    fn invalid_port_is_an_error() {
        let err = DbConfig::from_lookup(lookup(&[
            ("POSTGRES_DB", "projects"),
            ("POSTGRES_USER", "u"),
            ("POSTGRES_PORT", "not-a-port"),
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                var: "POSTGRES_PORT",
                value: "not-a-port".into()
            }
        );
    }

    #[test]
    fn debug_output_redacts_password() {
        let config = DbConfig::from_lookup(lookup(&[
            ("POSTGRES_DB", "projects"),
            ("POSTGRES_USER", "u"),
            ("POSTGRES_PASSWORD", "hunter2"),
        ]))
        .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }
}
