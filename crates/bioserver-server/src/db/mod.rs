use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use thiserror::Error;

use crate::config::{process_env, var_or};

const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;
const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800;

/// Database operation errors with contextual information
#[derive(Error, Debug)]
pub enum DbError {
    /// SQL query or connection error
    #[error("Database query failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Database configuration is invalid or missing
    #[error("Database configuration error: {0}. Check PSERVER_DSN and connection settings.")]
    Config(String),

    #[error("Migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl DbError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: Option<u64>,
    pub max_lifetime_secs: Option<u64>,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/bioserver".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 10,
            idle_timeout_secs: Some(DEFAULT_IDLE_TIMEOUT_SECS),
            max_lifetime_secs: Some(DEFAULT_MAX_LIFETIME_SECS),
        }
    }
}

impl DbConfig {
    /// Read `PSERVER_DSN`, falling back to `DATABASE_URL`, plus `DB_*` pool settings
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(&process_env)
    }

    pub(crate) fn from_vars<F>(vars: &F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let url = vars("PSERVER_DSN")
            .or_else(|| vars("DATABASE_URL"))
            .ok_or_else(|| DbError::config("PSERVER_DSN not set"))?;

        Ok(Self {
            url,
            max_connections: var_or(vars, "DB_MAX_CONNECTIONS", defaults.max_connections)?,
            min_connections: var_or(vars, "DB_MIN_CONNECTIONS", defaults.min_connections)?,
            connect_timeout_secs: var_or(vars, "DB_CONNECT_TIMEOUT", defaults.connect_timeout_secs)?,
            idle_timeout_secs: Some(var_or(vars, "DB_IDLE_TIMEOUT", DEFAULT_IDLE_TIMEOUT_SECS)?),
            max_lifetime_secs: Some(var_or(vars, "DB_MAX_LIFETIME", DEFAULT_MAX_LIFETIME_SECS)?),
        })
    }

    pub fn validate(&self) -> DbResult<()> {
        if self.url.is_empty() {
            return Err(DbError::config("Database URL cannot be empty"));
        }
        if self.max_connections == 0 {
            return Err(DbError::config("max_connections must be greater than 0"));
        }
        if self.min_connections > self.max_connections {
            return Err(DbError::config(format!(
                "min_connections ({}) cannot be greater than max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }
        Ok(())
    }

    fn pool_options(&self) -> PgPoolOptions {
        let mut options = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.connect_timeout_secs));

        if let Some(idle_timeout) = self.idle_timeout_secs {
            options = options.idle_timeout(Duration::from_secs(idle_timeout));
        }

        if let Some(max_lifetime) = self.max_lifetime_secs {
            options = options.max_lifetime(Duration::from_secs(max_lifetime));
        }

        options
    }
}

pub async fn create_pool(config: &DbConfig) -> DbResult<PgPool> {
    let pool = config.pool_options().connect(&config.url).await?;

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Database connection pool created"
    );

    Ok(pool)
}

/// Pool that connects on first use
pub fn create_lazy_pool(config: &DbConfig) -> DbResult<PgPool> {
    Ok(config.pool_options().connect_lazy(&config.url)?)
}

/// Apply the embedded migrations
pub async fn run_migrations(pool: &PgPool) -> DbResult<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}

pub async fn health_check(pool: &PgPool) -> DbResult<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(DbError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = DbConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_pool_bounds() {
        let config = DbConfig {
            min_connections: 20,
            ..DbConfig::default()
        };
        assert!(matches!(config.validate(), Err(DbError::Config(_))));

        let config = DbConfig {
            max_connections: 0,
            min_connections: 0,
            ..DbConfig::default()
        };
        assert!(config.validate().is_err());
    }

    fn from_pairs(pairs: &[(&str, &str)]) -> anyhow::Result<DbConfig> {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        DbConfig::from_vars(&|key: &str| map.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_from_vars_prefers_server_dsn() {
        let both = [
            ("PSERVER_DSN", "postgres://server/db"),
            ("DATABASE_URL", "postgres://fallback/db"),
        ];
        assert_eq!(from_pairs(&both).unwrap().url, "postgres://server/db");
        assert_eq!(from_pairs(&both[1..]).unwrap().url, "postgres://fallback/db");
        assert!(from_pairs(&[]).is_err());
    }

    #[test]
    fn test_from_vars_pool_settings() {
        let config = from_pairs(&[
            ("PSERVER_DSN", "postgres://server/db"),
            ("DB_MAX_CONNECTIONS", "4"),
        ])
        .unwrap();
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.idle_timeout_secs, Some(DEFAULT_IDLE_TIMEOUT_SECS));

        assert!(from_pairs(&[
            ("PSERVER_DSN", "postgres://server/db"),
            ("DB_MAX_CONNECTIONS", "many"),
        ])
        .is_err());
    }

    #[tokio::test]
    async fn test_lazy_pool_does_not_connect() {
        let config = DbConfig {
            url: "postgres://nobody@127.0.0.1:1/none".to_string(),
            ..DbConfig::default()
        };
        assert!(create_lazy_pool(&config).is_ok());
    }

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_health_check() {
        let config = DbConfig::from_env().unwrap();
        let pool = create_pool(&config).await.unwrap();
        assert!(health_check(&pool).await.is_ok());
    }
}
