//! Configuration management

use std::str::FromStr;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::db::DbConfig;

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DbConfig,
    pub cors: CorsConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// CORS configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Empty or containing "*" allows any origin
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

/// Variable lookup, `std::env::var` outside of tests
pub(crate) fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Parse `key` if set, otherwise fall back to `default`
pub(crate) fn var_or<T, F>(vars: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match vars(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Invalid value for {}: '{}'", key, value)),
        None => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment and defaults
    ///
    /// Reads `.env` first if present. Variables: `PSERVER_HOST`,
    /// `PSERVER_PORT`, `PSERVER_SHUTDOWN_TIMEOUT`, `PSERVER_DSN` (or
    /// `DATABASE_URL`), `DB_*` pool settings, `CORS_ALLOWED_ORIGINS` and
    /// `CORS_ALLOW_CREDENTIALS`.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(process_env)
    }

    /// Build and validate a configuration from an arbitrary variable lookup
    pub fn from_vars<F>(vars: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Config {
            server: ServerConfig {
                host: vars("PSERVER_HOST").unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string()),
                port: var_or(&vars, "PSERVER_PORT", DEFAULT_SERVER_PORT)?,
                shutdown_timeout_secs: var_or(
                    &vars,
                    "PSERVER_SHUTDOWN_TIMEOUT",
                    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
                )?,
            },
            database: DbConfig::from_vars(&vars)?,
            cors: CorsConfig {
                allowed_origins: vars("CORS_ALLOWED_ORIGINS")
                    .map(|origins| {
                        origins
                            .split(',')
                            .map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty())
                            .collect()
                    })
                    .unwrap_or_default(),
                allow_credentials: var_or(&vars, "CORS_ALLOW_CREDENTIALS", false)?,
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        self.database.validate()?;

        if self.cors.allow_any_origin() {
            tracing::warn!("No CORS origins configured - all origins will be allowed");
            if self.cors.allow_credentials {
                anyhow::bail!("CORS credentials cannot be allowed together with any origin");
            }
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl CorsConfig {
    pub fn allow_any_origin(&self) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o == "*")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            database: DbConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}
