//! Configuration management

use anyhow::{self, Context, Result};

use crate::types::customer::DEFAULT_PLACE;

const DEFAULT_LOGS_DIR: &str = "./logs";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string (required by database-backed commands only)
    database_url: Option<String>,

    /// Directory for the rolling log file
    pub logs_dir: String,

    /// Place assigned to imported customers without one
    pub import_default_place: String,

    /// Connection pool size
    pub db_max_connections: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = non_empty("DATABASE_URL");

        let logs_dir = non_empty("LOGS_DIR")
            .unwrap_or_else(|| DEFAULT_LOGS_DIR.to_string());

        let import_default_place = non_empty("IMPORT_DEFAULT_PLACE")
            .map(|p| p.trim().to_string())
            .unwrap_or_else(|| DEFAULT_PLACE.to_string());

        let db_max_connections = match non_empty("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .with_context(|| format!("DB_MAX_CONNECTIONS must be a positive integer, got '{raw}'"))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };
        if db_max_connections == 0 {
            anyhow::bail!("DB_MAX_CONNECTIONS must be at least 1");
        }

        Ok(Self {
            database_url,
            logs_dir,
            import_default_place,
            db_max_connections,
        })
    }

    /// Database URL, or an error for commands that need one
    pub fn database_url(&self) -> Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL must be set")
    }
}
