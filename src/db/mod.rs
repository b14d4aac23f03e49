//! Database module

pub mod queries;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::config::Config;

/// Create a database connection pool
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    Ok(pool)
}

/// Connect using configuration and bring the schema up to date
pub async fn connect(config: &Config) -> Result<PgPool> {
    let pool = create_pool(config.database_url()?, config.db_max_connections).await?;
    info!("Connected to PostgreSQL");

    run_migrations(&pool).await?;
    Ok(pool)
}

/// Run embedded database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    info!("Running database migrations...");

    let migrator = sqlx::migrate!("./migrations");

    let versions: Vec<i64> = migrator
        .iter()
        .filter(|m| !m.migration_type.is_down_migration())
        .map(|m| m.version)
        .collect();
    info!("Compiled migration versions: {:?}", versions);

    migrator
        .run(pool)
        .await
        .context("Failed to run database migrations")?;

    info!("Database migrations complete");
    Ok(())
}
