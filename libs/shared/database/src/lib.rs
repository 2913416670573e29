use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use thiserror::Error;
use tracing::{debug, info};

use shared_config::AppConfig;

pub type DbPool = SqlitePool;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Shared handler state: configuration plus the connection pool.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DbPool,
}

impl AppState {
    pub fn new(config: AppConfig, db: DbPool) -> Self {
        Self { config, db }
    }

    /// Connects to `config.database_url` and applies pending migrations.
    pub async fn initialize(config: AppConfig) -> Result<Self, DatabaseError> {
        let db = connect(&config.database_url).await?;
        run_migrations(&db).await?;
        Ok(Self::new(config, db))
    }
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

pub async fn connect(database_url: &str) -> Result<DbPool, DatabaseError> {
    debug!("Connecting to {}", database_url);

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    // Every in-memory connection is its own database, so the pool is pinned
    // to a single connection that never expires.
    let pool_options = if is_in_memory(database_url) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
    };

    let pool = pool_options.connect_with(options).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &DbPool) -> Result<(), DatabaseError> {
    MIGRATOR.run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}
