use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::AppConfig;

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

/// Establishes a connection pool using pool sizing and timeouts from the
/// application configuration.
pub async fn establish_connection_from_app_config(cfg: &AppConfig) -> Result<DbPool, DbErr> {
    let mut opt = ConnectOptions::new(cfg.database_url.clone());

    opt.max_connections(cfg.db_max_connections)
        .min_connections(cfg.db_min_connections)
        .connect_timeout(Duration::from_secs(cfg.db_connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(cfg.db_acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(cfg.db_idle_timeout_secs))
        .sqlx_logging(true);

    debug!("Configuring database connection: {:?}", opt);
    info!(
        "Connecting to database with max_connections={}",
        cfg.db_max_connections
    );

    Database::connect(opt).await
}

/// Establishes a connection pool with default pool settings.
pub async fn establish_connection(database_url: &str) -> Result<DbPool, DbErr> {
    let mut opt = ConnectOptions::new(database_url.to_string());
    opt.sqlx_logging(true);
    Database::connect(opt).await
}
