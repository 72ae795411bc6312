pub mod transaction;

use crate::config::AppConfig;
use crate::errors::ServiceError;
use metrics::{counter, gauge, histogram};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

pub use transaction::UnitOfWork;

/// Shared handle every service holds behind an `Arc`.
pub type DbPool = DatabaseConnection;

/// Opens the pool described by `cfg`.
///
/// `sqlite::memory:` pools are per connection, so callers that want one
/// shared in-memory store must configure a single connection.
pub async fn connect(cfg: &AppConfig) -> Result<DbPool, ServiceError> {
    let mut opt = ConnectOptions::new(cfg.database_url.clone());
    opt.max_connections(cfg.db_max_connections)
        .min_connections(cfg.db_min_connections.min(cfg.db_max_connections))
        .connect_timeout(Duration::from_secs(cfg.db_connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(cfg.db_acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(cfg.db_idle_timeout_secs))
        .sqlx_logging(false);

    if is_in_memory(&cfg.database_url) && cfg.db_max_connections > 1 {
        warn!(
            max_connections = cfg.db_max_connections,
            "In-memory SQLite with several connections gives each connection its own database"
        );
    }

    debug!(
        max_connections = cfg.db_max_connections,
        min_connections = cfg.db_min_connections,
        "Opening database pool"
    );
    gauge!("storefront_db.max_connections", cfg.db_max_connections as f64);

    let pool = Database::connect(opt).await.map_err(|e| {
        error!("Could not open database pool: {}", e);
        counter!("storefront_db.connection_failures", 1);
        ServiceError::DatabaseError(e)
    })?;
    info!(backend = ?pool.get_database_backend(), "Database pool ready");
    Ok(pool)
}

/// Applies every pending schema migration.
pub async fn run_migrations(pool: &DbPool) -> Result<(), DbErr> {
    let started = Instant::now();
    let result = crate::migrator::Migrator::up(pool, None).await;
    histogram!("storefront_db.migrations.duration", started.elapsed());

    match &result {
        Ok(()) => info!("Schema up to date after {:?}", started.elapsed()),
        Err(e) => error!("Migration failed: {}", e),
    }
    result
}

/// Round trip to the store; used by the CLI before it does any work.
pub async fn ping(pool: &DbPool) -> Result<(), ServiceError> {
    let started = Instant::now();
    pool.ping().await.map_err(|e| {
        counter!("storefront_db.connection_failures", 1);
        ServiceError::DatabaseError(e)
    })?;
    histogram!("storefront_db.ping", started.elapsed());
    Ok(())
}

fn is_in_memory(url: &str) -> bool {
    url.starts_with("sqlite::memory:") || url.contains("mode=memory")
}
