//! Database layer for potluck.
//!
//! Holds the sea-orm entities and migrations, the store traits the services
//! are written against, and their PostgreSQL implementations.

pub mod entities;
pub mod migrations;
pub mod repositories;
pub mod store;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use potluck_common::{AppError, Config};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::time::Duration;
use tracing::log::LevelFilter;

pub use store::{
    GroupPostStore, GroupQuery, GroupSnapshot, GroupStore, JoinOutcome, PostSnapshot,
    UserDirectory, UserSummary,
};

/// Initialize database connection.
pub async fn init(config: &Config) -> Result<DatabaseConnection, AppError> {
    let mut opt = ConnectOptions::new(&config.database.url);

    opt.max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug);

    Database::connect(opt).await.map_err(map_db_err)
}

/// Run pending migrations.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), AppError> {
    use sea_orm_migration::MigratorTrait;
    migrations::Migrator::up(db, None).await.map_err(map_db_err)
}

/// Translate a sea-orm error into the application taxonomy.
///
/// Failures to reach the database become [`AppError::StoreUnavailable`]
/// (HTTP 503); everything else is an internal database error.
#[must_use]
pub fn map_db_err(err: DbErr) -> AppError {
    match err {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => AppError::StoreUnavailable(err.to_string()),
        _ => AppError::Database(err.to_string()),
    }
}
