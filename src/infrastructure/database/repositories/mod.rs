//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories + unified RepositoryProvider.

pub mod backup_settings_repository;
pub mod repository_provider;
pub mod ride_bill_repository;
pub mod ride_route_repository;
pub mod user_repository;

pub use repository_provider::SeaOrmRepositoryProvider;

use sea_orm::{DbErr, SqlErr};

use crate::domain::DomainError;

pub(crate) fn db_err(e: DbErr) -> DomainError {
    DomainError::Storage(e.to_string())
}

/// Map a failed write, turning unique-constraint violations into `Conflict`.
pub(crate) fn write_err(e: DbErr, conflict: impl FnOnce() -> DomainError) -> DomainError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => conflict(),
        _ => db_err(e),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use sea_orm::{ConnectOptions, Database, DatabaseConnection};
    use sea_orm_migration::MigratorTrait;

    use crate::infrastructure::database::migrator::Migrator;

    /// Fresh migrated in-memory SQLite database. One connection so every
    /// query sees the same memory database.
    pub async fn memory_db() -> DatabaseConnection {
        let mut opts = ConnectOptions::new("sqlite::memory:");
        opts.max_connections(1).sqlx_logging(false);
        let db = Database::connect(opts).await.expect("connect sqlite");
        Migrator::up(&db, None).await.expect("run migrations");
        db
    }
}
