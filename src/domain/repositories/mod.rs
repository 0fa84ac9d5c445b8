//! Repository access for the domain layer
//!
//! - `RepositoryProvider`: unified access to the per-aggregate repositories
//! - `DomainResult`: standard result type for domain operations

use super::backup_settings::BackupSettingsRepository;
use super::ride_bill::RideBillRepository;
use super::ride_route::RideRouteRepository;
use super::user::UserRepository;
use crate::shared::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Provides access to all domain repositories.
///
/// Consumers request only the repository they need:
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let driver = repos.users().find_by_id("42").await?;
///     let bills = repos.ride_bills().find_all().await?;
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn users(&self) -> &dyn UserRepository;
    fn ride_routes(&self) -> &dyn RideRouteRepository;
    fn ride_bills(&self) -> &dyn RideBillRepository;
    fn backup_settings(&self) -> &dyn BackupSettingsRepository;
}
