//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::backup_settings::BackupSettingsRepository;
use crate::domain::repositories::RepositoryProvider;
use crate::domain::ride_bill::RideBillRepository;
use crate::domain::ride_route::RideRouteRepository;
use crate::domain::user::UserRepository;

use super::backup_settings_repository::SeaOrmBackupSettingsRepository;
use super::ride_bill_repository::SeaOrmRideBillRepository;
use super::ride_route_repository::SeaOrmRideRouteRepository;
use super::user_repository::SeaOrmUserRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
pub struct SeaOrmRepositoryProvider {
    users: SeaOrmUserRepository,
    ride_routes: SeaOrmRideRouteRepository,
    ride_bills: SeaOrmRideBillRepository,
    backup_settings: SeaOrmBackupSettingsRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            users: SeaOrmUserRepository::new(db.clone()),
            ride_routes: SeaOrmRideRouteRepository::new(db.clone()),
            ride_bills: SeaOrmRideBillRepository::new(db.clone()),
            backup_settings: SeaOrmBackupSettingsRepository::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn users(&self) -> &dyn UserRepository {
        &self.users
    }

    fn ride_routes(&self) -> &dyn RideRouteRepository {
        &self.ride_routes
    }

    fn ride_bills(&self) -> &dyn RideBillRepository {
        &self.ride_bills
    }

    fn backup_settings(&self) -> &dyn BackupSettingsRepository {
        &self.backup_settings
    }
}
