pub mod backup_settings;
pub mod repositories;
pub mod ride_bill;
pub mod ride_route;
pub mod user;

pub use backup_settings::{BackupSettings, BackupSettingsUpdate};
pub use repositories::{DomainResult, RepositoryProvider};
pub use ride_bill::{BillFilter, RideBill, RideStatus};
pub use ride_route::RideRoute;
pub use user::{PasswordReset, ProfilePhoto, StudentProfile, User, UserRole};

pub use crate::shared::DomainError;
