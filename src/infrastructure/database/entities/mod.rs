//! Database entities module

pub mod backup_settings;
pub mod ride_bill;
pub mod ride_route;
pub mod user;

pub use backup_settings::Entity as BackupSettings;
pub use ride_bill::Entity as RideBill;
pub use ride_route::Entity as RideRoute;
pub use user::Entity as User;
