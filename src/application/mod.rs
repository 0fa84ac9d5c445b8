//! Application layer: use-case services over the domain repositories

pub mod data_management;
pub mod drivers;
pub mod events;
pub mod identity;
pub mod notifications;
pub mod rides;

pub use data_management::{DataManagementConfig, DataManagementService};
pub use drivers::{DriverQrConfig, DriverQrService};
pub use events::{create_event_bus, EventBus, EventSubscriber, SharedEventBus, UserEvent};
pub use identity::{AuthService, PasswordResetService, UserService};
pub use notifications::{Mailer, NotificationDispatcher};
pub use rides::{RideBillService, RideRouteService};
