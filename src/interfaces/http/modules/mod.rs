pub mod auth;
pub mod data_management;
pub mod drivers;
pub mod health;
pub mod metrics;
pub mod ride_bills;
pub mod ride_routes;
pub mod users;
