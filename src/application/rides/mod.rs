//! Ride routes and the ride bill log

pub mod bills;
pub mod routes;

pub use bills::{CreateRideBillDto, RideBillService, RideBillUpdate};
pub use routes::{RideRouteInput, RideRouteService};
