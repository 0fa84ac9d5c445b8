//! Ride route aggregate: a (from, to) pair with a fare.

pub mod model;
pub mod repository;

pub use model::RideRoute;
pub use repository::RideRouteRepository;
