//! Ride bill aggregate: the ride history log.

pub mod model;
pub mod repository;

pub use model::{BillFilter, RideBill, RideStatus};
pub use repository::RideBillRepository;
