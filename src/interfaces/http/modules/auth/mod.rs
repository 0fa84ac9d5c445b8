//! Authentication module: login, profile, password change and OTP reset

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
