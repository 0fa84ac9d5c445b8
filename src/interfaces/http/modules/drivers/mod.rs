//! Driver QR codes and public verification

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
