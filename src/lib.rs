//! # Campus Transport
//!
//! REST backend for a campus transport service: user administration with four
//! roles, driver QR verification, ride routes and ride bills, OTP password reset,
//! and a backup / export / import pipeline.
//!
//! ## Architecture
//!
//! - **domain**: entities, invariants and repository traits
//! - **application**: use cases (identity, drivers, rides, data management),
//!   the user change event bus and notification dispatch
//! - **infrastructure**: SeaORM / in-memory storage, crypto, SMTP, QR rendering
//! - **interfaces**: REST API (axum + utoipa) and the WebSocket change feed
//! - **server**: runtime bootstrap and graceful shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};
pub use infrastructure::{init_database, DatabaseConfig, SeaOrmRepositoryProvider};
pub use interfaces::http::create_api_router;
