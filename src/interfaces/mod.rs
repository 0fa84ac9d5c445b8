//! Transport-facing adapters: the REST API and the WebSocket change feed

pub mod http;
pub mod ws;
