//! WebSocket interfaces
//!
//! - `user_changes`: live user change feed for admin / staff clients

pub mod user_changes;

pub use user_changes::{ws_user_changes_handler, ChangeFeedState, ChangeFilter};
