//! Backup schedule settings, a single persisted record.

pub mod model;
pub mod repository;

pub use model::{BackupSettings, BackupSettingsUpdate};
pub use repository::BackupSettingsRepository;
