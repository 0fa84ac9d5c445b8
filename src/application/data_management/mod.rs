//! Backup / export / import pipeline

pub mod backup_store;
pub mod cache;
pub mod documents;
pub mod import;
pub mod service;

pub use backup_store::{human_size, is_backup_filename, BackupEntry, ClearOutcome};
pub use documents::{CollectionCounts, ExportPayload, UserProfileDocument};
pub use import::{ImportCounts, ImportOutcome};
pub use service::{
    BackupOutcome, DataManagementConfig, DataManagementService, ScheduleOutcome, SettingsView,
};
