use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::application::data_management::{
    human_size, BackupEntry, BackupOutcome, ClearOutcome, CollectionCounts, ImportCounts,
    ImportOutcome, ScheduleOutcome, SettingsView,
};
use crate::domain::BackupSettingsUpdate;

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectionCountsDto {
    pub users: u64,
    pub ride_locations: u64,
    pub ride_bills: u64,
}

impl From<CollectionCounts> for CollectionCountsDto {
    fn from(c: CollectionCounts) -> Self {
        Self {
            users: c.users,
            ride_locations: c.ride_locations,
            ride_bills: c.ride_bills,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackupResultDto {
    pub filename: String,
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
    /// Human readable, e.g. `1.5 KB`
    pub size: String,
    pub collections: CollectionCountsDto,
    pub pruned: usize,
}

impl From<BackupOutcome> for BackupResultDto {
    fn from(o: BackupOutcome) -> Self {
        Self {
            size: human_size(o.size_bytes),
            filename: o.filename,
            created_at: o.created_at,
            size_bytes: o.size_bytes,
            collections: o.counts.into(),
            pruned: o.pruned,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ScheduleParams {
    /// Run even when disabled or not yet due
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResultDto {
    /// `created`, `disabled` or `not_due`
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_backup: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<BackupResultDto>,
}

impl From<ScheduleOutcome> for ScheduleResultDto {
    fn from(o: ScheduleOutcome) -> Self {
        match o {
            ScheduleOutcome::Disabled => Self {
                status: "disabled".into(),
                next_backup: None,
                backup: None,
            },
            ScheduleOutcome::NotDue { next_backup } => Self {
                status: "not_due".into(),
                next_backup,
                backup: None,
            },
            ScheduleOutcome::Created(outcome) => Self {
                status: "created".into(),
                next_backup: None,
                backup: Some(outcome.into()),
            },
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImportCountsDto {
    pub imported: u64,
    pub skipped: u64,
    pub errors: u64,
}

impl From<ImportCounts> for ImportCountsDto {
    fn from(c: ImportCounts) -> Self {
        Self {
            imported: c.imported,
            skipped: c.skipped,
            errors: c.errors,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportResultDto {
    pub message: String,
    pub export_date: String,
    pub users: ImportCountsDto,
    pub ride_locations: ImportCountsDto,
    pub ride_bills: ImportCountsDto,
}

impl From<ImportOutcome> for ImportResultDto {
    fn from(o: ImportOutcome) -> Self {
        Self {
            message: o.message,
            export_date: o.export_date,
            users: o.users.into(),
            ride_locations: o.ride_locations.into(),
            ride_bills: o.ride_bills.into(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CacheClearDto {
    pub actions: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackupEntryDto {
    pub filename: String,
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
    pub size: String,
    pub collections: Option<CollectionCountsDto>,
}

impl From<BackupEntry> for BackupEntryDto {
    fn from(e: BackupEntry) -> Self {
        Self {
            size: human_size(e.size_bytes),
            filename: e.filename,
            created_at: e.created_at,
            size_bytes: e.size_bytes,
            collections: e.collections.map(Into::into),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeletedBackupDto {
    pub filename: String,
    pub freed_bytes: u64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClearHistoryDto {
    pub deleted: usize,
    pub freed_bytes: u64,
    pub freed: String,
    pub errors: Vec<String>,
}

impl From<ClearOutcome> for ClearHistoryDto {
    fn from(o: ClearOutcome) -> Self {
        Self {
            freed: human_size(o.freed_bytes),
            deleted: o.deleted,
            freed_bytes: o.freed_bytes,
            errors: o.errors,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackupSettingsDto {
    pub enabled: bool,
    #[serde(rename = "interval")]
    pub interval_hours: u32,
    pub max_backups: u32,
    pub email_notifications: bool,
    pub last_backup: Option<DateTime<Utc>>,
    pub next_backup: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl From<SettingsView> for BackupSettingsDto {
    fn from(v: SettingsView) -> Self {
        Self {
            enabled: v.settings.enabled,
            interval_hours: v.settings.interval_hours,
            max_backups: v.settings.max_backups,
            email_notifications: v.settings.email_notifications,
            last_backup: v.settings.last_backup,
            next_backup: v.next_backup,
            updated_at: v.settings.updated_at,
        }
    }
}

/// Partial settings update. Signed fields so a negative value is reported
/// as out of range instead of failing to parse.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBackupSettingsRequest {
    pub enabled: Option<bool>,
    /// Hours between scheduled backups (1-168)
    #[serde(rename = "interval")]
    #[validate(range(min = 1, max = 168, message = "Backup interval must be between 1 and 168 hours"))]
    pub interval_hours: Option<i64>,
    /// Backups kept on disk (1-100)
    #[validate(range(min = 1, max = 100, message = "Max backups must be between 1 and 100"))]
    pub max_backups: Option<i64>,
    pub email_notifications: Option<bool>,
}

/// Values outside `u32` map to 0, which the settings model rejects.
fn narrow(value: Option<i64>) -> Option<u32> {
    value.map(|v| u32::try_from(v).unwrap_or(0))
}

impl From<UpdateBackupSettingsRequest> for BackupSettingsUpdate {
    fn from(r: UpdateBackupSettingsRequest) -> Self {
        Self {
            enabled: r.enabled,
            interval_hours: narrow(r.interval_hours),
            max_backups: narrow(r.max_backups),
            email_notifications: r.email_notifications,
        }
    }
}
