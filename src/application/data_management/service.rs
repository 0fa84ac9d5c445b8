//! Backup, export, import and housekeeping operations

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use super::backup_store::{backup_filename, BackupEntry, BackupStore, ClearOutcome};
use super::cache::clear_directories;
use super::documents::{
    BackupFile, CollectionCounts, CollectionData, ExportPayload, RideBillDocument,
    RideRouteDocument, UserDocument, UserProfileDocument, EXPORT_VERSION,
};
use super::import::{import_payload, ImportOutcome};
use crate::application::events::SharedEventBus;
use crate::application::notifications::{Notification, NotificationDispatcher};
use crate::domain::{
    BackupSettings, BackupSettingsUpdate, DomainError, DomainResult, RepositoryProvider, RideBill,
    RideRoute, User, UserRole,
};

/// Backups listed by the history view.
pub const HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone)]
pub struct BackupOutcome {
    pub filename: String,
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
    pub counts: CollectionCounts,
    /// Old backups removed by retention
    pub pruned: usize,
}

#[derive(Debug, Clone)]
pub enum ScheduleOutcome {
    Disabled,
    NotDue { next_backup: Option<DateTime<Utc>> },
    Created(BackupOutcome),
}

#[derive(Debug, Clone)]
pub struct SettingsView {
    pub settings: BackupSettings,
    pub next_backup: Option<DateTime<Utc>>,
}

impl From<BackupSettings> for SettingsView {
    fn from(settings: BackupSettings) -> Self {
        let next_backup = settings.next_backup(Utc::now());
        Self {
            settings,
            next_backup,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DataManagementConfig {
    pub backup_dir: PathBuf,
    pub cache_dirs: Vec<PathBuf>,
}

pub struct DataManagementService {
    repos: Arc<dyn RepositoryProvider>,
    backups: BackupStore,
    cache_dirs: Vec<PathBuf>,
    notifications: NotificationDispatcher,
    events: SharedEventBus,
}

impl DataManagementService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        config: DataManagementConfig,
        notifications: NotificationDispatcher,
        events: SharedEventBus,
    ) -> Self {
        Self {
            repos,
            backups: BackupStore::new(config.backup_dir),
            cache_dirs: config.cache_dirs,
            notifications,
            events,
        }
    }

    async fn read_all(&self) -> DomainResult<(Vec<User>, Vec<RideRoute>, Vec<RideBill>)> {
        tokio::try_join!(
            self.repos.users().find_all(),
            self.repos.ride_routes().find_all(),
            self.repos.ride_bills().find_all(),
        )
    }

    // ── Backup ──────────────────────────────────────────────────

    pub async fn create_backup(&self) -> DomainResult<BackupOutcome> {
        const CONTEXT: &str = "Backup creation failed";

        let (users, routes, bills) = self
            .read_all()
            .await
            .map_err(|e| DomainError::operation(CONTEXT, e))?;

        let created_at = Utc::now();
        let data = CollectionData {
            users: users.iter().map(UserDocument::from).collect(),
            ride_locations: routes.iter().map(RideRouteDocument::from).collect(),
            ride_bills: bills.iter().map(RideBillDocument::from).collect(),
        };
        let counts = data.counts();
        let file = BackupFile {
            timestamp: created_at,
            collections: counts,
            data,
        };
        let bytes =
            serde_json::to_vec_pretty(&file).map_err(|e| DomainError::operation(CONTEXT, e))?;

        let filename = backup_filename(created_at);
        let size_bytes = self
            .backups
            .write_new(&filename, &bytes)
            .await
            .map_err(|e| DomainError::operation(CONTEXT, e))?;

        let mut settings = self.repos.backup_settings().load().await.unwrap_or_else(|e| {
            warn!(error = %e, "Cannot load backup settings, using defaults");
            BackupSettings::default()
        });
        settings.last_backup = Some(created_at);
        if let Err(e) = self.repos.backup_settings().store(&settings).await {
            error!(error = %e, "Backup written but last backup time not recorded");
        }

        let pruned = self.backups.prune(settings.max_backups as usize).await;

        metrics::counter!("backups_created_total").increment(1);
        metrics::histogram!("backup_size_bytes").record(size_bytes as f64);
        info!(
            %filename,
            size_bytes,
            users = counts.users,
            ride_locations = counts.ride_locations,
            ride_bills = counts.ride_bills,
            pruned,
            "Backup created"
        );

        if settings.email_notifications {
            self.notify_admins(&filename, counts, size_bytes, &users);
        }

        Ok(BackupOutcome {
            filename,
            created_at,
            size_bytes,
            counts,
            pruned,
        })
    }

    fn notify_admins(&self, filename: &str, counts: CollectionCounts, size_bytes: u64, users: &[User]) {
        let recipients: Vec<String> = users
            .iter()
            .filter(|u| u.role == UserRole::Admin && u.is_active)
            .map(|u| u.email.clone())
            .collect();
        if recipients.is_empty() {
            return;
        }
        // Detached: the backup result does not depend on delivery.
        let _ = self.notifications.dispatch(Notification::BackupCompleted {
            recipients,
            filename: filename.to_string(),
            counts,
            size_bytes,
        });
    }

    /// Entry point for an external scheduler. `force` ignores the schedule.
    pub async fn schedule_backup(&self, force: bool) -> DomainResult<ScheduleOutcome> {
        let settings = self.repos.backup_settings().load().await?;
        let now = Utc::now();

        if !force {
            if !settings.enabled {
                info!("Scheduled backup skipped: backups disabled");
                return Ok(ScheduleOutcome::Disabled);
            }
            if !settings.is_due(now) {
                let next_backup = settings.next_backup(now);
                info!(?next_backup, "Scheduled backup skipped: not due");
                return Ok(ScheduleOutcome::NotDue { next_backup });
            }
        }

        self.create_backup().await.map(ScheduleOutcome::Created)
    }

    // ── Export / import ─────────────────────────────────────────

    pub async fn export_all_data(&self) -> DomainResult<ExportPayload> {
        let (users, routes, bills) = self
            .read_all()
            .await
            .map_err(|e| DomainError::operation("Failed to export data", e))?;

        let data = CollectionData {
            users: users.iter().map(UserProfileDocument::from).collect(),
            ride_locations: routes.iter().map(RideRouteDocument::from).collect(),
            ride_bills: bills.iter().map(RideBillDocument::from).collect(),
        };
        let stats = data.counts();
        info!(
            users = stats.users,
            ride_locations = stats.ride_locations,
            ride_bills = stats.ride_bills,
            "Data exported"
        );

        Ok(ExportPayload {
            export_date: Utc::now(),
            version: EXPORT_VERSION.to_string(),
            data,
            stats,
        })
    }

    pub async fn import_data(&self, bytes: &[u8]) -> DomainResult<ImportOutcome> {
        let outcome = import_payload(self.repos.as_ref(), &self.events, bytes)
            .await
            .map_err(|e| match e {
                e @ DomainError::Validation(_) => e,
                other => DomainError::operation("Failed to import data", other),
            })?;

        let imported =
            outcome.users.imported + outcome.ride_locations.imported + outcome.ride_bills.imported;
        metrics::counter!("import_records_total", "result" => "imported").increment(imported);
        metrics::counter!("import_records_total", "result" => "skipped").increment(
            outcome.users.skipped + outcome.ride_locations.skipped + outcome.ride_bills.skipped,
        );
        metrics::counter!("import_records_total", "result" => "error").increment(
            outcome.users.errors + outcome.ride_locations.errors + outcome.ride_bills.errors,
        );
        Ok(outcome)
    }

    // ── Housekeeping ────────────────────────────────────────────

    pub async fn clear_cache(&self) -> DomainResult<Vec<String>> {
        clear_directories(&self.cache_dirs)
            .await
            .map_err(|e| DomainError::operation("Failed to clear cache", e))
    }

    pub async fn backup_history(&self) -> DomainResult<Vec<BackupEntry>> {
        self.backups
            .history(HISTORY_LIMIT)
            .await
            .map_err(|e| DomainError::operation("Failed to read backup history", e))
    }

    pub async fn delete_backup(&self, filename: &str) -> DomainResult<u64> {
        let size = self.backups.delete(filename).await?;
        info!(%filename, size, "Backup deleted");
        Ok(size)
    }

    pub async fn clear_backup_history(&self) -> DomainResult<ClearOutcome> {
        let outcome = self
            .backups
            .clear()
            .await
            .map_err(|e| DomainError::operation("Failed to clear backup history", e))?;
        info!(
            deleted = outcome.deleted,
            freed_bytes = outcome.freed_bytes,
            errors = outcome.errors.len(),
            "Backup history cleared"
        );
        Ok(outcome)
    }

    // ── Settings ────────────────────────────────────────────────

    pub async fn backup_settings(&self) -> DomainResult<SettingsView> {
        Ok(self.repos.backup_settings().load().await?.into())
    }

    pub async fn update_backup_settings(
        &self,
        update: BackupSettingsUpdate,
    ) -> DomainResult<SettingsView> {
        let mut settings = self.repos.backup_settings().load().await?;
        settings.apply(update)?;
        self.repos.backup_settings().store(&settings).await?;
        info!(
            enabled = settings.enabled,
            interval_hours = settings.interval_hours,
            max_backups = settings.max_backups,
            "Backup settings updated"
        );
        Ok(settings.into())
    }
}
