//! SeaORM implementation of BackupSettingsRepository

use async_trait::async_trait;
use log::info;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, Set};

use super::db_err;
use crate::domain::backup_settings::{BackupSettings, BackupSettingsRepository};
use crate::domain::DomainResult;
use crate::infrastructure::database::entities::backup_settings;

const SETTINGS_ROW: i32 = 1;

fn model_to_domain(m: backup_settings::Model) -> BackupSettings {
    BackupSettings {
        enabled: m.enabled,
        interval_hours: m.interval_hours.max(0) as u32,
        max_backups: m.max_backups.max(0) as u32,
        email_notifications: m.email_notifications,
        last_backup: m.last_backup,
        updated_at: m.updated_at,
    }
}

pub struct SeaOrmBackupSettingsRepository {
    db: DatabaseConnection,
}

impl SeaOrmBackupSettingsRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BackupSettingsRepository for SeaOrmBackupSettingsRepository {
    async fn load(&self) -> DomainResult<BackupSettings> {
        let model = backup_settings::Entity::find_by_id(SETTINGS_ROW)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain).unwrap_or_default())
    }

    async fn store(&self, settings: &BackupSettings) -> DomainResult<()> {
        let model = backup_settings::ActiveModel {
            id: Set(SETTINGS_ROW),
            enabled: Set(settings.enabled),
            interval_hours: Set(settings.interval_hours as i32),
            max_backups: Set(settings.max_backups as i32),
            email_notifications: Set(settings.email_notifications),
            last_backup: Set(settings.last_backup),
            updated_at: Set(settings.updated_at),
        };

        backup_settings::Entity::insert(model)
            .on_conflict(
                OnConflict::column(backup_settings::Column::Id)
                    .update_columns([
                        backup_settings::Column::Enabled,
                        backup_settings::Column::IntervalHours,
                        backup_settings::Column::MaxBackups,
                        backup_settings::Column::EmailNotifications,
                        backup_settings::Column::LastBackup,
                        backup_settings::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        info!(
            "Backup settings stored: enabled={} interval={}h max={}",
            settings.enabled, settings.interval_hours, settings.max_backups
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::repositories::test_support::memory_db;
    use chrono::Utc;

    #[tokio::test]
    async fn defaults_until_stored_then_survives_reload() {
        let db = memory_db().await;
        let repo = SeaOrmBackupSettingsRepository::new(db.clone());
        assert_eq!(repo.load().await.unwrap().interval_hours, 24);

        let mut settings = repo.load().await.unwrap();
        settings.interval_hours = 6;
        settings.last_backup = Some(Utc::now());
        repo.store(&settings).await.unwrap();
        settings.max_backups = 5;
        repo.store(&settings).await.unwrap();

        let reloaded = SeaOrmBackupSettingsRepository::new(db).load().await.unwrap();
        assert_eq!(reloaded.interval_hours, 6);
        assert_eq!(reloaded.max_backups, 5);
        assert!(reloaded.last_backup.is_some());
    }
}
