//! Create backup_settings table (single row)

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BackupSettings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BackupSettings::Id)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BackupSettings::Enabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(BackupSettings::IntervalHours)
                            .integer()
                            .not_null()
                            .default(24),
                    )
                    .col(
                        ColumnDef::new(BackupSettings::MaxBackups)
                            .integer()
                            .not_null()
                            .default(30),
                    )
                    .col(
                        ColumnDef::new(BackupSettings::EmailNotifications)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(BackupSettings::LastBackup).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(BackupSettings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BackupSettings::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum BackupSettings {
    Table,
    Id,
    Enabled,
    IntervalHours,
    MaxBackups,
    EmailNotifications,
    LastBackup,
    UpdatedAt,
}
