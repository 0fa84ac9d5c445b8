//! Create users table
//!
//! One table for every role; student and driver fields are nullable columns.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::PasswordHash).string())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string_len(20)
                            .not_null()
                            .default("student"),
                    )
                    .col(
                        ColumnDef::new(Users::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(ColumnDef::new(Users::Phone).string())
                    .col(ColumnDef::new(Users::PhotoData).binary())
                    .col(ColumnDef::new(Users::PhotoContentType).string())
                    .col(ColumnDef::new(Users::PhotoSize).big_integer())
                    .col(ColumnDef::new(Users::EntryNumber).string())
                    .col(ColumnDef::new(Users::Programme).string())
                    .col(ColumnDef::new(Users::Department).string())
                    .col(ColumnDef::new(Users::Hostel).string())
                    .col(ColumnDef::new(Users::EmergencyContact).string())
                    .col(ColumnDef::new(Users::DisabilityInfo).string())
                    .col(ColumnDef::new(Users::ExpiryDate).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Users::IsExpired)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Users::QrCode).text())
                    .col(ColumnDef::new(Users::ResetPasswordOtp).string())
                    .col(ColumnDef::new(Users::ResetPasswordOtpExpires).timestamp_with_time_zone())
                    .col(ColumnDef::new(Users::ResetPasswordToken).string())
                    .col(ColumnDef::new(Users::ResetPasswordExpires).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Users::LastLoginAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_role")
                    .table(Users::Table)
                    .col(Users::Role)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_reset_token")
                    .table(Users::Table)
                    .col(Users::ResetPasswordToken)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Users {
    Table,
    Id,
    Email,
    PasswordHash,
    Role,
    IsActive,
    Name,
    Phone,
    PhotoData,
    PhotoContentType,
    PhotoSize,
    EntryNumber,
    Programme,
    Department,
    Hostel,
    EmergencyContact,
    DisabilityInfo,
    ExpiryDate,
    IsExpired,
    QrCode,
    ResetPasswordOtp,
    ResetPasswordOtpExpires,
    ResetPasswordToken,
    ResetPasswordExpires,
    CreatedAt,
    UpdatedAt,
    LastLoginAt,
}
