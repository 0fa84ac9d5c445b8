//! Create ride_bills table
//!
//! Append-only ride history. `location` is a copied label, not a foreign key.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RideBills::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RideBills::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(RideBills::RideId).string().not_null().unique_key())
                    .col(ColumnDef::new(RideBills::StudentId).string().not_null())
                    .col(ColumnDef::new(RideBills::StudentName).string().not_null())
                    .col(ColumnDef::new(RideBills::EntryNumber).string())
                    .col(ColumnDef::new(RideBills::DriverId).string().not_null())
                    .col(ColumnDef::new(RideBills::DriverName).string().not_null())
                    .col(ColumnDef::new(RideBills::Location).string().not_null())
                    .col(ColumnDef::new(RideBills::Fare).double().not_null())
                    .col(
                        ColumnDef::new(RideBills::Date)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RideBills::Time).string_len(5).not_null())
                    .col(
                        ColumnDef::new(RideBills::Status)
                            .string_len(20)
                            .not_null()
                            .default("completed"),
                    )
                    .col(ColumnDef::new(RideBills::Notes).text())
                    .col(
                        ColumnDef::new(RideBills::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RideBills::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ride_bills_student")
                    .table(RideBills::Table)
                    .col(RideBills::StudentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ride_bills_driver")
                    .table(RideBills::Table)
                    .col(RideBills::DriverId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RideBills::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum RideBills {
    Table,
    Id,
    RideId,
    StudentId,
    StudentName,
    EntryNumber,
    DriverId,
    DriverName,
    Location,
    Fare,
    Date,
    Time,
    Status,
    Notes,
    CreatedAt,
    UpdatedAt,
}
