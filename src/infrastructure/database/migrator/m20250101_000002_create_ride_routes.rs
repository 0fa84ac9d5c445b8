//! Create ride_routes table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RideRoutes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RideRoutes::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(RideRoutes::FromLocation).string().not_null())
                    .col(ColumnDef::new(RideRoutes::ToLocation).string().not_null())
                    .col(ColumnDef::new(RideRoutes::Fare).double().not_null().default(0.0))
                    .col(
                        ColumnDef::new(RideRoutes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RideRoutes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ride_routes_pair")
                    .table(RideRoutes::Table)
                    .col(RideRoutes::FromLocation)
                    .col(RideRoutes::ToLocation)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RideRoutes::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum RideRoutes {
    Table,
    Id,
    FromLocation,
    ToLocation,
    Fare,
    CreatedAt,
    UpdatedAt,
}
