//! SeaORM implementation of RideBillRepository

use async_trait::async_trait;
use log::info;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use super::{db_err, write_err};
use crate::domain::ride_bill::{BillFilter, RideBill, RideBillRepository, RideStatus};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::ride_bill;
use crate::shared::PaginatedResult;

fn status_to_domain(s: ride_bill::RideStatus) -> RideStatus {
    match s {
        ride_bill::RideStatus::Completed => RideStatus::Completed,
        ride_bill::RideStatus::Cancelled => RideStatus::Cancelled,
        ride_bill::RideStatus::Pending => RideStatus::Pending,
    }
}

fn status_to_entity(s: RideStatus) -> ride_bill::RideStatus {
    match s {
        RideStatus::Completed => ride_bill::RideStatus::Completed,
        RideStatus::Cancelled => ride_bill::RideStatus::Cancelled,
        RideStatus::Pending => ride_bill::RideStatus::Pending,
    }
}

fn model_to_domain(m: ride_bill::Model) -> RideBill {
    RideBill {
        id: m.id,
        ride_id: m.ride_id,
        student_id: m.student_id,
        student_name: m.student_name,
        entry_number: m.entry_number,
        driver_id: m.driver_id,
        driver_name: m.driver_name,
        location: m.location,
        fare: m.fare,
        date: m.date,
        time: m.time,
        status: status_to_domain(m.status),
        notes: m.notes,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

fn domain_to_active(b: RideBill) -> ride_bill::ActiveModel {
    ride_bill::ActiveModel {
        id: Set(b.id),
        ride_id: Set(b.ride_id),
        student_id: Set(b.student_id),
        student_name: Set(b.student_name),
        entry_number: Set(b.entry_number),
        driver_id: Set(b.driver_id),
        driver_name: Set(b.driver_name),
        location: Set(b.location),
        fare: Set(b.fare),
        date: Set(b.date),
        time: Set(b.time),
        status: Set(status_to_entity(b.status)),
        notes: Set(b.notes),
        created_at: Set(b.created_at),
        updated_at: Set(b.updated_at),
    }
}

fn duplicate_ride(ride_id: &str) -> DomainError {
    DomainError::Conflict(format!("Ride bill {} already exists", ride_id))
}

pub struct SeaOrmRideBillRepository {
    db: DatabaseConnection,
}

impl SeaOrmRideBillRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RideBillRepository for SeaOrmRideBillRepository {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<RideBill>> {
        let model = ride_bill::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_by_ride_id(&self, ride_id: &str) -> DomainResult<Option<RideBill>> {
        let model = ride_bill::Entity::find()
            .filter(ride_bill::Column::RideId.eq(ride_id))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_all(&self) -> DomainResult<Vec<RideBill>> {
        let models = ride_bill::Entity::find()
            .order_by_desc(ride_bill::Column::Date)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn list(&self, filter: BillFilter) -> DomainResult<PaginatedResult<RideBill>> {
        let mut select = ride_bill::Entity::find();
        if let Some(status) = filter.status {
            select = select.filter(ride_bill::Column::Status.eq(status_to_entity(status)));
        }
        if let Some(student_id) = filter.student_id.as_deref() {
            select = select.filter(ride_bill::Column::StudentId.eq(student_id));
        }
        if let Some(driver_id) = filter.driver_id.as_deref() {
            select = select.filter(ride_bill::Column::DriverId.eq(driver_id));
        }

        let total = select.clone().count(&self.db).await.map_err(db_err)?;
        let offset = (filter.page.max(1) - 1) as u64 * filter.limit as u64;
        let models = select
            .order_by_desc(ride_bill::Column::Date)
            .order_by_desc(ride_bill::Column::Time)
            .offset(offset)
            .limit(filter.limit as u64)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let items = models.into_iter().map(model_to_domain).collect();
        Ok(PaginatedResult::new(items, total, filter.page, filter.limit))
    }

    async fn count(&self) -> DomainResult<u64> {
        ride_bill::Entity::find().count(&self.db).await.map_err(db_err)
    }

    async fn save(&self, bill: RideBill) -> DomainResult<RideBill> {
        let ride_id = bill.ride_id.clone();
        let model = domain_to_active(bill)
            .insert(&self.db)
            .await
            .map_err(|e| write_err(e, || duplicate_ride(&ride_id)))?;
        info!("Ride bill saved: {} ({})", model.ride_id, model.id);
        Ok(model_to_domain(model))
    }

    async fn update(&self, bill: RideBill) -> DomainResult<()> {
        let id = bill.id.clone();
        let ride_id = bill.ride_id.clone();
        domain_to_active(bill)
            .update(&self.db)
            .await
            .map_err(|e| match e {
                DbErr::RecordNotUpdated => DomainError::not_found("Ride bill", "id", id),
                other => write_err(other, || duplicate_ride(&ride_id)),
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::repositories::test_support::memory_db;
    use chrono::Utc;

    fn bill(ride_id: &str, student_id: &str, status: RideStatus) -> RideBill {
        let now = Utc::now();
        RideBill {
            id: RideBill::fresh_id(),
            ride_id: ride_id.into(),
            student_id: student_id.into(),
            student_name: "Student".into(),
            entry_number: None,
            driver_id: "drv-1".into(),
            driver_name: "Driver".into(),
            location: "Main Gate - Library".into(),
            fare: 20.0,
            date: now,
            time: "10:15".into(),
            status,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn duplicate_ride_id_is_a_conflict() {
        let repo = SeaOrmRideBillRepository::new(memory_db().await);
        repo.save(bill("R1", "s1", RideStatus::Completed)).await.unwrap();
        let err = repo
            .save(bill("R1", "s2", RideStatus::Pending))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn list_applies_filters() {
        let repo = SeaOrmRideBillRepository::new(memory_db().await);
        repo.save(bill("R1", "s1", RideStatus::Completed)).await.unwrap();
        repo.save(bill("R2", "s1", RideStatus::Cancelled)).await.unwrap();
        repo.save(bill("R3", "s2", RideStatus::Completed)).await.unwrap();

        let page = repo
            .list(BillFilter {
                student_id: Some("s1".into()),
                status: Some(RideStatus::Completed),
                page: 1,
                limit: 20,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].ride_id, "R1");
    }
}
