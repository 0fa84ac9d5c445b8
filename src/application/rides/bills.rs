//! Ride bill log
//!
//! Bills are written once and only their status and notes change afterwards.
//! Students and drivers only ever see bills they took part in.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::domain::ride_bill::model::{validate_fare, validate_time};
use crate::domain::{
    BillFilter, DomainError, DomainResult, RepositoryProvider, RideBill, RideStatus, User,
    UserRole,
};
use crate::shared::PaginatedResult;

#[derive(Debug, Clone)]
pub struct CreateRideBillDto {
    pub ride_id: String,
    pub student_id: String,
    /// Defaults to the caller when a driver records the ride.
    pub driver_id: Option<String>,
    /// Route to bill; supplies the location label and the default fare.
    pub route_id: Option<String>,
    /// Free-text location when no route is given.
    pub location: Option<String>,
    pub fare: Option<f64>,
    pub date: DateTime<Utc>,
    pub time: String,
    pub status: RideStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RideBillUpdate {
    pub status: Option<RideStatus>,
    pub notes: Option<String>,
}

pub struct RideBillService {
    repos: Arc<dyn RepositoryProvider>,
}

impl RideBillService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    async fn user_with_role(
        &self,
        id: &str,
        role: UserRole,
        entity: &'static str,
    ) -> DomainResult<User> {
        self.repos
            .users()
            .find_by_id(id)
            .await?
            .filter(|u| u.role == role)
            .ok_or_else(|| DomainError::not_found(entity, "id", id))
    }

    pub async fn create_bill(
        &self,
        dto: CreateRideBillDto,
        actor_id: &str,
        actor_role: UserRole,
    ) -> DomainResult<RideBill> {
        let driver_id = match (actor_role, dto.driver_id) {
            (UserRole::Driver, Some(id)) if id != actor_id => {
                return Err(DomainError::Forbidden(
                    "Drivers can only record their own rides".into(),
                ))
            }
            (UserRole::Driver, _) => actor_id.to_string(),
            (_, Some(id)) => id,
            (_, None) => {
                return Err(DomainError::Validation("Driver ID is required".into()));
            }
        };

        validate_time(&dto.time)?;
        if let Some(fare) = dto.fare {
            validate_fare(fare)?;
        }

        let student = self
            .user_with_role(&dto.student_id, UserRole::Student, "Student")
            .await?;
        let driver = self
            .user_with_role(&driver_id, UserRole::Driver, "Driver")
            .await?;

        let (location, route_fare) = match dto.route_id.as_deref() {
            Some(route_id) => {
                let route = self
                    .repos
                    .ride_routes()
                    .find_by_id(route_id)
                    .await?
                    .ok_or_else(|| DomainError::not_found("Ride route", "id", route_id))?;
                (route.label(), Some(route.fare))
            }
            None => {
                let location = dto
                    .location
                    .map(|l| l.trim().to_string())
                    .filter(|l| !l.is_empty())
                    .ok_or_else(|| {
                        DomainError::Validation("Route or location is required".into())
                    })?;
                (location, None)
            }
        };
        let fare = dto
            .fare
            .or(route_fare)
            .ok_or_else(|| DomainError::Validation("Fare is required".into()))?;

        let now = Utc::now();
        let bill = RideBill {
            id: RideBill::fresh_id(),
            ride_id: dto.ride_id.trim().to_string(),
            student_id: student.id,
            student_name: student.name,
            entry_number: student.student.entry_number,
            driver_id: driver.id,
            driver_name: driver.name,
            location,
            fare,
            date: dto.date,
            time: dto.time,
            status: dto.status,
            notes: dto.notes,
            created_at: now,
            updated_at: now,
        };
        bill.validate()?;

        if self
            .repos
            .ride_bills()
            .find_by_ride_id(&bill.ride_id)
            .await?
            .is_some()
        {
            return Err(DomainError::Conflict(format!(
                "Ride bill {} already exists",
                bill.ride_id
            )));
        }

        let bill = self.repos.ride_bills().save(bill).await?;
        metrics::counter!("ride_bills_created_total").increment(1);
        info!(bill_id = %bill.id, ride_id = %bill.ride_id, fare = bill.fare, "Ride bill recorded");
        Ok(bill)
    }

    /// Students and drivers are pinned to their own bills whatever the filter says.
    pub async fn list_bills(
        &self,
        mut filter: BillFilter,
        actor_id: &str,
        actor_role: UserRole,
    ) -> DomainResult<PaginatedResult<RideBill>> {
        match actor_role {
            UserRole::Student => filter.student_id = Some(actor_id.to_string()),
            UserRole::Driver => filter.driver_id = Some(actor_id.to_string()),
            UserRole::Admin | UserRole::Staff => {}
        }
        self.repos.ride_bills().list(filter).await
    }

    pub async fn get_bill(
        &self,
        id: &str,
        actor_id: &str,
        actor_role: UserRole,
    ) -> DomainResult<RideBill> {
        let bill = self
            .repos
            .ride_bills()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Ride bill", "id", id))?;

        let visible = match actor_role {
            UserRole::Student => bill.student_id == actor_id,
            UserRole::Driver => bill.driver_id == actor_id,
            UserRole::Admin | UserRole::Staff => true,
        };
        if !visible {
            return Err(DomainError::not_found("Ride bill", "id", id));
        }
        Ok(bill)
    }

    pub async fn update_bill(&self, id: &str, update: RideBillUpdate) -> DomainResult<RideBill> {
        let mut bill = self
            .repos
            .ride_bills()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Ride bill", "id", id))?;

        if let Some(status) = update.status {
            bill.status = status;
        }
        if let Some(notes) = update.notes {
            let notes = notes.trim().to_string();
            bill.notes = (!notes.is_empty()).then_some(notes);
        }
        bill.updated_at = Utc::now();

        self.repos.ride_bills().update(bill.clone()).await?;
        info!(bill_id = %bill.id, status = %bill.status, "Ride bill updated");
        Ok(bill)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::InMemoryRepositoryProvider;

    struct Fixture {
        service: RideBillService,
        student: User,
        driver: User,
        route_id: String,
    }

    async fn fixture() -> Fixture {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let mut student = User::new("s@campus.edu", "Asha", UserRole::Student);
        student.student.entry_number = Some("2021CS001".into());
        let student = repos.users().save(student).await.unwrap();
        let driver = repos
            .users()
            .save(User::new("d@campus.edu", "Ravi", UserRole::Driver))
            .await
            .unwrap();
        let route = repos
            .ride_routes()
            .save(crate::domain::RideRoute::new("Main Gate", "Library", 20.0).unwrap())
            .await
            .unwrap();
        Fixture {
            service: RideBillService::new(repos),
            student,
            driver,
            route_id: route.id,
        }
    }

    fn dto(f: &Fixture, ride_id: &str) -> CreateRideBillDto {
        CreateRideBillDto {
            ride_id: ride_id.into(),
            student_id: f.student.id.clone(),
            driver_id: Some(f.driver.id.clone()),
            route_id: Some(f.route_id.clone()),
            location: None,
            fare: None,
            date: Utc::now(),
            time: "08:30".into(),
            status: RideStatus::Completed,
            notes: None,
        }
    }

    #[tokio::test]
    async fn create_fills_names_and_route_defaults() {
        let f = fixture().await;
        let bill = f
            .service
            .create_bill(dto(&f, "RIDE-1"), "staff-id", UserRole::Staff)
            .await
            .unwrap();
        assert_eq!(bill.student_name, "Asha");
        assert_eq!(bill.entry_number.as_deref(), Some("2021CS001"));
        assert_eq!(bill.driver_name, "Ravi");
        assert_eq!(bill.location, "Main Gate - Library");
        assert_eq!(bill.fare, 20.0);
    }

    #[tokio::test]
    async fn create_validates_fare_time_and_ride_id() {
        let f = fixture().await;

        let mut bad_time = dto(&f, "RIDE-1");
        bad_time.time = "24:00".into();
        assert!(matches!(
            f.service.create_bill(bad_time, "a", UserRole::Admin).await,
            Err(DomainError::Validation(_))
        ));

        let mut bad_fare = dto(&f, "RIDE-1");
        bad_fare.fare = Some(10_000.01);
        assert!(matches!(
            f.service.create_bill(bad_fare, "a", UserRole::Admin).await,
            Err(DomainError::Validation(_))
        ));

        f.service
            .create_bill(dto(&f, "RIDE-1"), "a", UserRole::Admin)
            .await
            .unwrap();
        assert!(matches!(
            f.service.create_bill(dto(&f, "RIDE-1"), "a", UserRole::Admin).await,
            Err(DomainError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn drivers_record_only_their_own_rides() {
        let f = fixture().await;
        let mut own = dto(&f, "RIDE-2");
        own.driver_id = None;
        let bill = f
            .service
            .create_bill(own, &f.driver.id, UserRole::Driver)
            .await
            .unwrap();
        assert_eq!(bill.driver_id, f.driver.id);

        let mut other = dto(&f, "RIDE-3");
        other.driver_id = Some("someone-else".into());
        assert!(matches!(
            f.service.create_bill(other, &f.driver.id, UserRole::Driver).await,
            Err(DomainError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn students_only_see_their_bills() {
        let f = fixture().await;
        let bill = f
            .service
            .create_bill(dto(&f, "RIDE-1"), "a", UserRole::Admin)
            .await
            .unwrap();

        let filter = BillFilter {
            page: 1,
            limit: 20,
            ..Default::default()
        };
        let own = f
            .service
            .list_bills(filter.clone(), &f.student.id, UserRole::Student)
            .await
            .unwrap();
        assert_eq!(own.total, 1);

        let other = f
            .service
            .list_bills(filter, "another-student", UserRole::Student)
            .await
            .unwrap();
        assert_eq!(other.total, 0);

        assert!(f
            .service
            .get_bill(&bill.id, "another-student", UserRole::Student)
            .await
            .is_err());
        assert!(f
            .service
            .get_bill(&bill.id, &f.driver.id, UserRole::Driver)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn update_changes_status_and_notes_only() {
        let f = fixture().await;
        let bill = f
            .service
            .create_bill(dto(&f, "RIDE-1"), "a", UserRole::Admin)
            .await
            .unwrap();

        let updated = f
            .service
            .update_bill(
                &bill.id,
                RideBillUpdate {
                    status: Some(RideStatus::Cancelled),
                    notes: Some("student no-show".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, RideStatus::Cancelled);
        assert_eq!(updated.notes.as_deref(), Some("student no-show"));
        assert_eq!(updated.fare, bill.fare);
        assert_eq!(updated.ride_id, bill.ride_id);
    }
}
