use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::application::rides::{CreateRideBillDto, RideBillUpdate};
use crate::domain::{DomainResult, RideBill, RideStatus};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RideBillDto {
    pub id: String,
    pub ride_id: String,
    pub student_id: String,
    pub student_name: String,
    pub entry_number: Option<String>,
    pub driver_id: String,
    pub driver_name: String,
    pub location: String,
    pub fare: f64,
    pub date: DateTime<Utc>,
    pub time: String,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RideBill> for RideBillDto {
    fn from(b: RideBill) -> Self {
        Self {
            status: b.status.as_str().to_string(),
            id: b.id,
            ride_id: b.ride_id,
            student_id: b.student_id,
            student_name: b.student_name,
            entry_number: b.entry_number,
            driver_id: b.driver_id,
            driver_name: b.driver_name,
            location: b.location,
            fare: b.fare,
            date: b.date,
            time: b.time,
            notes: b.notes,
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRideBillRequest {
    #[validate(length(min = 1, max = 100, message = "ride id is required"))]
    pub ride_id: String,
    #[validate(length(min = 1, message = "student id is required"))]
    pub student_id: String,
    /// Defaults to the caller for drivers
    pub driver_id: Option<String>,
    pub route_id: Option<String>,
    pub location: Option<String>,
    pub fare: Option<f64>,
    pub date: Option<DateTime<Utc>>,
    /// `HH:MM`, 24-hour
    pub time: String,
    /// completed (default), cancelled or pending
    pub status: Option<String>,
    #[validate(length(max = 1000, message = "notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}

impl CreateRideBillRequest {
    pub fn into_dto(self) -> DomainResult<CreateRideBillDto> {
        let status = self
            .status
            .as_deref()
            .map(RideStatus::parse)
            .transpose()?
            .unwrap_or_default();
        Ok(CreateRideBillDto {
            ride_id: self.ride_id,
            student_id: self.student_id,
            driver_id: self.driver_id,
            route_id: self.route_id,
            location: self.location,
            fare: self.fare,
            date: self.date.unwrap_or_else(Utc::now),
            time: self.time,
            status,
            notes: self.notes,
        })
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateRideBillRequest {
    pub status: Option<String>,
    #[validate(length(max = 1000, message = "notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}

impl UpdateRideBillRequest {
    pub fn into_update(self) -> DomainResult<RideBillUpdate> {
        Ok(RideBillUpdate {
            status: self.status.as_deref().map(RideStatus::parse).transpose()?,
            notes: self.notes,
        })
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListRideBillsParams {
    /// completed, cancelled or pending
    pub status: Option<String>,
    pub student_id: Option<String>,
    pub driver_id: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}
