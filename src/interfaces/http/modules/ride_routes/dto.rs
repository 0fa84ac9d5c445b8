use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::rides::RideRouteInput;
use crate::domain::RideRoute;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RideRouteDto {
    pub id: String,
    pub from_location: String,
    pub to_location: String,
    pub fare: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RideRoute> for RideRouteDto {
    fn from(r: RideRoute) -> Self {
        Self {
            id: r.id,
            from_location: r.from_location,
            to_location: r.to_location,
            fare: r.fare,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RideRouteRequest {
    #[validate(length(min = 1, max = 200, message = "from location is required"))]
    pub from_location: String,
    #[validate(length(min = 1, max = 200, message = "to location is required"))]
    pub to_location: String,
    #[validate(range(min = 0.0, message = "fare must not be negative"))]
    pub fare: f64,
}

impl From<RideRouteRequest> for RideRouteInput {
    fn from(r: RideRouteRequest) -> Self {
        Self {
            from_location: r.from_location,
            to_location: r.to_location,
            fare: r.fare,
        }
    }
}
