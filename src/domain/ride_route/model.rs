use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{DomainError, DomainResult};

#[derive(Debug, Clone, PartialEq)]
pub struct RideRoute {
    pub id: String,
    pub from_location: String,
    pub to_location: String,
    pub fare: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RideRoute {
    pub fn new(
        from_location: impl Into<String>,
        to_location: impl Into<String>,
        fare: f64,
    ) -> DomainResult<Self> {
        let now = Utc::now();
        let route = Self {
            id: Uuid::new_v4().to_string(),
            from_location: from_location.into().trim().to_string(),
            to_location: to_location.into().trim().to_string(),
            fare,
            created_at: now,
            updated_at: now,
        };
        route.validate()?;
        Ok(route)
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.from_location.is_empty() || self.to_location.is_empty() {
            return Err(DomainError::Validation(
                "From and to locations are required".to_string(),
            ));
        }
        if !self.fare.is_finite() || self.fare < 0.0 {
            return Err(DomainError::Validation(
                "Fare must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }

    /// Denormalized label stored on ride bills.
    pub fn label(&self) -> String {
        format!("{} - {}", self.from_location, self.to_location)
    }

    pub fn duplicate_error(&self) -> DomainError {
        DomainError::Conflict(format!(
            "Route from {} to {} already exists",
            self.from_location, self.to_location
        ))
    }
}
