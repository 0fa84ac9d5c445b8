//! Ride bill domain entity

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{DomainError, DomainResult};
use crate::shared::is_valid_time_24h;

pub const MAX_FARE: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RideStatus {
    Completed,
    Cancelled,
    Pending,
}

impl RideStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Pending => "pending",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "pending" => Ok(Self::Pending),
            other => Err(DomainError::Validation(format!(
                "Invalid status '{}': expected completed, cancelled or pending",
                other
            ))),
        }
    }
}

impl Default for RideStatus {
    fn default() -> Self {
        Self::Completed
    }
}

impl std::fmt::Display for RideStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RideBill {
    pub id: String,
    /// Business key, unique across all bills.
    pub ride_id: String,
    pub student_id: String,
    pub student_name: String,
    pub entry_number: Option<String>,
    pub driver_id: String,
    pub driver_name: String,
    /// Route label copied at booking time; not a foreign key.
    pub location: String,
    pub fare: f64,
    pub date: DateTime<Utc>,
    /// `HH:MM`, 24-hour.
    pub time: String,
    pub status: RideStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RideBill {
    pub fn fresh_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.ride_id.trim().is_empty() {
            return Err(DomainError::Validation("Ride ID is required".to_string()));
        }
        validate_fare(self.fare)?;
        validate_time(&self.time)?;
        Ok(())
    }
}

pub fn validate_fare(fare: f64) -> DomainResult<()> {
    if !fare.is_finite() || !(0.0..=MAX_FARE).contains(&fare) {
        return Err(DomainError::Validation(format!(
            "Fare must be between 0 and {}",
            MAX_FARE
        )));
    }
    Ok(())
}

pub fn validate_time(time: &str) -> DomainResult<()> {
    if !is_valid_time_24h(time) {
        return Err(DomainError::Validation(
            "Time must be in 24-hour HH:MM format".to_string(),
        ));
    }
    Ok(())
}

/// Listing filter for ride bills.
#[derive(Debug, Clone, Default)]
pub struct BillFilter {
    pub status: Option<RideStatus>,
    pub student_id: Option<String>,
    pub driver_id: Option<String>,
    pub page: u32,
    pub limit: u32,
}

impl BillFilter {
    pub fn matches(&self, bill: &RideBill) -> bool {
        self.status.map_or(true, |s| bill.status == s)
            && self
                .student_id
                .as_deref()
                .map_or(true, |id| bill.student_id == id)
            && self
                .driver_id
                .as_deref()
                .map_or(true, |id| bill.driver_id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bill() -> RideBill {
        let now = Utc::now();
        RideBill {
            id: RideBill::fresh_id(),
            ride_id: "RIDE-001".into(),
            student_id: "stu-1".into(),
            student_name: "Asha".into(),
            entry_number: Some("2021CS001".into()),
            driver_id: "drv-1".into(),
            driver_name: "Ravi".into(),
            location: "Main Gate - Library".into(),
            fare: 20.0,
            date: now,
            time: "09:30".into(),
            status: RideStatus::Completed,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn fare_bounds_are_inclusive() {
        assert!(validate_fare(0.0).is_ok());
        assert!(validate_fare(10_000.0).is_ok());
        assert!(validate_fare(-0.01).is_err());
        assert!(validate_fare(10_000.01).is_err());
        assert!(validate_fare(f64::NAN).is_err());
    }

    #[test]
    fn time_must_be_24_hour() {
        let mut bill = sample_bill();
        assert!(bill.validate().is_ok());
        bill.time = "25:00".into();
        assert!(bill.validate().is_err());
        bill.time = "7:05".into();
        assert!(bill.validate().is_err());
    }

    #[test]
    fn filter_combines_conditions() {
        let bill = sample_bill();
        let filter = BillFilter {
            status: Some(RideStatus::Completed),
            driver_id: Some("drv-1".into()),
            ..Default::default()
        };
        assert!(filter.matches(&bill));
        let other = BillFilter {
            student_id: Some("stu-2".into()),
            ..Default::default()
        };
        assert!(!other.matches(&bill));
    }
}
