//! Ride route catalogue

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::domain::{DomainError, DomainResult, RepositoryProvider, RideRoute};

#[derive(Debug, Clone)]
pub struct RideRouteInput {
    pub from_location: String,
    pub to_location: String,
    pub fare: f64,
}

pub struct RideRouteService {
    repos: Arc<dyn RepositoryProvider>,
}

impl RideRouteService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    pub async fn list_routes(&self) -> DomainResult<Vec<RideRoute>> {
        self.repos.ride_routes().find_all().await
    }

    pub async fn get_route(&self, id: &str) -> DomainResult<RideRoute> {
        self.repos
            .ride_routes()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Ride route", "id", id))
    }

    pub async fn create_route(&self, input: RideRouteInput) -> DomainResult<RideRoute> {
        let route = RideRoute::new(input.from_location, input.to_location, input.fare)?;
        if self
            .repos
            .ride_routes()
            .find_by_pair(&route.from_location, &route.to_location)
            .await?
            .is_some()
        {
            return Err(route.duplicate_error());
        }

        let route = self.repos.ride_routes().save(route).await?;
        info!(route_id = %route.id, label = %route.label(), fare = route.fare, "Ride route created");
        Ok(route)
    }

    pub async fn update_route(&self, id: &str, input: RideRouteInput) -> DomainResult<RideRoute> {
        let mut route = self.get_route(id).await?;
        route.from_location = input.from_location.trim().to_string();
        route.to_location = input.to_location.trim().to_string();
        route.fare = input.fare;
        route.validate()?;

        let clash = self
            .repos
            .ride_routes()
            .find_by_pair(&route.from_location, &route.to_location)
            .await?;
        if clash.is_some_and(|other| other.id != route.id) {
            return Err(route.duplicate_error());
        }

        route.updated_at = Utc::now();
        self.repos.ride_routes().update(route.clone()).await?;
        info!(route_id = %route.id, label = %route.label(), "Ride route updated");
        Ok(route)
    }

    pub async fn delete_route(&self, id: &str) -> DomainResult<()> {
        self.repos.ride_routes().delete(id).await?;
        info!(route_id = id, "Ride route deleted");
        Ok(())
    }
}
