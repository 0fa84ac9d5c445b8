//! SeaORM implementation of RideRouteRepository

use async_trait::async_trait;
use log::info;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

use super::{db_err, write_err};
use crate::domain::ride_route::{RideRoute, RideRouteRepository};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::ride_route;

fn model_to_domain(m: ride_route::Model) -> RideRoute {
    RideRoute {
        id: m.id,
        from_location: m.from_location,
        to_location: m.to_location,
        fare: m.fare,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

fn domain_to_active(r: RideRoute) -> ride_route::ActiveModel {
    ride_route::ActiveModel {
        id: Set(r.id),
        from_location: Set(r.from_location),
        to_location: Set(r.to_location),
        fare: Set(r.fare),
        created_at: Set(r.created_at),
        updated_at: Set(r.updated_at),
    }
}

pub struct SeaOrmRideRouteRepository {
    db: DatabaseConnection,
}

impl SeaOrmRideRouteRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RideRouteRepository for SeaOrmRideRouteRepository {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<RideRoute>> {
        let model = ride_route::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_by_pair(&self, from: &str, to: &str) -> DomainResult<Option<RideRoute>> {
        let model = ride_route::Entity::find()
            .filter(ride_route::Column::FromLocation.eq(from))
            .filter(ride_route::Column::ToLocation.eq(to))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_all(&self) -> DomainResult<Vec<RideRoute>> {
        let models = ride_route::Entity::find()
            .order_by_asc(ride_route::Column::FromLocation)
            .order_by_asc(ride_route::Column::ToLocation)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn count(&self) -> DomainResult<u64> {
        ride_route::Entity::find().count(&self.db).await.map_err(db_err)
    }

    async fn save(&self, route: RideRoute) -> DomainResult<RideRoute> {
        let duplicate = route.duplicate_error();
        let model = domain_to_active(route)
            .insert(&self.db)
            .await
            .map_err(|e| write_err(e, || duplicate))?;
        info!(
            "Ride route saved: {} -> {} ({})",
            model.from_location, model.to_location, model.id
        );
        Ok(model_to_domain(model))
    }

    async fn update(&self, route: RideRoute) -> DomainResult<()> {
        let id = route.id.clone();
        let duplicate = route.duplicate_error();
        domain_to_active(route)
            .update(&self.db)
            .await
            .map_err(|e| match e {
                DbErr::RecordNotUpdated => DomainError::not_found("Route", "id", id),
                other => write_err(other, || duplicate),
            })?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        let result = ride_route::Entity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(DomainError::not_found("Route", "id", id));
        }
        info!("Ride route deleted: {}", id);
        Ok(())
    }
}
