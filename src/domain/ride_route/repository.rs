use async_trait::async_trait;

use super::RideRoute;
use crate::domain::DomainResult;

#[async_trait]
pub trait RideRouteRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<RideRoute>>;
    /// Exact, case-sensitive match on the pair.
    async fn find_by_pair(&self, from: &str, to: &str) -> DomainResult<Option<RideRoute>>;
    async fn find_all(&self) -> DomainResult<Vec<RideRoute>>;
    async fn count(&self) -> DomainResult<u64>;
    /// Fails with `Conflict` when the pair already exists.
    async fn save(&self, route: RideRoute) -> DomainResult<RideRoute>;
    async fn update(&self, route: RideRoute) -> DomainResult<()>;
    async fn delete(&self, id: &str) -> DomainResult<()>;
}
