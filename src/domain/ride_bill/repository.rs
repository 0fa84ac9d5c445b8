use async_trait::async_trait;

use super::{BillFilter, RideBill};
use crate::domain::DomainResult;
use crate::shared::PaginatedResult;

/// Bills are append-only: there is no delete.
#[async_trait]
pub trait RideBillRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<RideBill>>;
    async fn find_by_ride_id(&self, ride_id: &str) -> DomainResult<Option<RideBill>>;
    async fn find_all(&self) -> DomainResult<Vec<RideBill>>;
    async fn list(&self, filter: BillFilter) -> DomainResult<PaginatedResult<RideBill>>;
    async fn count(&self) -> DomainResult<u64>;
    /// Fails with `Conflict` when the ride id already exists.
    async fn save(&self, bill: RideBill) -> DomainResult<RideBill>;
    async fn update(&self, bill: RideBill) -> DomainResult<()>;
}
