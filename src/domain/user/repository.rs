use async_trait::async_trait;

use super::{GetUserDto, User, UserRole};
use crate::domain::DomainResult;
use crate::shared::PaginatedResult;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>>;
    /// `email` must already be normalized.
    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>>;
    async fn find_by_reset_token(&self, token: &str) -> DomainResult<Option<User>>;
    async fn find_by_role(&self, role: UserRole) -> DomainResult<Vec<User>>;
    async fn find_all(&self) -> DomainResult<Vec<User>>;
    async fn list(&self, query: GetUserDto) -> DomainResult<PaginatedResult<User>>;
    async fn count(&self) -> DomainResult<u64>;

    /// Insert a new user. Fails with `Conflict` when the email is taken.
    async fn save(&self, user: User) -> DomainResult<User>;
    /// Replace a stored user. Fails with `NotFound` when absent.
    async fn update(&self, user: User) -> DomainResult<()>;
    async fn delete(&self, id: &str) -> DomainResult<()>;
}
