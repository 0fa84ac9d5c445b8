//! In-memory repositories for development and testing

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::RwLock;

use crate::domain::backup_settings::{BackupSettings, BackupSettingsRepository};
use crate::domain::repositories::RepositoryProvider;
use crate::domain::ride_bill::{BillFilter, RideBill, RideBillRepository};
use crate::domain::ride_route::{RideRoute, RideRouteRepository};
use crate::domain::user::{GetUserDto, User, UserRepository, UserRole};
use crate::domain::{DomainError, DomainResult};
use crate::shared::{paginate_vec, PaginatedResult};

// ── Users ───────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryUserRepository {
    users: DashMap<String, User>,
}

impl MemoryUserRepository {
    fn email_taken(&self, email: &str, except_id: &str) -> bool {
        self.users
            .iter()
            .any(|u| u.email == email && u.id != except_id)
    }

    fn sorted(&self, mut users: Vec<User>) -> Vec<User> {
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        users
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        Ok(self.users.get(id).map(|u| u.clone()))
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.clone()))
    }

    async fn find_by_reset_token(&self, token: &str) -> DomainResult<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.reset.token.as_deref() == Some(token))
            .map(|u| u.clone()))
    }

    async fn find_by_role(&self, role: UserRole) -> DomainResult<Vec<User>> {
        let users = self
            .users
            .iter()
            .filter(|u| u.role == role)
            .map(|u| u.clone())
            .collect();
        Ok(self.sorted(users))
    }

    async fn find_all(&self) -> DomainResult<Vec<User>> {
        let users = self.users.iter().map(|u| u.clone()).collect();
        Ok(self.sorted(users))
    }

    async fn list(&self, query: GetUserDto) -> DomainResult<PaginatedResult<User>> {
        let mut users: Vec<User> = self
            .users
            .iter()
            .filter(|u| query.matches(u))
            .map(|u| u.clone())
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate_vec(users, query.page, query.limit))
    }

    async fn count(&self) -> DomainResult<u64> {
        Ok(self.users.len() as u64)
    }

    async fn save(&self, user: User) -> DomainResult<User> {
        if self.email_taken(&user.email, &user.id) || self.users.contains_key(&user.id) {
            return Err(DomainError::Conflict("Email already exists".to_string()));
        }
        self.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> DomainResult<()> {
        if !self.users.contains_key(&user.id) {
            return Err(DomainError::not_found("User", "id", user.id));
        }
        if self.email_taken(&user.email, &user.id) {
            return Err(DomainError::Conflict("Email already exists".to_string()));
        }
        self.users.insert(user.id.clone(), user);
        Ok(())
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        self.users
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("User", "id", id))
    }
}

// ── Ride routes ─────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryRideRouteRepository {
    routes: DashMap<String, RideRoute>,
}

impl MemoryRideRouteRepository {
    fn pair_taken(&self, route: &RideRoute) -> bool {
        self.routes.iter().any(|r| {
            r.from_location == route.from_location
                && r.to_location == route.to_location
                && r.id != route.id
        })
    }
}

#[async_trait]
impl RideRouteRepository for MemoryRideRouteRepository {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<RideRoute>> {
        Ok(self.routes.get(id).map(|r| r.clone()))
    }

    async fn find_by_pair(&self, from: &str, to: &str) -> DomainResult<Option<RideRoute>> {
        Ok(self
            .routes
            .iter()
            .find(|r| r.from_location == from && r.to_location == to)
            .map(|r| r.clone()))
    }

    async fn find_all(&self) -> DomainResult<Vec<RideRoute>> {
        let mut routes: Vec<RideRoute> = self.routes.iter().map(|r| r.clone()).collect();
        routes.sort_by(|a, b| {
            (&a.from_location, &a.to_location).cmp(&(&b.from_location, &b.to_location))
        });
        Ok(routes)
    }

    async fn count(&self) -> DomainResult<u64> {
        Ok(self.routes.len() as u64)
    }

    async fn save(&self, route: RideRoute) -> DomainResult<RideRoute> {
        if self.pair_taken(&route) {
            return Err(route.duplicate_error());
        }
        self.routes.insert(route.id.clone(), route.clone());
        Ok(route)
    }

    async fn update(&self, route: RideRoute) -> DomainResult<()> {
        if !self.routes.contains_key(&route.id) {
            return Err(DomainError::not_found("Route", "id", route.id));
        }
        if self.pair_taken(&route) {
            return Err(route.duplicate_error());
        }
        self.routes.insert(route.id.clone(), route);
        Ok(())
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        self.routes
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("Route", "id", id))
    }
}

// ── Ride bills ──────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryRideBillRepository {
    bills: DashMap<String, RideBill>,
}

#[async_trait]
impl RideBillRepository for MemoryRideBillRepository {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<RideBill>> {
        Ok(self.bills.get(id).map(|b| b.clone()))
    }

    async fn find_by_ride_id(&self, ride_id: &str) -> DomainResult<Option<RideBill>> {
        Ok(self
            .bills
            .iter()
            .find(|b| b.ride_id == ride_id)
            .map(|b| b.clone()))
    }

    async fn find_all(&self) -> DomainResult<Vec<RideBill>> {
        let mut bills: Vec<RideBill> = self.bills.iter().map(|b| b.clone()).collect();
        bills.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(bills)
    }

    async fn list(&self, filter: BillFilter) -> DomainResult<PaginatedResult<RideBill>> {
        let mut bills: Vec<RideBill> = self
            .bills
            .iter()
            .filter(|b| filter.matches(b))
            .map(|b| b.clone())
            .collect();
        bills.sort_by(|a, b| (b.date, &b.time).cmp(&(a.date, &a.time)));
        Ok(paginate_vec(bills, filter.page, filter.limit))
    }

    async fn count(&self) -> DomainResult<u64> {
        Ok(self.bills.len() as u64)
    }

    async fn save(&self, bill: RideBill) -> DomainResult<RideBill> {
        if self.bills.iter().any(|b| b.ride_id == bill.ride_id) {
            return Err(DomainError::Conflict(format!(
                "Ride bill {} already exists",
                bill.ride_id
            )));
        }
        self.bills.insert(bill.id.clone(), bill.clone());
        Ok(bill)
    }

    async fn update(&self, bill: RideBill) -> DomainResult<()> {
        if !self.bills.contains_key(&bill.id) {
            return Err(DomainError::not_found("Ride bill", "id", bill.id));
        }
        self.bills.insert(bill.id.clone(), bill);
        Ok(())
    }
}

// ── Backup settings ─────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryBackupSettingsRepository {
    settings: RwLock<Option<BackupSettings>>,
}

#[async_trait]
impl BackupSettingsRepository for MemoryBackupSettingsRepository {
    async fn load(&self) -> DomainResult<BackupSettings> {
        Ok(self.settings.read().await.clone().unwrap_or_default())
    }

    async fn store(&self, settings: &BackupSettings) -> DomainResult<()> {
        *self.settings.write().await = Some(settings.clone());
        Ok(())
    }
}

// ── Provider ────────────────────────────────────────────────────

/// Repository provider that keeps everything in process memory.
#[derive(Default)]
pub struct InMemoryRepositoryProvider {
    users: MemoryUserRepository,
    ride_routes: MemoryRideRouteRepository,
    ride_bills: MemoryRideBillRepository,
    backup_settings: MemoryBackupSettingsRepository,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RepositoryProvider for InMemoryRepositoryProvider {
    fn users(&self) -> &dyn UserRepository {
        &self.users
    }

    fn ride_routes(&self) -> &dyn RideRouteRepository {
        &self.ride_routes
    }

    fn ride_bills(&self) -> &dyn RideBillRepository {
        &self.ride_bills
    }

    fn backup_settings(&self) -> &dyn BackupSettingsRepository {
        &self.backup_settings
    }
}
