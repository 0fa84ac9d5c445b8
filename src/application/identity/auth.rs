//! Login, self-service profile and password change

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::hash_new_password;
use crate::domain::{DomainError, DomainResult, RepositoryProvider, User};
use crate::infrastructure::crypto::{create_token, verify_password, JwtConfig};
use crate::shared::normalize_email;

/// Authentication result returned after a successful login
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: User,
}

pub struct AuthService {
    repos: Arc<dyn RepositoryProvider>,
    jwt_config: JwtConfig,
}

impl AuthService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, jwt_config: JwtConfig) -> Self {
        Self { repos, jwt_config }
    }

    pub fn jwt_config(&self) -> &JwtConfig {
        &self.jwt_config
    }

    /// Authenticate by email + password and return a JWT.
    pub async fn login(&self, email: &str, password: &str) -> DomainResult<AuthResult> {
        let email = normalize_email(email);
        let Some(mut user) = self.repos.users().find_by_email(&email).await? else {
            warn!(%email, "Login failed: unknown email");
            return Err(DomainError::Unauthorized("Email not found".into()));
        };

        let Some(hash) = user.password_hash.as_deref() else {
            return Err(DomainError::Unauthorized("Password not set".into()));
        };
        if !verify_password(password, hash).unwrap_or(false) {
            warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(DomainError::Unauthorized("Wrong password".into()));
        }
        if !user.is_active {
            return Err(DomainError::Unauthorized("Account is disabled".into()));
        }

        let token = create_token(&user.id, &user.email, user.role, &self.jwt_config)
            .map_err(|e| DomainError::operation("Failed to create token", e))?;

        let now = Utc::now();
        user.last_login_at = Some(now);
        user.refresh_expiry(now);
        self.repos.users().update(user.clone()).await?;

        metrics::counter!("logins_total", "role" => user.role.as_str()).increment(1);
        info!(user_id = %user.id, role = %user.role, "User logged in");

        Ok(AuthResult {
            token,
            token_type: "Bearer".into(),
            expires_in: self.jwt_config.expiration_hours * 3600,
            user,
        })
    }

    /// The authenticated user's own record.
    pub async fn me(&self, user_id: &str) -> DomainResult<User> {
        let mut user = self
            .repos
            .users()
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", "id", user_id))?;
        if user.refresh_expiry(Utc::now()) {
            self.repos.users().update(user.clone()).await?;
        }
        Ok(user)
    }

    /// Change a user's password. Verifies the current password first.
    pub async fn change_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> DomainResult<()> {
        let mut user = self
            .repos
            .users()
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", "id", user_id))?;

        let valid = user
            .password_hash
            .as_deref()
            .map(|hash| verify_password(current_password, hash).unwrap_or(false))
            .unwrap_or(false);
        if !valid {
            return Err(DomainError::Unauthorized(
                "Current password is incorrect".into(),
            ));
        }

        user.password_hash = Some(hash_new_password(new_password)?);
        user.touch();
        self.repos.users().update(user).await?;

        info!(user_id, "Password changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserRole;
    use crate::infrastructure::crypto::{hash_password, verify_token};
    use crate::infrastructure::InMemoryRepositoryProvider;

    async fn setup() -> (AuthService, Arc<InMemoryRepositoryProvider>, User) {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let mut user = User::new("Driver@Campus.edu", "Dee", UserRole::Driver);
        user.password_hash = Some(hash_password("secret1").unwrap());
        let user = repos.users().save(user).await.unwrap();
        let service = AuthService::new(repos.clone(), JwtConfig::new("test-secret", 2));
        (service, repos, user)
    }

    fn message(err: DomainError) -> String {
        err.to_string()
    }

    #[tokio::test]
    async fn login_issues_token_and_records_login_time() {
        let (service, repos, user) = setup().await;
        let result = service.login(" driver@campus.EDU", "secret1").await.unwrap();

        assert_eq!(result.token_type, "Bearer");
        assert_eq!(result.expires_in, 7200);
        let claims = verify_token(&result.token, service.jwt_config()).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.user_role(), Some(UserRole::Driver));

        let stored = repos.users().find_by_id(&user.id).await.unwrap().unwrap();
        assert!(stored.last_login_at.is_some());
    }

    #[tokio::test]
    async fn login_failures_carry_specific_messages() {
        let (service, repos, user) = setup().await;
        assert_eq!(
            message(service.login("nobody@campus.edu", "x").await.unwrap_err()),
            "Email not found"
        );
        assert_eq!(
            message(service.login("driver@campus.edu", "nope").await.unwrap_err()),
            "Wrong password"
        );

        let mut disabled = user.clone();
        disabled.is_active = false;
        repos.users().update(disabled).await.unwrap();
        assert_eq!(
            message(service.login("driver@campus.edu", "secret1").await.unwrap_err()),
            "Account is disabled"
        );

        let imported = User::new("imported@campus.edu", "Imp", UserRole::Student);
        repos.users().save(imported).await.unwrap();
        assert_eq!(
            message(service.login("imported@campus.edu", "anything").await.unwrap_err()),
            "Password not set"
        );
    }

    #[tokio::test]
    async fn change_password_requires_current_password() {
        let (service, _repos, user) = setup().await;
        assert!(matches!(
            service.change_password(&user.id, "wrong", "newsecret").await,
            Err(DomainError::Unauthorized(_))
        ));
        assert!(matches!(
            service.change_password(&user.id, "secret1", "123").await,
            Err(DomainError::Validation(_))
        ));

        service
            .change_password(&user.id, "secret1", "newsecret")
            .await
            .unwrap();
        assert!(service.login("driver@campus.edu", "newsecret").await.is_ok());
        assert!(service.login("driver@campus.edu", "secret1").await.is_err());
    }
}
