//! OTP password reset flow
//!
//! `forgot_password` issues a fresh OTP + reset token pair and mails the OTP,
//! `verify_otp` trades a valid OTP for the token, `reset_password` consumes
//! the token. The token lives for an hour, the OTP for ten minutes.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::hash_new_password;
use crate::application::notifications::{Notification, NotificationDispatcher};
use crate::domain::{DomainError, DomainResult, RepositoryProvider};
use crate::infrastructure::crypto::{generate_otp, generate_reset_token};
use crate::shared::normalize_email;

#[derive(Debug, Clone)]
pub struct ForgotPasswordOutcome {
    pub message: String,
    /// Only populated when token exposure is switched on for diagnostics.
    pub reset_token: Option<String>,
}

pub struct PasswordResetService {
    repos: Arc<dyn RepositoryProvider>,
    notifications: NotificationDispatcher,
    expose_reset_token: bool,
}

impl PasswordResetService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        notifications: NotificationDispatcher,
        expose_reset_token: bool,
    ) -> Self {
        Self {
            repos,
            notifications,
            expose_reset_token,
        }
    }

    pub async fn forgot_password(&self, email: &str) -> DomainResult<ForgotPasswordOutcome> {
        let email = normalize_email(email);
        let Some(mut user) = self.repos.users().find_by_email(&email).await? else {
            return Err(DomainError::not_found("Email", "email", email));
        };

        let otp = generate_otp();
        let token = generate_reset_token();
        user.reset.issue(otp.clone(), token.clone(), Utc::now());
        user.touch();
        self.repos.users().update(user.clone()).await?;

        let _ = self.notifications.dispatch(Notification::PasswordResetOtp {
            email: user.email.clone(),
            name: user.name.clone(),
            otp,
        });
        info!(user_id = %user.id, "Password reset requested");

        Ok(ForgotPasswordOutcome {
            message: "OTP sent to your email".to_string(),
            reset_token: self.expose_reset_token.then_some(token),
        })
    }

    /// Returns the reset token when `otp` is current for `email`.
    pub async fn verify_otp(&self, email: &str, otp: &str) -> DomainResult<String> {
        let invalid = || DomainError::Validation("Invalid or expired OTP".to_string());

        let email = normalize_email(email);
        let mut user = self
            .repos
            .users()
            .find_by_email(&email)
            .await?
            .ok_or_else(invalid)?;

        if !user.reset.otp_matches(otp.trim(), Utc::now()) {
            warn!(user_id = %user.id, "OTP verification failed");
            return Err(invalid());
        }
        let token = user.reset.verify_otp().ok_or_else(invalid)?;
        user.touch();
        self.repos.users().update(user).await?;

        Ok(token)
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> DomainResult<()> {
        let invalid = || DomainError::Validation("Invalid or expired reset token".to_string());

        let mut user = self
            .repos
            .users()
            .find_by_reset_token(token)
            .await?
            .ok_or_else(invalid)?;
        if !user.reset.token_valid(token, Utc::now()) {
            return Err(invalid());
        }

        user.password_hash = Some(hash_new_password(new_password)?);
        user.reset.clear();
        user.touch();
        let user_id = user.id.clone();
        self.repos.users().update(user).await?;

        info!(%user_id, "Password reset completed");
        Ok(())
    }
}
