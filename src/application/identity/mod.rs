//! Identity module: authentication, password reset and user administration
//!
//! HTTP handlers stay thin and delegate to the services here.

pub mod auth;
pub mod expiry;
pub mod password_reset;
pub mod users;

pub use auth::{AuthResult, AuthService};
pub use expiry::{refresh_student_expiry, start_student_expiry_task, DAILY_SECS};
pub use password_reset::{ForgotPasswordOutcome, PasswordResetService};
pub use users::UserService;

use crate::domain::{DomainError, DomainResult};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_PASSWORD_LEN: usize = 128;

pub(crate) fn check_new_password(password: &str) -> DomainResult<()> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(DomainError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(DomainError::Validation(format!(
            "Password must be at most {} characters",
            MAX_PASSWORD_LEN
        )));
    }
    Ok(())
}

pub(crate) fn hash_new_password(password: &str) -> DomainResult<String> {
    check_new_password(password)?;
    crate::infrastructure::crypto::hash_password(password)
        .map_err(|e| DomainError::operation("Failed to hash password", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_length_bounds() {
        assert!(check_new_password("12345").is_err());
        assert!(check_new_password("123456").is_ok());
        assert!(check_new_password(&"x".repeat(128)).is_ok());
        assert!(check_new_password(&"x".repeat(129)).is_err());
    }
}
