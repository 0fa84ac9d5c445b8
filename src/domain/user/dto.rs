use chrono::{DateTime, Utc};

use super::{StudentProfile, UserRole};

#[derive(Debug, Clone)]
pub struct CreateUserDto {
    pub email: String,
    pub name: String,
    pub password: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub student: StudentProfile,
}

/// Partial profile update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserDto {
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub entry_number: Option<String>,
    pub programme: Option<String>,
    pub department: Option<String>,
    pub hostel: Option<String>,
    pub emergency_contact: Option<String>,
    pub disability_info: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct GetUserDto {
    /// Case-insensitive match on name or email.
    pub search: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
    pub page: u32,
    pub limit: u32,
}

impl GetUserDto {
    pub fn matches(&self, user: &super::User) -> bool {
        if let Some(role) = self.role {
            if user.role != role {
                return false;
            }
        }
        if let Some(active) = self.is_active {
            if user.is_active != active {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                user.name.to_lowercase().contains(&term) || user.email.contains(&term)
            }
            _ => true,
        }
    }
}
