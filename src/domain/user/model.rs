//! User domain entity

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::reset::PasswordReset;
use crate::domain::{DomainError, DomainResult};

/// Account role. Every role-dependent rule goes through the helpers below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserRole {
    Admin,
    Staff,
    Student,
    Driver,
}

impl UserRole {
    pub const ALL: [UserRole; 4] = [Self::Admin, Self::Staff, Self::Student, Self::Driver];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Staff => "staff",
            Self::Student => "student",
            Self::Driver => "driver",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "staff" => Ok(Self::Staff),
            "student" => Ok(Self::Student),
            "driver" => Ok(Self::Driver),
            other => Err(DomainError::Validation(format!(
                "Invalid role '{}': expected one of admin, staff, student, driver",
                other
            ))),
        }
    }

    /// Admin and staff run the back office.
    pub fn can_manage_users(&self) -> bool {
        match self {
            Self::Admin | Self::Staff => true,
            Self::Student | Self::Driver => false,
        }
    }

    /// Backups, exports and imports are admin only.
    pub fn can_manage_data(&self) -> bool {
        match self {
            Self::Admin => true,
            Self::Staff | Self::Student | Self::Driver => false,
        }
    }

    pub fn carries_qr_code(&self) -> bool {
        match self {
            Self::Driver => true,
            Self::Admin | Self::Staff | Self::Student => false,
        }
    }

    pub fn tracks_expiry(&self) -> bool {
        match self {
            Self::Student => true,
            Self::Admin | Self::Staff | Self::Driver => false,
        }
    }
}

impl Default for UserRole {
    fn default() -> Self {
        Self::Student
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uploaded profile picture, kept inline on the user record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilePhoto {
    pub data: Vec<u8>,
    pub content_type: String,
    pub size: i64,
}

impl ProfilePhoto {
    pub const MAX_BYTES: usize = 5 * 1024 * 1024;

    pub fn new(data: Vec<u8>, content_type: impl Into<String>) -> DomainResult<Self> {
        let content_type = content_type.into();
        if !content_type.starts_with("image/") {
            return Err(DomainError::Validation(
                "Only image files are allowed".to_string(),
            ));
        }
        if data.is_empty() {
            return Err(DomainError::Validation("Photo file is empty".to_string()));
        }
        if data.len() > Self::MAX_BYTES {
            return Err(DomainError::Validation(
                "Photo exceeds the 5 MB limit".to_string(),
            ));
        }
        Ok(Self {
            size: data.len() as i64,
            data,
            content_type,
        })
    }
}

/// Student-only profile fields. Empty for every other role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentProfile {
    pub entry_number: Option<String>,
    pub programme: Option<String>,
    pub department: Option<String>,
    pub hostel: Option<String>,
    pub emergency_contact: Option<String>,
    pub disability_info: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    /// Stored trimmed and lower-cased.
    pub email: String,
    /// bcrypt hash. `None` for imported accounts until they reset.
    pub password_hash: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub name: String,
    pub phone: Option<String>,
    pub profile_photo: Option<ProfilePhoto>,
    pub student: StudentProfile,
    pub is_expired: bool,
    /// PNG data URL, drivers only.
    pub qr_code: Option<String>,
    pub reset: PasswordReset,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(email: &str, name: impl Into<String>, role: UserRole) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            email: crate::shared::normalize_email(email),
            password_hash: None,
            role,
            is_active: true,
            name: name.into(),
            phone: None,
            profile_photo: None,
            student: StudentProfile::default(),
            is_expired: false,
            qr_code: None,
            reset: PasswordReset::default(),
            created_at: now,
            updated_at: now,
            last_login_at: None,
        }
    }

    /// Whether the account counts as expired at `now`. Only students expire.
    pub fn expired_at(&self, now: DateTime<Utc>) -> bool {
        self.role.tracks_expiry()
            && self
                .student
                .expiry_date
                .map(|expiry| expiry < now)
                .unwrap_or(false)
    }

    /// Recompute `is_expired`; returns true when the flag changed.
    pub fn refresh_expiry(&mut self, now: DateTime<Utc>) -> bool {
        let expired = self.expired_at(now);
        let changed = expired != self.is_expired;
        self.is_expired = expired;
        changed
    }

    /// Switch role, dropping data that only belongs to the old role.
    pub fn change_role(&mut self, role: UserRole) {
        if !role.carries_qr_code() {
            self.qr_code = None;
        }
        if !role.tracks_expiry() {
            self.is_expired = false;
        }
        self.role = role;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn role_parse_is_case_insensitive() {
        assert_eq!(UserRole::parse("Driver").unwrap(), UserRole::Driver);
        assert!(UserRole::parse("operator").is_err());
        for role in UserRole::ALL {
            assert_eq!(UserRole::parse(role.as_str()).unwrap(), role);
        }
    }

    #[test]
    fn only_students_expire() {
        let now = Utc::now();
        let mut student = User::new("s@campus.edu", "S", UserRole::Student);
        student.student.expiry_date = Some(now - Duration::days(1));
        assert!(student.refresh_expiry(now));
        assert!(student.is_expired);

        let mut driver = User::new("d@campus.edu", "D", UserRole::Driver);
        driver.student.expiry_date = Some(now - Duration::days(1));
        assert!(!driver.refresh_expiry(now));
        assert!(!driver.is_expired);
    }

    #[test]
    fn leaving_driver_role_clears_qr_code() {
        let mut user = User::new("d@campus.edu", "D", UserRole::Driver);
        user.qr_code = Some("data:image/png;base64,AAAA".into());
        user.change_role(UserRole::Staff);
        assert!(user.qr_code.is_none());
        assert_eq!(user.role, UserRole::Staff);
    }

    #[test]
    fn new_user_email_is_normalized() {
        let user = User::new(" Jane@Campus.EDU ", "Jane", UserRole::Staff);
        assert_eq!(user.email, "jane@campus.edu");
    }

    #[test]
    fn photo_rejects_non_images_and_oversize() {
        assert!(ProfilePhoto::new(vec![1, 2, 3], "application/pdf").is_err());
        assert!(ProfilePhoto::new(vec![0; ProfilePhoto::MAX_BYTES + 1], "image/png").is_err());
        let photo = ProfilePhoto::new(vec![1, 2, 3], "image/jpeg").unwrap();
        assert_eq!(photo.size, 3);
    }
}
