//! User DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::domain::user::{CreateUserDto, UpdateUserDto};
use crate::domain::{DomainResult, StudentProfile, User, UserRole};

/// User API representation. Credentials and reset state never leave the server.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub is_active: bool,
    pub phone: Option<String>,
    pub entry_number: Option<String>,
    pub programme: Option<String>,
    pub department: Option<String>,
    pub hostel: Option<String>,
    pub emergency_contact: Option<String>,
    pub disability_info: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub is_expired: bool,
    pub has_profile_photo: bool,
    /// PNG data URL, drivers only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        Self {
            role: u.role.as_str().to_string(),
            has_profile_photo: u.profile_photo.is_some(),
            id: u.id,
            email: u.email,
            name: u.name,
            is_active: u.is_active,
            phone: u.phone,
            entry_number: u.student.entry_number,
            programme: u.student.programme,
            department: u.student.department,
            hostel: u.student.hostel,
            emergency_contact: u.student.emergency_contact,
            disability_info: u.student.disability_info,
            expiry_date: u.student.expiry_date,
            is_expired: u.is_expired,
            qr_code: u.qr_code,
            created_at: u.created_at,
            updated_at: u.updated_at,
            last_login_at: u.last_login_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
    #[validate(length(min = 6, max = 128, message = "password must be 6-128 characters"))]
    pub password: String,
    /// admin, staff, student or driver
    pub role: String,
    pub phone: Option<String>,
    pub entry_number: Option<String>,
    pub programme: Option<String>,
    pub department: Option<String>,
    pub hostel: Option<String>,
    pub emergency_contact: Option<String>,
    pub disability_info: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
}

impl CreateUserRequest {
    pub fn into_dto(self) -> DomainResult<CreateUserDto> {
        Ok(CreateUserDto {
            role: UserRole::parse(&self.role)?,
            email: self.email,
            name: self.name,
            password: self.password,
            phone: self.phone,
            student: StudentProfile {
                entry_number: self.entry_number,
                programme: self.programme,
                department: self.department,
                hostel: self.hostel,
                emergency_contact: self.emergency_contact,
                disability_info: self.disability_info,
                expiry_date: self.expiry_date,
            },
        })
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(email(message = "invalid email format"))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
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

impl From<UpdateUserRequest> for UpdateUserDto {
    fn from(r: UpdateUserRequest) -> Self {
        Self {
            email: r.email,
            name: r.name,
            phone: r.phone,
            entry_number: r.entry_number,
            programme: r.programme,
            department: r.department,
            hostel: r.hostel,
            emergency_contact: r.emergency_contact,
            disability_info: r.disability_info,
            expiry_date: r.expiry_date,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangeRoleRequest {
    /// admin, staff, student or driver
    #[validate(length(min = 1, message = "role is required"))]
    pub role: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersParams {
    /// Case-insensitive match on name or email
    pub search: Option<String>,
    /// admin, staff, student or driver
    pub role: Option<String>,
    pub is_active: Option<bool>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}
