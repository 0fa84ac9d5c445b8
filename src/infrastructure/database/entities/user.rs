//! User entity for database

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum UserRole {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "staff")]
    Staff,
    #[sea_orm(string_value = "student")]
    Student,
    #[sea_orm(string_value = "driver")]
    Driver,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub name: String,
    pub phone: Option<String>,

    /// Profile photo bytes, mime type and size
    #[sea_orm(column_type = "Blob", nullable)]
    pub photo_data: Option<Vec<u8>>,
    pub photo_content_type: Option<String>,
    pub photo_size: Option<i64>,

    // Student profile
    pub entry_number: Option<String>,
    pub programme: Option<String>,
    pub department: Option<String>,
    pub hostel: Option<String>,
    pub emergency_contact: Option<String>,
    pub disability_info: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub is_expired: bool,

    /// Driver QR code as a PNG data URL
    #[sea_orm(column_type = "Text", nullable)]
    pub qr_code: Option<String>,

    // Password reset state
    pub reset_password_otp: Option<String>,
    pub reset_password_otp_expires: Option<DateTime<Utc>>,
    pub reset_password_token: Option<String>,
    pub reset_password_expires: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
