//! JSON document shapes for backup files and export payloads
//!
//! Keys are camelCase and every record carries its id as `_id`, matching
//! files produced by earlier versions of the service. Exported users use
//! `UserProfileDocument`, which has no credential fields at all; only backup
//! files use `UserDocument`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ride_bill::RideStatus;
use crate::domain::{
    DomainError, DomainResult, ProfilePhoto, RideBill, RideRoute, StudentProfile, User, UserRole,
};
use crate::shared::{is_valid_email, normalize_email};

pub const EXPORT_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionCounts {
    pub users: u64,
    pub ride_locations: u64,
    pub ride_bills: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionData<U> {
    pub users: Vec<U>,
    pub ride_locations: Vec<RideRouteDocument>,
    pub ride_bills: Vec<RideBillDocument>,
}

impl<U> CollectionData<U> {
    pub fn counts(&self) -> CollectionCounts {
        CollectionCounts {
            users: self.users.len() as u64,
            ride_locations: self.ride_locations.len() as u64,
            ride_bills: self.ride_bills.len() as u64,
        }
    }
}

/// On-disk backup snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupFile {
    pub timestamp: DateTime<Utc>,
    pub collections: CollectionCounts,
    pub data: CollectionData<UserDocument>,
}

/// Leading fields of a backup file, enough for the history listing.
#[derive(Debug, Deserialize)]
pub struct BackupHeader {
    pub collections: CollectionCounts,
}

/// Download payload of `exportAllData`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    pub export_date: DateTime<Utc>,
    pub version: String,
    pub data: CollectionData<UserProfileDocument>,
    pub stats: CollectionCounts,
}

// ── Users ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoDocument {
    /// Base64 image bytes
    pub data: String,
    pub content_type: String,
    pub size: i64,
}

fn default_true() -> bool {
    true
}

/// User record without any credential or reset secret.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileDocument {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub email: String,
    pub name: String,
    pub role: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub profile_photo: Option<PhotoDocument>,
    #[serde(default)]
    pub entry_number: Option<String>,
    #[serde(default)]
    pub programme: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub hostel: Option<String>,
    #[serde(default)]
    pub emergency_contact: Option<String>,
    #[serde(default)]
    pub disability_info: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_expired: bool,
    #[serde(default)]
    pub qr_code: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Full user record as written to backup files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    #[serde(flatten)]
    pub profile: UserProfileDocument,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_password_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_password_expires: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_password_otp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_password_otp_expires: Option<DateTime<Utc>>,
}

impl From<&User> for UserProfileDocument {
    fn from(u: &User) -> Self {
        Self {
            id: Some(u.id.clone()),
            email: u.email.clone(),
            name: u.name.clone(),
            role: u.role.as_str().to_string(),
            is_active: u.is_active,
            phone: u.phone.clone(),
            profile_photo: u.profile_photo.as_ref().map(|p| PhotoDocument {
                data: STANDARD.encode(&p.data),
                content_type: p.content_type.clone(),
                size: p.size,
            }),
            entry_number: u.student.entry_number.clone(),
            programme: u.student.programme.clone(),
            department: u.student.department.clone(),
            hostel: u.student.hostel.clone(),
            emergency_contact: u.student.emergency_contact.clone(),
            disability_info: u.student.disability_info.clone(),
            expiry_date: u.student.expiry_date,
            is_expired: u.expired_at(Utc::now()),
            qr_code: u.qr_code.clone(),
            created_at: Some(u.created_at),
            updated_at: Some(u.updated_at),
            last_login_at: u.last_login_at,
        }
    }
}

impl From<&User> for UserDocument {
    fn from(u: &User) -> Self {
        Self {
            profile: UserProfileDocument::from(u),
            password: u.password_hash.clone(),
            reset_password_token: u.reset.token.clone(),
            reset_password_expires: u.reset.token_expires,
            reset_password_otp: u.reset.otp.clone(),
            reset_password_otp_expires: u.reset.otp_expires,
        }
    }
}

impl UserProfileDocument {
    /// Build a brand-new user from an imported record: fresh id, no password,
    /// no QR code (it pointed at the old id and is regenerated on demand).
    pub fn into_new_user(self) -> DomainResult<User> {
        let email = normalize_email(&self.email);
        if !is_valid_email(&email) {
            return Err(DomainError::Validation(format!(
                "Invalid email '{}'",
                self.email
            )));
        }
        if self.name.trim().is_empty() {
            return Err(DomainError::Validation("Name is required".to_string()));
        }
        let role = UserRole::parse(&self.role)?;

        let profile_photo = match self.profile_photo {
            Some(photo) => {
                let data = STANDARD.decode(photo.data.as_bytes()).map_err(|e| {
                    DomainError::Validation(format!("Invalid profile photo data: {}", e))
                })?;
                Some(ProfilePhoto::new(data, photo.content_type)?)
            }
            None => None,
        };

        let mut user = User::new(&email, self.name.trim(), role);
        user.is_active = self.is_active;
        user.phone = self.phone;
        user.profile_photo = profile_photo;
        user.student = StudentProfile {
            entry_number: self.entry_number,
            programme: self.programme,
            department: self.department,
            hostel: self.hostel,
            emergency_contact: self.emergency_contact,
            disability_info: self.disability_info,
            expiry_date: self.expiry_date,
        };
        if let Some(created_at) = self.created_at {
            user.created_at = created_at;
        }
        user.refresh_expiry(Utc::now());
        Ok(user)
    }
}

// ── Ride routes ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideRouteDocument {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub from_location: String,
    pub to_location: String,
    pub fare: f64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&RideRoute> for RideRouteDocument {
    fn from(r: &RideRoute) -> Self {
        Self {
            id: Some(r.id.clone()),
            from_location: r.from_location.clone(),
            to_location: r.to_location.clone(),
            fare: r.fare,
            created_at: Some(r.created_at),
            updated_at: Some(r.updated_at),
        }
    }
}

impl RideRouteDocument {
    pub fn into_new_route(self) -> DomainResult<RideRoute> {
        let mut route = RideRoute::new(self.from_location, self.to_location, self.fare)?;
        if let Some(created_at) = self.created_at {
            route.created_at = created_at;
        }
        Ok(route)
    }
}

// ── Ride bills ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideBillDocument {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub ride_id: String,
    pub student_id: String,
    pub student_name: String,
    #[serde(default)]
    pub entry_number: Option<String>,
    pub driver_id: String,
    pub driver_name: String,
    pub location: String,
    pub fare: f64,
    pub date: DateTime<Utc>,
    pub time: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_status() -> String {
    RideStatus::default().as_str().to_string()
}

impl From<&RideBill> for RideBillDocument {
    fn from(b: &RideBill) -> Self {
        Self {
            id: Some(b.id.clone()),
            ride_id: b.ride_id.clone(),
            student_id: b.student_id.clone(),
            student_name: b.student_name.clone(),
            entry_number: b.entry_number.clone(),
            driver_id: b.driver_id.clone(),
            driver_name: b.driver_name.clone(),
            location: b.location.clone(),
            fare: b.fare,
            date: b.date,
            time: b.time.clone(),
            status: b.status.as_str().to_string(),
            notes: b.notes.clone(),
            created_at: Some(b.created_at),
            updated_at: Some(b.updated_at),
        }
    }
}

impl RideBillDocument {
    pub fn into_new_bill(self) -> DomainResult<RideBill> {
        let now = Utc::now();
        let bill = RideBill {
            id: RideBill::fresh_id(),
            ride_id: self.ride_id,
            student_id: self.student_id,
            student_name: self.student_name,
            entry_number: self.entry_number,
            driver_id: self.driver_id,
            driver_name: self.driver_name,
            location: self.location,
            fare: self.fare,
            date: self.date,
            time: self.time,
            status: RideStatus::parse(&self.status)?,
            notes: self.notes,
            created_at: self.created_at.unwrap_or(now),
            updated_at: now,
        };
        bill.validate()?;
        Ok(bill)
    }
}
