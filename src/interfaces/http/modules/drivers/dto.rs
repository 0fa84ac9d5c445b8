use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::application::drivers::{DriverQrCode, DriverVerification};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DriverQrCodeDto {
    pub driver_id: String,
    /// `data:image/png;base64,...`
    pub qr_code: String,
    pub verification_url: String,
}

impl From<DriverQrCode> for DriverQrCodeDto {
    fn from(qr: DriverQrCode) -> Self {
        Self {
            driver_id: qr.driver_id,
            qr_code: qr.qr_code,
            verification_url: qr.verification_url,
        }
    }
}

/// Public driver card shown after scanning a QR code
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DriverVerificationDto {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub profile_photo: Option<String>,
    pub is_active: bool,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<DriverVerification> for DriverVerificationDto {
    fn from(v: DriverVerification) -> Self {
        Self {
            id: v.id,
            name: v.name,
            email: v.email,
            phone: v.phone,
            profile_photo: v.profile_photo,
            is_active: v.is_active,
            role: v.role.as_str().to_string(),
            created_at: v.created_at,
        }
    }
}
