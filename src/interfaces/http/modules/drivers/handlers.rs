//! Driver QR handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use super::dto::{DriverQrCodeDto, DriverVerificationDto};
use crate::application::drivers::DriverQrService;
use crate::interfaces::http::common::{ApiError, ApiResponse};

#[derive(Clone)]
pub struct DriverHandlerState {
    pub drivers: Arc<DriverQrService>,
}

#[utoipa::path(
    get,
    path = "/api/v1/drivers/{id}/qr-code",
    tag = "Drivers",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Driver user ID")),
    responses(
        (status = 200, description = "Stored QR code, generated when missing", body = ApiResponse<DriverQrCodeDto>),
        (status = 404, description = "Driver not found")
    )
)]
pub async fn get_qr_code(
    State(state): State<DriverHandlerState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DriverQrCodeDto>>, ApiError> {
    let qr = state.drivers.ensure_qr_code(&id).await?;
    Ok(Json(ApiResponse::success(qr.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/drivers/{id}/qr-code",
    tag = "Drivers",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Driver user ID")),
    responses(
        (status = 200, description = "QR code regenerated", body = ApiResponse<DriverQrCodeDto>),
        (status = 404, description = "Driver not found")
    )
)]
pub async fn regenerate_qr_code(
    State(state): State<DriverHandlerState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DriverQrCodeDto>>, ApiError> {
    let qr = state.drivers.generate_qr_code(&id).await?;
    Ok(Json(ApiResponse::success(qr.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/drivers/verify/{id}",
    tag = "Drivers",
    params(("id" = String, Path, description = "Driver user ID")),
    responses(
        (status = 200, description = "Public driver details", body = ApiResponse<DriverVerificationDto>),
        (status = 404, description = "Driver not found")
    )
)]
pub async fn verify_driver(
    State(state): State<DriverHandlerState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DriverVerificationDto>>, ApiError> {
    let driver = state.drivers.verify_driver(&id).await?;
    Ok(Json(ApiResponse::success(driver.into())))
}
