//! Data management API handlers
//!
//! Backups, export / import and housekeeping. Mounted behind `require_admin`.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};

use super::dto::{
    BackupEntryDto, BackupResultDto, BackupSettingsDto, CacheClearDto, ClearHistoryDto,
    DeletedBackupDto, ImportResultDto, ScheduleParams, ScheduleResultDto,
    UpdateBackupSettingsRequest,
};
use crate::application::data_management::DataManagementService;
use crate::interfaces::http::common::{ApiError, ApiResponse, ValidatedJson};

/// Largest accepted import upload.
pub const MAX_IMPORT_BYTES: usize = 50 * 1024 * 1024;

#[derive(Clone)]
pub struct DataHandlerState {
    pub data: Arc<DataManagementService>,
}

#[utoipa::path(
    post,
    path = "/api/v1/data-management/backup",
    tag = "Data Management",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Backup written", body = ApiResponse<BackupResultDto>),
        (status = 403, description = "Admin only"),
        (status = 500, description = "Backup creation failed")
    )
)]
pub async fn create_backup(
    State(state): State<DataHandlerState>,
) -> Result<Json<ApiResponse<BackupResultDto>>, ApiError> {
    let outcome = state.data.create_backup().await?;
    Ok(Json(ApiResponse::success(outcome.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/data-management/backup/schedule",
    tag = "Data Management",
    security(("bearer_auth" = [])),
    params(ScheduleParams),
    responses(
        (status = 200, description = "Scheduled backup evaluated", body = ApiResponse<ScheduleResultDto>)
    )
)]
pub async fn schedule_backup(
    State(state): State<DataHandlerState>,
    Query(params): Query<ScheduleParams>,
) -> Result<Json<ApiResponse<ScheduleResultDto>>, ApiError> {
    let outcome = state.data.schedule_backup(params.force).await?;
    Ok(Json(ApiResponse::success(outcome.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/data-management/export",
    tag = "Data Management",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Export document as a JSON attachment", content_type = "application/json"),
        (status = 500, description = "Failed to export data")
    )
)]
pub async fn export_data(
    State(state): State<DataHandlerState>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = state.data.export_all_data().await?;
    let filename = format!(
        "transport-export-{}.json",
        payload.export_date.format("%Y-%m-%dT%H-%M-%S")
    );
    let disposition = format!("attachment; filename=\"{filename}\"");
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Json(payload),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/data-management/import",
    tag = "Data Management",
    security(("bearer_auth" = [])),
    request_body(content_type = "multipart/form-data", description = "Export document in the `file` field"),
    responses(
        (status = 200, description = "Import summary", body = ApiResponse<ImportResultDto>),
        (status = 400, description = "Missing file, not JSON, or invalid import file format")
    )
)]
pub async fn import_data(
    State(state): State<DataHandlerState>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ImportResultDto>>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let is_json = field
            .file_name()
            .map(|name| name.to_ascii_lowercase().ends_with(".json"))
            .unwrap_or(false);
        if !is_json {
            return Err(ApiError::bad_request("Only JSON files are allowed"));
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        let outcome = state.data.import_data(&data).await?;
        return Ok(Json(ApiResponse::success(outcome.into())));
    }
    Err(ApiError::bad_request("No file uploaded"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/data-management/cache",
    tag = "Data Management",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Cache directories processed", body = ApiResponse<CacheClearDto>)
    )
)]
pub async fn clear_cache(
    State(state): State<DataHandlerState>,
) -> Result<Json<ApiResponse<CacheClearDto>>, ApiError> {
    let actions = state.data.clear_cache().await?;
    Ok(Json(ApiResponse::success(CacheClearDto { actions })))
}

#[utoipa::path(
    get,
    path = "/api/v1/data-management/backup/history",
    tag = "Data Management",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Most recent backups, newest first", body = ApiResponse<Vec<BackupEntryDto>>)
    )
)]
pub async fn backup_history(
    State(state): State<DataHandlerState>,
) -> Result<Json<ApiResponse<Vec<BackupEntryDto>>>, ApiError> {
    let entries = state.data.backup_history().await?;
    Ok(Json(ApiResponse::success(
        entries.into_iter().map(BackupEntryDto::from).collect(),
    )))
}

#[utoipa::path(
    delete,
    path = "/api/v1/data-management/backup/history/{filename}",
    tag = "Data Management",
    security(("bearer_auth" = [])),
    params(("filename" = String, Path, description = "Backup file name")),
    responses(
        (status = 200, description = "Backup deleted", body = ApiResponse<DeletedBackupDto>),
        (status = 400, description = "Invalid backup filename"),
        (status = 404, description = "Backup not found")
    )
)]
pub async fn delete_backup(
    State(state): State<DataHandlerState>,
    Path(filename): Path<String>,
) -> Result<Json<ApiResponse<DeletedBackupDto>>, ApiError> {
    let freed_bytes = state.data.delete_backup(&filename).await?;
    Ok(Json(ApiResponse::success(DeletedBackupDto {
        filename,
        freed_bytes,
    })))
}

#[utoipa::path(
    delete,
    path = "/api/v1/data-management/backup/history",
    tag = "Data Management",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All backups removed", body = ApiResponse<ClearHistoryDto>)
    )
)]
pub async fn clear_backup_history(
    State(state): State<DataHandlerState>,
) -> Result<Json<ApiResponse<ClearHistoryDto>>, ApiError> {
    let outcome = state.data.clear_backup_history().await?;
    Ok(Json(ApiResponse::success(outcome.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/data-management/backup/settings",
    tag = "Data Management",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current backup settings", body = ApiResponse<BackupSettingsDto>)
    )
)]
pub async fn get_backup_settings(
    State(state): State<DataHandlerState>,
) -> Result<Json<ApiResponse<BackupSettingsDto>>, ApiError> {
    let view = state.data.backup_settings().await?;
    Ok(Json(ApiResponse::success(view.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/data-management/backup/settings",
    tag = "Data Management",
    security(("bearer_auth" = [])),
    request_body = UpdateBackupSettingsRequest,
    responses(
        (status = 200, description = "Settings updated", body = ApiResponse<BackupSettingsDto>),
        (status = 400, description = "Interval or retention out of range"),
        (status = 422, description = "Body is not a settings object")
    )
)]
pub async fn update_backup_settings(
    State(state): State<DataHandlerState>,
    ValidatedJson(request): ValidatedJson<UpdateBackupSettingsRequest>,
) -> Result<Json<ApiResponse<BackupSettingsDto>>, ApiError> {
    let view = state.data.update_backup_settings(request.into()).await?;
    Ok(Json(ApiResponse::success(view.into())))
}
