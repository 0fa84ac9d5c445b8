//! Ride bill handlers. Students and drivers are scoped to their own rides.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};

use super::dto::{CreateRideBillRequest, ListRideBillsParams, RideBillDto, UpdateRideBillRequest};
use crate::application::rides::RideBillService;
use crate::domain::{BillFilter, RideStatus, UserRole};
use crate::interfaces::http::common::{ApiError, ApiResponse, PaginatedResponse, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;
use crate::shared::validate_pagination;

#[derive(Clone)]
pub struct RideBillHandlerState {
    pub bills: Arc<RideBillService>,
}

#[utoipa::path(
    get,
    path = "/api/v1/ride-bills",
    tag = "Ride Bills",
    security(("bearer_auth" = [])),
    params(ListRideBillsParams),
    responses((status = 200, description = "Bills visible to the caller", body = ApiResponse<PaginatedResponse<RideBillDto>>))
)]
pub async fn list_bills(
    State(state): State<RideBillHandlerState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Query(params): Query<ListRideBillsParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<RideBillDto>>>, ApiError> {
    let (page, limit) = validate_pagination(params.page, params.limit);
    let filter = BillFilter {
        status: params.status.as_deref().map(RideStatus::parse).transpose()?,
        student_id: params.student_id,
        driver_id: params.driver_id,
        page,
        limit,
    };
    let result = state
        .bills
        .list_bills(filter, &actor.user_id, actor.role)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::from_result(
        result,
        RideBillDto::from,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/ride-bills/{id}",
    tag = "Ride Bills",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Bill ID")),
    responses(
        (status = 200, description = "Bill", body = ApiResponse<RideBillDto>),
        (status = 404, description = "Not found or not visible to the caller")
    )
)]
pub async fn get_bill(
    State(state): State<RideBillHandlerState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<RideBillDto>>, ApiError> {
    let bill = state.bills.get_bill(&id, &actor.user_id, actor.role).await?;
    Ok(Json(ApiResponse::success(bill.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/ride-bills",
    tag = "Ride Bills",
    security(("bearer_auth" = [])),
    request_body = CreateRideBillRequest,
    responses(
        (status = 201, description = "Bill recorded", body = ApiResponse<RideBillDto>),
        (status = 400, description = "Invalid fare, time or missing fields"),
        (status = 403, description = "Students cannot record rides"),
        (status = 409, description = "Ride id already billed")
    )
)]
pub async fn create_bill(
    State(state): State<RideBillHandlerState>,
    Extension(actor): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<CreateRideBillRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RideBillDto>>), ApiError> {
    if actor.role == UserRole::Student {
        return Err(ApiError::forbidden("Insufficient permissions"));
    }
    let bill = state
        .bills
        .create_bill(request.into_dto()?, &actor.user_id, actor.role)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(bill.into()))))
}

#[utoipa::path(
    patch,
    path = "/api/v1/ride-bills/{id}",
    tag = "Ride Bills",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Bill ID")),
    request_body = UpdateRideBillRequest,
    responses(
        (status = 200, description = "Status / notes updated", body = ApiResponse<RideBillDto>),
        (status = 403, description = "Admin or staff only"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_bill(
    State(state): State<RideBillHandlerState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateRideBillRequest>,
) -> Result<Json<ApiResponse<RideBillDto>>, ApiError> {
    if !actor.role.can_manage_users() {
        return Err(ApiError::forbidden("Insufficient permissions"));
    }
    let bill = state.bills.update_bill(&id, request.into_update()?).await?;
    Ok(Json(ApiResponse::success(bill.into())))
}
