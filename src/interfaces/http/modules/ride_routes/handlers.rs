//! Ride route handlers. Reads are open to any signed-in user.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::dto::{RideRouteDto, RideRouteRequest};
use crate::application::rides::RideRouteService;
use crate::interfaces::http::common::{ApiError, ApiResponse, EmptyData, ValidatedJson};

#[derive(Clone)]
pub struct RideRouteHandlerState {
    pub routes: Arc<RideRouteService>,
}

#[utoipa::path(
    get,
    path = "/api/v1/ride-routes",
    tag = "Ride Routes",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "All routes", body = ApiResponse<Vec<RideRouteDto>>))
)]
pub async fn list_routes(
    State(state): State<RideRouteHandlerState>,
) -> Result<Json<ApiResponse<Vec<RideRouteDto>>>, ApiError> {
    let routes = state.routes.list_routes().await?;
    Ok(Json(ApiResponse::success(
        routes.into_iter().map(RideRouteDto::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/ride-routes/{id}",
    tag = "Ride Routes",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Route ID")),
    responses(
        (status = 200, description = "Route", body = ApiResponse<RideRouteDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_route(
    State(state): State<RideRouteHandlerState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<RideRouteDto>>, ApiError> {
    let route = state.routes.get_route(&id).await?;
    Ok(Json(ApiResponse::success(route.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/ride-routes",
    tag = "Ride Routes",
    security(("bearer_auth" = [])),
    request_body = RideRouteRequest,
    responses(
        (status = 201, description = "Route created", body = ApiResponse<RideRouteDto>),
        (status = 409, description = "Route already exists")
    )
)]
pub async fn create_route(
    State(state): State<RideRouteHandlerState>,
    ValidatedJson(request): ValidatedJson<RideRouteRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RideRouteDto>>), ApiError> {
    let route = state.routes.create_route(request.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(route.into()))))
}

#[utoipa::path(
    put,
    path = "/api/v1/ride-routes/{id}",
    tag = "Ride Routes",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Route ID")),
    request_body = RideRouteRequest,
    responses(
        (status = 200, description = "Route updated", body = ApiResponse<RideRouteDto>),
        (status = 404, description = "Not found"),
        (status = 409, description = "Route already exists")
    )
)]
pub async fn update_route(
    State(state): State<RideRouteHandlerState>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<RideRouteRequest>,
) -> Result<Json<ApiResponse<RideRouteDto>>, ApiError> {
    let route = state.routes.update_route(&id, request.into()).await?;
    Ok(Json(ApiResponse::success(route.into())))
}

#[utoipa::path(
    delete,
    path = "/api/v1/ride-routes/{id}",
    tag = "Ride Routes",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Route ID")),
    responses(
        (status = 200, description = "Route deleted", body = ApiResponse<EmptyData>),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_route(
    State(state): State<RideRouteHandlerState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<EmptyData>>, ApiError> {
    state.routes.delete_route(&id).await?;
    Ok(Json(ApiResponse::success(EmptyData {})))
}
