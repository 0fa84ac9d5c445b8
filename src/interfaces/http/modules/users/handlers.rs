//! User management API handlers
//!
//! Admin / staff endpoints. Delegates to `UserService` from the identity layer.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};

use super::dto::{ChangeRoleRequest, CreateUserRequest, ListUsersParams, UpdateUserRequest, UserDto};
use crate::application::identity::UserService;
use crate::domain::user::GetUserDto;
use crate::domain::UserRole;
use crate::interfaces::http::common::{
    ApiError, ApiResponse, EmptyData, PaginatedResponse, ValidatedJson,
};
use crate::interfaces::http::middleware::AuthenticatedUser;
use crate::shared::validate_pagination;

#[derive(Clone)]
pub struct UserHandlerState {
    pub users: Arc<UserService>,
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(ListUsersParams),
    responses(
        (status = 200, description = "User list", body = ApiResponse<PaginatedResponse<UserDto>>),
        (status = 403, description = "Admin or staff only")
    )
)]
pub async fn list_users(
    State(state): State<UserHandlerState>,
    Query(params): Query<ListUsersParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<UserDto>>>, ApiError> {
    let (page, limit) = validate_pagination(params.page, params.limit);
    let role = params.role.as_deref().map(UserRole::parse).transpose()?;
    let query = GetUserDto {
        search: params.search,
        role,
        is_active: params.is_active,
        page,
        limit,
    };

    let result = state.users.list_users(query).await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::from_result(
        result,
        UserDto::from,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = ApiResponse<UserDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_user(
    State(state): State<UserHandlerState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state.users.get_user(&id).await?;
    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = ApiResponse<UserDto>),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email already exists")
    )
)]
pub async fn create_user(
    State(state): State<UserHandlerState>,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserDto>>), ApiError> {
    let user = state.users.create_user(request.into_dto()?).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(UserDto::from(user))),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<UserDto>),
        (status = 404, description = "Not found"),
        (status = 409, description = "Email already exists")
    )
)]
pub async fn update_user(
    State(state): State<UserHandlerState>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state.users.update_user(&id, request.into()).await?;
    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/status",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Active flag toggled", body = ApiResponse<UserDto>),
        (status = 400, description = "Own account"),
        (status = 404, description = "Not found")
    )
)]
pub async fn toggle_user_status(
    State(state): State<UserHandlerState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state.users.toggle_status(&id, &actor.user_id).await?;
    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/role",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    request_body = ChangeRoleRequest,
    responses(
        (status = 200, description = "Role changed", body = ApiResponse<UserDto>),
        (status = 400, description = "Unknown role or own account"),
        (status = 404, description = "Not found")
    )
)]
pub async fn change_user_role(
    State(state): State<UserHandlerState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<ChangeRoleRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let role = UserRole::parse(&request.role)?;
    let user = state.users.change_role(&id, role, &actor.user_id).await?;
    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/photo",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    request_body(content_type = "multipart/form-data", description = "Image file in the `photo` field"),
    responses(
        (status = 200, description = "Photo stored", body = ApiResponse<UserDto>),
        (status = 400, description = "Not an image or larger than 5 MB")
    )
)]
pub async fn upload_user_photo(
    State(state): State<UserHandlerState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?
    {
        if field.name() != Some("photo") {
            continue;
        }
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        let user = state
            .users
            .upload_photo(&id, data.to_vec(), &content_type)
            .await?;
        return Ok(Json(ApiResponse::success(UserDto::from(user))));
    }
    Err(ApiError::bad_request("No photo file uploaded"))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/photo",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Raw image bytes"),
        (status = 404, description = "No photo")
    )
)]
pub async fn get_user_photo(
    State(state): State<UserHandlerState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let photo = state.users.get_photo(&id).await?;
    Ok(([(header::CONTENT_TYPE, photo.content_type)], photo.data))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = ApiResponse<EmptyData>),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_user(
    State(state): State<UserHandlerState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<EmptyData>>, ApiError> {
    state.users.delete_user(&id, &actor.user_id).await?;
    Ok(Json(ApiResponse::success(EmptyData {})))
}
