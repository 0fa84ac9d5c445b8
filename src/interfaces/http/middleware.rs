//! Authentication and role-guard middleware for Axum

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::common::ApiError;
use crate::domain::UserRole;
use crate::infrastructure::crypto::{verify_token, JwtConfig, TokenClaims};

#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    ExpiredToken,
    InsufficientPermissions,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "Missing authentication token"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid authentication token"),
            AuthError::ExpiredToken => (StatusCode::UNAUTHORIZED, "Token has expired"),
            AuthError::InsufficientPermissions => {
                (StatusCode::FORBIDDEN, "Insufficient permissions")
            }
        };
        ApiError::new(status, message).into_response()
    }
}

#[derive(Clone)]
pub struct AuthState {
    pub jwt_config: JwtConfig,
}

/// Identity attached to the request by [`auth_middleware`].
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: String,
    pub role: UserRole,
}

impl AuthenticatedUser {
    fn from_claims(claims: TokenClaims) -> Option<Self> {
        let role = claims.user_role()?;
        Some(Self {
            user_id: claims.sub,
            email: claims.email,
            role,
        })
    }
}

fn bearer_token(request: &Request<Body>) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
}

/// Query-string token for clients that cannot set headers (browser WebSockets).
fn query_token(request: &Request<Body>) -> Option<String> {
    request.uri().query()?.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == "token")
            .then(|| urlencoding::decode(value).ok().map(|v| v.into_owned()))
            .flatten()
    })
}

/// JWT bearer authentication
pub async fn auth_middleware(
    State(auth_state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = match bearer_token(&request) {
        Some(token) => token.to_string(),
        None => match query_token(&request) {
            Some(token) => token,
            None => return AuthError::MissingToken.into_response(),
        },
    };

    let claims = match verify_token(&token, &auth_state.jwt_config) {
        Ok(claims) => claims,
        Err(e) => {
            return match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AuthError::ExpiredToken.into_response()
                }
                _ => AuthError::InvalidToken.into_response(),
            }
        }
    };
    let Some(user) = AuthenticatedUser::from_claims(claims) else {
        return AuthError::InvalidToken.into_response();
    };

    request.extensions_mut().insert(user);
    next.run(request).await
}

async fn guard(request: Request<Body>, next: Next, allowed: fn(UserRole) -> bool) -> Response {
    match request.extensions().get::<AuthenticatedUser>() {
        Some(user) if allowed(user.role) => next.run(request).await,
        Some(_) => AuthError::InsufficientPermissions.into_response(),
        None => AuthError::MissingToken.into_response(),
    }
}

/// Admin and staff. Must run after [`auth_middleware`].
pub async fn require_user_manager(request: Request<Body>, next: Next) -> Response {
    guard(request, next, |role| role.can_manage_users()).await
}

/// Admin only. Must run after [`auth_middleware`].
pub async fn require_admin(request: Request<Body>, next: Next) -> Response {
    guard(request, next, |role| role.can_manage_data()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::crypto::create_token;
    use axum::http::Request as HttpRequest;
    use axum::routing::get;
    use axum::{middleware, Extension, Router};
    use tower::ServiceExt;

    fn app(config: JwtConfig) -> Router {
        let admin_only = Router::new()
            .route("/admin", get(|| async { "ok" }))
            .layer(middleware::from_fn(require_admin));
        Router::new()
            .route(
                "/me",
                get(|Extension(user): Extension<AuthenticatedUser>| async move {
                    user.role.to_string()
                }),
            )
            .merge(admin_only)
            .layer(middleware::from_fn_with_state(
                AuthState { jwt_config: config },
                auth_middleware,
            ))
    }

    async fn status(app: Router, uri: &str, token: Option<&str>) -> StatusCode {
        let mut builder = HttpRequest::get(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        app.oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn rejects_missing_and_foreign_tokens() {
        let config = JwtConfig::new("secret", 1);
        assert_eq!(status(app(config.clone()), "/me", None).await, StatusCode::UNAUTHORIZED);

        let foreign =
            create_token("u1", "a@campus.edu", UserRole::Admin, &JwtConfig::new("other", 1))
                .unwrap();
        assert_eq!(
            status(app(config), "/me", Some(&foreign)).await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn role_guard_blocks_staff_from_admin_routes() {
        let config = JwtConfig::new("secret", 1);
        let staff = create_token("u1", "s@campus.edu", UserRole::Staff, &config).unwrap();
        let admin = create_token("u2", "a@campus.edu", UserRole::Admin, &config).unwrap();

        assert_eq!(status(app(config.clone()), "/me", Some(&staff)).await, StatusCode::OK);
        assert_eq!(
            status(app(config.clone()), "/admin", Some(&staff)).await,
            StatusCode::FORBIDDEN
        );
        assert_eq!(status(app(config), "/admin", Some(&admin)).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn token_accepted_from_query_string() {
        let config = JwtConfig::new("secret", 1);
        let token = create_token("u1", "s@campus.edu", UserRole::Staff, &config).unwrap();
        let uri = format!("/me?token={}", token);
        assert_eq!(status(app(config), &uri, None).await, StatusCode::OK);
    }
}
