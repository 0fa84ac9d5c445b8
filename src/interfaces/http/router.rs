//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{DefaultBodyLimit, FromRef},
    middleware,
    routing::{delete, get, post, MethodRouter},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::application::{
    AuthService, DataManagementConfig, DataManagementService, DriverQrConfig, DriverQrService,
    Mailer, NotificationDispatcher, PasswordResetService, RideBillService, RideRouteService,
    SharedEventBus, UserService,
};
use crate::domain::RepositoryProvider;
use crate::infrastructure::crypto::JwtConfig;
use crate::interfaces::http::common::{ApiResponse, EmptyData};
use crate::interfaces::http::middleware::{
    auth_middleware, require_admin, require_user_manager, AuthState,
};
use crate::interfaces::ws::{ws_user_changes_handler, ChangeFeedState};

use super::modules::{
    auth, data_management, drivers, health, metrics, ride_bills, ride_routes, users,
};

/// Largest accepted profile photo upload, multipart framing included.
const MAX_PHOTO_UPLOAD_BYTES: usize = 6 * 1024 * 1024;

/// Settings the router needs beyond the repositories
#[derive(Clone)]
pub struct AppConfig {
    pub jwt: JwtConfig,
    pub expose_reset_token: bool,
    pub qr: DriverQrConfig,
    pub data: DataManagementConfig,
}

/// Shared state for every route. Handlers pull their own slice through `FromRef`.
#[derive(Clone)]
pub struct AppState {
    pub repos: Arc<dyn RepositoryProvider>,
    pub events: SharedEventBus,
    pub auth_state: AuthState,
    pub auth: Arc<AuthService>,
    pub password_reset: Arc<PasswordResetService>,
    pub users: Arc<UserService>,
    pub drivers: Arc<DriverQrService>,
    pub routes: Arc<RideRouteService>,
    pub bills: Arc<RideBillService>,
    pub data: Arc<DataManagementService>,
    pub metrics: metrics::MetricsState,
    pub started_at: Arc<Instant>,
}

impl AppState {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        events: SharedEventBus,
        mailer: Arc<dyn Mailer>,
        metrics: metrics::MetricsState,
        config: AppConfig,
    ) -> Self {
        let notifications = NotificationDispatcher::new(mailer);
        Self {
            auth_state: AuthState {
                jwt_config: config.jwt.clone(),
            },
            auth: Arc::new(AuthService::new(repos.clone(), config.jwt)),
            password_reset: Arc::new(PasswordResetService::new(
                repos.clone(),
                notifications.clone(),
                config.expose_reset_token,
            )),
            users: Arc::new(UserService::new(repos.clone(), events.clone())),
            drivers: Arc::new(DriverQrService::new(
                repos.clone(),
                events.clone(),
                config.qr,
            )),
            routes: Arc::new(RideRouteService::new(repos.clone())),
            bills: Arc::new(RideBillService::new(repos.clone())),
            data: Arc::new(DataManagementService::new(
                repos.clone(),
                config.data,
                notifications,
                events.clone(),
            )),
            metrics,
            started_at: Arc::new(Instant::now()),
            repos,
            events,
        }
    }
}

// -- FromRef implementations so each handler keeps its own State<T> extractor --

impl FromRef<AppState> for AuthState {
    fn from_ref(s: &AppState) -> Self {
        s.auth_state.clone()
    }
}

impl FromRef<AppState> for auth::AuthHandlerState {
    fn from_ref(s: &AppState) -> Self {
        auth::AuthHandlerState {
            auth: Arc::clone(&s.auth),
            password_reset: Arc::clone(&s.password_reset),
        }
    }
}

impl FromRef<AppState> for users::UserHandlerState {
    fn from_ref(s: &AppState) -> Self {
        users::UserHandlerState {
            users: Arc::clone(&s.users),
        }
    }
}

impl FromRef<AppState> for drivers::DriverHandlerState {
    fn from_ref(s: &AppState) -> Self {
        drivers::DriverHandlerState {
            drivers: Arc::clone(&s.drivers),
        }
    }
}

impl FromRef<AppState> for ride_routes::RideRouteHandlerState {
    fn from_ref(s: &AppState) -> Self {
        ride_routes::RideRouteHandlerState {
            routes: Arc::clone(&s.routes),
        }
    }
}

impl FromRef<AppState> for ride_bills::RideBillHandlerState {
    fn from_ref(s: &AppState) -> Self {
        ride_bills::RideBillHandlerState {
            bills: Arc::clone(&s.bills),
        }
    }
}

impl FromRef<AppState> for data_management::DataHandlerState {
    fn from_ref(s: &AppState) -> Self {
        data_management::DataHandlerState {
            data: Arc::clone(&s.data),
        }
    }
}

impl FromRef<AppState> for health::HealthState {
    fn from_ref(s: &AppState) -> Self {
        health::HealthState {
            repos: Arc::clone(&s.repos),
            events: s.events.clone(),
            started_at: Arc::clone(&s.started_at),
        }
    }
}

impl FromRef<AppState> for metrics::MetricsState {
    fn from_ref(s: &AppState) -> Self {
        s.metrics.clone()
    }
}

impl FromRef<AppState> for ChangeFeedState {
    fn from_ref(s: &AppState) -> Self {
        ChangeFeedState {
            repos: Arc::clone(&s.repos),
            events: s.events.clone(),
        }
    }
}

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer token"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health_check,
        metrics::prometheus_metrics,
        // Auth
        auth::login,
        auth::get_current_user,
        auth::change_password,
        auth::forgot_password,
        auth::verify_otp,
        auth::reset_password,
        // Users
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::toggle_user_status,
        users::change_user_role,
        users::upload_user_photo,
        users::get_user_photo,
        users::delete_user,
        // Drivers
        drivers::get_qr_code,
        drivers::regenerate_qr_code,
        drivers::verify_driver,
        // Ride routes
        ride_routes::list_routes,
        ride_routes::get_route,
        ride_routes::create_route,
        ride_routes::update_route,
        ride_routes::delete_route,
        // Ride bills
        ride_bills::list_bills,
        ride_bills::get_bill,
        ride_bills::create_bill,
        ride_bills::update_bill,
        // Data management
        data_management::create_backup,
        data_management::schedule_backup,
        data_management::export_data,
        data_management::import_data,
        data_management::clear_cache,
        data_management::backup_history,
        data_management::delete_backup,
        data_management::clear_backup_history,
        data_management::get_backup_settings,
        data_management::update_backup_settings,
    ),
    components(
        schemas(
            // Common
            ApiResponse<String>,
            EmptyData,
            health::HealthResponse,
            health::ComponentHealth,
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::ChangePasswordRequest,
            auth::ForgotPasswordRequest,
            auth::ForgotPasswordResponse,
            auth::VerifyOtpRequest,
            auth::VerifyOtpResponse,
            auth::ResetPasswordRequest,
            auth::MessageResponse,
            // Users
            users::UserDto,
            users::CreateUserRequest,
            users::UpdateUserRequest,
            users::ChangeRoleRequest,
            // Drivers
            drivers::DriverQrCodeDto,
            drivers::DriverVerificationDto,
            // Ride routes
            ride_routes::RideRouteDto,
            ride_routes::RideRouteRequest,
            // Ride bills
            ride_bills::RideBillDto,
            ride_bills::CreateRideBillRequest,
            ride_bills::UpdateRideBillRequest,
            // Data management
            data_management::CollectionCountsDto,
            data_management::BackupResultDto,
            data_management::ScheduleResultDto,
            data_management::ImportCountsDto,
            data_management::ImportResultDto,
            data_management::CacheClearDto,
            data_management::BackupEntryDto,
            data_management::DeletedBackupDto,
            data_management::ClearHistoryDto,
            data_management::BackupSettingsDto,
            data_management::UpdateBackupSettingsRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check and Prometheus metrics"),
        (name = "Authentication", description = "Login (JWT), profile, password change and OTP password reset"),
        (name = "Users", description = "User administration for admin and staff"),
        (name = "Drivers", description = "Driver QR codes and public verification"),
        (name = "Ride Routes", description = "Route catalogue with fares"),
        (name = "Ride Bills", description = "Ride records, scoped to the caller"),
        (name = "Data Management", description = "Backups, export, import and cache housekeeping (admin only)"),
    ),
    info(
        title = "Campus Transport API",
        version = "1.0.0",
        description = "REST API for campus transport: users, drivers, ride routes, ride bills and data management",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Restrict one method router to admin / staff. Runs after `auth_middleware`.
fn managers_only(route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.route_layer(middleware::from_fn(require_user_manager))
}

/// Create the API router with all routes
pub fn create_api_router(state: AppState) -> Router {
    let authenticated = middleware::from_fn_with_state(state.auth_state.clone(), auth_middleware);

    // Auth routes (public)
    let auth_public_routes = Router::new()
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/forgot-password", post(auth::forgot_password))
        .route("/api/v1/auth/verify-otp", post(auth::verify_otp))
        .route("/api/v1/auth/reset-password", post(auth::reset_password));

    // Auth routes (any signed-in user)
    let auth_protected_routes = Router::new()
        .route("/api/v1/auth/me", get(auth::get_current_user))
        .route(
            "/api/v1/auth/change-password",
            axum::routing::put(auth::change_password),
        )
        .layer(authenticated.clone());

    // User administration + change feed (admin / staff)
    let user_routes = Router::new()
        .route("/", get(users::list_users).post(users::create_user))
        .route("/changes/ws", get(ws_user_changes_handler))
        .route(
            "/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/{id}/status", post(users::toggle_user_status))
        .route("/{id}/role", axum::routing::put(users::change_user_role))
        .route(
            "/{id}/photo",
            get(users::get_user_photo)
                .put(users::upload_user_photo)
                .layer(DefaultBodyLimit::max(MAX_PHOTO_UPLOAD_BYTES)),
        )
        .layer(middleware::from_fn(require_user_manager))
        .layer(authenticated.clone());

    // Driver QR codes (admin / staff); verification is public
    let driver_routes = Router::new()
        .route(
            "/api/v1/drivers/{id}/qr-code",
            get(drivers::get_qr_code).post(drivers::regenerate_qr_code),
        )
        .layer(middleware::from_fn(require_user_manager))
        .layer(authenticated.clone());
    let driver_public_routes =
        Router::new().route("/api/v1/drivers/verify/{id}", get(drivers::verify_driver));

    // Ride routes: reads for any user, writes for admin / staff
    let ride_route_routes = Router::new()
        .route(
            "/",
            get(ride_routes::list_routes).merge(managers_only(post(ride_routes::create_route))),
        )
        .route(
            "/{id}",
            get(ride_routes::get_route)
                .merge(managers_only(axum::routing::put(ride_routes::update_route)))
                .merge(managers_only(delete(ride_routes::delete_route))),
        )
        .layer(authenticated.clone());

    // Ride bills: role scoping happens in the handlers / service
    let ride_bill_routes = Router::new()
        .route("/", get(ride_bills::list_bills).post(ride_bills::create_bill))
        .route(
            "/{id}",
            get(ride_bills::get_bill).patch(ride_bills::update_bill),
        )
        .layer(authenticated.clone());

    // Data management (admin only)
    let data_routes = Router::new()
        .route("/backup", post(data_management::create_backup))
        .route("/backup/schedule", post(data_management::schedule_backup))
        .route("/export", get(data_management::export_data))
        .route(
            "/import",
            post(data_management::import_data)
                .layer(DefaultBodyLimit::max(data_management::MAX_IMPORT_BYTES)),
        )
        .route("/cache", delete(data_management::clear_cache))
        .route(
            "/backup/history",
            get(data_management::backup_history).delete(data_management::clear_backup_history),
        )
        .route(
            "/backup/history/{filename}",
            delete(data_management::delete_backup),
        )
        .route(
            "/backup/settings",
            get(data_management::get_backup_settings)
                .post(data_management::update_backup_settings),
        )
        .layer(middleware::from_fn(require_admin))
        .layer(authenticated);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    Router::new()
        .merge(swagger_routes)
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::prometheus_metrics))
        .merge(auth_public_routes)
        .merge(auth_protected_routes)
        .nest("/api/v1/users", user_routes)
        .merge(driver_routes)
        .merge(driver_public_routes)
        .nest("/api/v1/ride-routes", ride_route_routes)
        .nest("/api/v1/ride-bills", ride_bill_routes)
        .nest("/api/v1/data-management", data_routes)
        .layer(middleware::from_fn(metrics::http_metrics_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::create_event_bus;
    use crate::domain::{User, UserRole};
    use crate::infrastructure::crypto::{create_token, hash_password};
    use crate::infrastructure::mail::LogMailer;
    use crate::infrastructure::InMemoryRepositoryProvider;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        repos: Arc<InMemoryRepositoryProvider>,
        jwt: JwtConfig,
        _dir: tempfile::TempDir,
    }

    fn test_app() -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let jwt = JwtConfig::new("router-test-secret", 1);
        let config = AppConfig {
            jwt: jwt.clone(),
            expose_reset_token: false,
            qr: DriverQrConfig::default(),
            data: DataManagementConfig {
                backup_dir: dir.path().join("backups"),
                cache_dirs: vec![dir.path().join("cache")],
            },
        };
        let state = AppState::new(
            repos.clone(),
            create_event_bus(),
            Arc::new(LogMailer),
            metrics::MetricsState::detached(),
            config,
        );
        TestApp {
            router: create_api_router(state),
            repos,
            jwt,
            _dir: dir,
        }
    }

    async fn seed(app: &TestApp, email: &str, role: UserRole) -> User {
        let mut user = User::new(email, "Test User", role);
        user.password_hash = Some(hash_password("secret123").unwrap());
        app.repos.users().save(user).await.unwrap()
    }

    fn bearer(app: &TestApp, user: &User) -> String {
        let token = create_token(&user.id, &user.email, user.role, &app.jwt).unwrap();
        format!("Bearer {token}")
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn login_then_me() {
        let app = test_app();
        seed(&app, "admin@campus.edu", UserRole::Admin).await;

        let login = Request::post("/api/v1/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({"email": "admin@campus.edu", "password": "secret123"}).to_string(),
            ))
            .unwrap();
        let response = app.router.clone().oneshot(login).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let token = body["data"]["token"].as_str().unwrap().to_string();

        let me = Request::get("/api/v1/auth/me")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let response = app.router.clone().oneshot(me).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["email"], "admin@campus.edu");
        assert!(body["data"].get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let app = test_app();
        seed(&app, "admin@campus.edu", UserRole::Admin).await;

        let login = Request::post("/api/v1/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({"email": "admin@campus.edu", "password": "nope-nope"}).to_string(),
            ))
            .unwrap();
        let response = app.router.clone().oneshot(login).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Wrong password");
    }

    #[tokio::test]
    async fn data_management_is_admin_only() {
        let app = test_app();
        let staff = seed(&app, "staff@campus.edu", UserRole::Staff).await;
        let admin = seed(&app, "admin@campus.edu", UserRole::Admin).await;

        let request = |auth: String| {
            Request::get("/api/v1/data-management/backup/settings")
                .header(header::AUTHORIZATION, auth)
                .body(Body::empty())
                .unwrap()
        };

        let response = app
            .router
            .clone()
            .oneshot(request(bearer(&app, &staff)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .router
            .clone()
            .oneshot(request(bearer(&app, &admin)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["interval"], 24);
    }

    #[tokio::test]
    async fn user_admin_requires_token_and_role() {
        let app = test_app();
        let student = seed(&app, "stu@campus.edu", UserRole::Student).await;

        let anonymous = Request::get("/api/v1/users").body(Body::empty()).unwrap();
        let response = app.router.clone().oneshot(anonymous).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let as_student = Request::get("/api/v1/users")
            .header(header::AUTHORIZATION, bearer(&app, &student))
            .body(Body::empty())
            .unwrap();
        let response = app.router.clone().oneshot(as_student).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn ride_routes_read_for_students_write_for_staff() {
        let app = test_app();
        let student = seed(&app, "stu@campus.edu", UserRole::Student).await;
        let staff = seed(&app, "staff@campus.edu", UserRole::Staff).await;
        let payload = json!({"fromLocation": "Main Gate", "toLocation": "Library", "fare": 20.0});

        let create = |auth: String| {
            Request::post("/api/v1/ride-routes")
                .header(header::AUTHORIZATION, auth)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap()
        };

        let response = app
            .router
            .clone()
            .oneshot(create(bearer(&app, &student)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .router
            .clone()
            .oneshot(create(bearer(&app, &staff)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let list = Request::get("/api/v1/ride-routes")
            .header(header::AUTHORIZATION, bearer(&app, &student))
            .body(Body::empty())
            .unwrap();
        let response = app.router.clone().oneshot(list).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn driver_verification_is_public() {
        let app = test_app();
        let driver = seed(&app, "driver@campus.edu", UserRole::Driver).await;

        let request = Request::get(format!("/api/v1/drivers/verify/{}", driver.id))
            .body(Body::empty())
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["email"], "driver@campus.edu");
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = test_app();
        let response = app
            .router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
    }

    const BOUNDARY: &str = "campus-boundary";

    /// One-part multipart body; `filename` is omitted for plain fields.
    fn multipart_request(
        auth: String,
        field: &str,
        filename: Option<&str>,
        content: &str,
    ) -> Request<Body> {
        let disposition = match filename {
            Some(name) => format!("form-data; name=\"{field}\"; filename=\"{name}\""),
            None => format!("form-data; name=\"{field}\""),
        };
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: {disposition}\r\n\
             Content-Type: application/octet-stream\r\n\r\n{content}\r\n--{BOUNDARY}--\r\n"
        );
        Request::post("/api/v1/data-management/import")
            .header(header::AUTHORIZATION, auth)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        (status, body_json(response).await)
    }

    #[tokio::test]
    async fn import_accepts_only_json_files() {
        let app = test_app();
        let admin = seed(&app, "admin@campus.edu", UserRole::Admin).await;

        let (status, body) = send(
            &app,
            multipart_request(bearer(&app, &admin), "file", Some("notes.txt"), "hello"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Only JSON files are allowed");

        let (status, body) = send(
            &app,
            multipart_request(bearer(&app, &admin), "comment", None, "no file here"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No file uploaded");
    }

    #[tokio::test]
    async fn malformed_import_is_a_client_error() {
        let app = test_app();
        let admin = seed(&app, "admin@campus.edu", UserRole::Admin).await;

        for content in [r#"{"data": {}}"#, "{not json"] {
            let (status, body) = send(
                &app,
                multipart_request(bearer(&app, &admin), "file", Some("export.json"), content),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], "Invalid import file format");
        }
    }

    #[tokio::test]
    async fn import_valid_export_then_skip_on_repeat() {
        let app = test_app();
        let admin = seed(&app, "admin@campus.edu", UserRole::Admin).await;
        let export = json!({
            "exportDate": "2025-01-01T00:00:00.000Z",
            "version": "1.0",
            "data": {
                "users": [
                    { "_id": "u9", "email": "meera@campus.edu", "name": "Meera", "role": "student" }
                ],
                "rideLocations": [
                    { "fromLocation": "Gate", "toLocation": "Hostel", "fare": 15 }
                ],
                "rideBills": []
            }
        })
        .to_string();

        let (status, body) = send(
            &app,
            multipart_request(bearer(&app, &admin), "file", Some("export.json"), &export),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["users"]["imported"], 1);
        assert_eq!(body["data"]["rideLocations"]["imported"], 1);
        assert_eq!(body["data"]["exportDate"], "2025-01-01T00:00:00.000Z");

        let (status, body) = send(
            &app,
            multipart_request(bearer(&app, &admin), "file", Some("export.json"), &export),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["users"]["skipped"], 1);
        assert_eq!(body["data"]["rideLocations"]["skipped"], 1);
        assert_eq!(body["data"]["users"]["imported"], 0);
    }

    #[tokio::test]
    async fn export_attachment_has_no_secrets() {
        let app = test_app();
        let admin = seed(&app, "admin@campus.edu", UserRole::Admin).await;
        let mut student = User::new("asha@campus.edu", "Asha", UserRole::Student);
        student.password_hash = Some(hash_password("secret123").unwrap());
        student
            .reset
            .issue("123456".into(), "reset-token".into(), chrono::Utc::now());
        app.repos.users().save(student).await.unwrap();

        let response = app
            .router
            .clone()
            .oneshot(
                Request::get("/api/v1/data-management/export")
                    .header(header::AUTHORIZATION, bearer(&app, &admin))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=\"transport-export-"));

        let body = body_json(response).await;
        assert_eq!(body["version"], "1.0");
        assert_eq!(body["stats"]["users"], 2);
        let raw = body.to_string();
        assert!(!raw.contains("123456"));
        assert!(!raw.contains("reset-token"));
        for user in body["data"]["users"].as_array().unwrap() {
            for key in [
                "password",
                "passwordHash",
                "resetPasswordToken",
                "resetPasswordExpires",
                "resetPasswordOtp",
                "resetPasswordOtpExpires",
            ] {
                assert!(user.get(key).is_none(), "{key} exported");
            }
        }
    }

    #[tokio::test]
    async fn settings_errors_use_the_envelope() {
        let app = test_app();
        let admin = seed(&app, "admin@campus.edu", UserRole::Admin).await;
        let update = |body: Value| {
            Request::post("/api/v1/data-management/backup/settings")
                .header(header::AUTHORIZATION, bearer(&app, &admin))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap()
        };

        for bad in [json!({"interval": -5}), json!({"interval": 200}), json!({"maxBackups": 0})] {
            let (status, body) = send(&app, update(bad)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["success"], false);
            assert!(body["error"].as_str().unwrap().contains("between"));
        }

        let (status, body) = send(&app, update(json!({"interval": "daily"}))).await;
        assert!(status.is_client_error());
        assert_eq!(body["success"], false);

        let (status, body) = send(&app, update(json!({"interval": 12}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["interval"], 12);
    }
}
