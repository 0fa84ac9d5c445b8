//! Reusable server runtime.
//!
//! [`ServerHandle`] owns the full lifecycle: database connection and migrations,
//! default admin bootstrap, REST API, the student expiry task, metrics and
//! graceful shutdown. The binary and the CLI both start
//! the service through it.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use sea_orm::DatabaseConnection;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::application::data_management::ScheduleOutcome;
use crate::application::identity::{hash_new_password, start_student_expiry_task};
use crate::application::{create_event_bus, DataManagementService, Mailer, NotificationDispatcher};
use crate::config::AppConfig;
use crate::domain::{DomainResult, RepositoryProvider, User, UserRole};
use crate::infrastructure::mail::{LogMailer, SmtpMailer};
use crate::infrastructure::{init_database, run_migrations, SeaOrmRepositoryProvider};
use crate::interfaces::http::modules::metrics::MetricsState;
use crate::interfaces::http::{create_api_router, AppConfig as RouterConfig, AppState};
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};

pub type ServerResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

// ── Options ────────────────────────────────────────────────────────

pub struct ServerOptions {
    pub config: AppConfig,
    /// Run database migrations on startup (default: true).
    pub auto_migrate: bool,
    /// Create the configured admin when the user table is empty (default: true).
    pub create_default_admin: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
            create_default_admin: true,
        }
    }
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running server.
///
/// ```rust,no_run
/// use campus_transport::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     handle.install_signal_handler();
///     handle.shutdown_signal().wait().await;
///     handle.wait().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    pub state: AppState,
    pub config: AppConfig,
    /// Bound port; differs from the configured one when that was `0`.
    pub port: u16,

    db: DatabaseConnection,
    shutdown: ShutdownCoordinator,
    api_task: JoinHandle<()>,
    background: Vec<JoinHandle<()>>,
}

impl ServerHandle {
    pub async fn start(opts: ServerOptions) -> ServerResult<Self> {
        let app_cfg = opts.config;
        info!("Starting Campus Transport service...");

        let metrics = metrics_state()?;

        // ── Database ───────────────────────────────────────────
        let db = init_database(&app_cfg.database.to_database_config()).await?;
        if opts.auto_migrate {
            run_migrations(&db).await?;
        }
        let repos: Arc<dyn RepositoryProvider> =
            Arc::new(SeaOrmRepositoryProvider::new(db.clone()));

        if opts.create_default_admin {
            if let Err(e) = create_default_admin(repos.as_ref(), &app_cfg).await {
                error!(error = %e, "Failed to create default admin");
            }
        }

        // ── Services ───────────────────────────────────────────
        let events = create_event_bus();
        let state = AppState::new(
            repos.clone(),
            events.clone(),
            build_mailer(&app_cfg),
            metrics,
            router_config(&app_cfg),
        );
        info!(
            hours = app_cfg.security.jwt_expiration_hours,
            "JWT configured"
        );

        // ── Background tasks ───────────────────────────────────
        let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
        let shutdown_signal = shutdown.signal();

        // Backups only run on request: the API or `cli --backup --scheduled`.
        let background = vec![start_student_expiry_task(
            repos,
            events,
            shutdown_signal.clone(),
            app_cfg.app.student_expiry_check_secs,
        )];

        // ── REST API server ────────────────────────────────────
        let listener = tokio::net::TcpListener::bind(app_cfg.server.address()).await?;
        let port = listener.local_addr()?.port();
        info!("REST API server listening on http://{}:{}", app_cfg.server.host, port);
        info!("Swagger UI available at http://{}:{}/docs/", app_cfg.server.host, port);

        let router = create_api_router(state.clone());
        let api_shutdown = shutdown_signal.clone();
        let api_task = tokio::spawn(async move {
            let server = axum::serve(listener, router).with_graceful_shutdown(async move {
                api_shutdown.wait().await;
                info!("REST API server received shutdown signal");
            });
            if let Err(e) = server.await {
                error!(error = %e, "REST API server error");
            }
        });

        Ok(Self {
            state,
            config: app_cfg,
            port,
            db,
            shutdown,
            api_task,
            background,
        })
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install SIGTERM / SIGINT listeners that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait until shutdown was triggered and every task has stopped, bounded by
    /// the configured shutdown timeout.
    pub async fn wait(self) {
        let Self {
            db,
            shutdown,
            api_task,
            background,
            ..
        } = self;

        shutdown
            .shutdown_with_cleanup(|| async move {
                if let Err(e) = api_task.await {
                    error!(error = %e, "REST API server task panicked");
                }
                for task in background {
                    if let Err(e) = task.await {
                        error!(error = %e, "Background task panicked");
                    }
                }
                if let Err(e) = db.close().await {
                    warn!(error = %e, "Error closing database connection");
                } else {
                    info!("Database connection closed");
                }
            })
            .await;

        info!("Campus Transport service shutdown complete");
    }

    pub async fn shutdown(self) {
        info!("Shutting down...");
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

// ── One-shot operations ────────────────────────────────────────────

/// Run one backup against the configured database and exit. With `scheduled`
/// the stored schedule decides whether a backup is due.
pub async fn run_backup(config: &AppConfig, scheduled: bool) -> ServerResult<ScheduleOutcome> {
    let db = init_database(&config.database.to_database_config()).await?;
    run_migrations(&db).await?;
    let repos: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositoryProvider::new(db.clone()));

    let service = DataManagementService::new(
        repos,
        config.data_management.service_config(),
        NotificationDispatcher::new(build_mailer(config)),
        create_event_bus(),
    );
    let outcome = service.schedule_backup(!scheduled).await;

    // Let detached notification tasks finish before the runtime goes away.
    tokio::time::sleep(Duration::from_millis(200)).await;
    if let Err(e) = db.close().await {
        warn!(error = %e, "Error closing database connection");
    }
    Ok(outcome?)
}

// ── Helpers ────────────────────────────────────────────────────────

/// The global recorder can only be installed once per process; restarts reuse it.
fn metrics_state() -> ServerResult<MetricsState> {
    static STATE: OnceLock<MetricsState> = OnceLock::new();
    if let Some(state) = STATE.get() {
        return Ok(state.clone());
    }
    let state = MetricsState::install()?;
    info!("Prometheus metrics recorder installed");
    Ok(STATE.get_or_init(|| state).clone())
}

fn router_config(app_cfg: &AppConfig) -> RouterConfig {
    RouterConfig {
        jwt: app_cfg.security.jwt_config(),
        expose_reset_token: app_cfg.security.expose_reset_token,
        qr: app_cfg.app.qr_config(),
        data: app_cfg.data_management.service_config(),
    }
}

/// SMTP when configured and valid, otherwise log-only delivery.
fn build_mailer(app_cfg: &AppConfig) -> Arc<dyn Mailer> {
    let Some(smtp) = &app_cfg.smtp else {
        info!("SMTP not configured, emails will only be logged");
        return Arc::new(LogMailer);
    };
    match SmtpMailer::new(smtp.into()) {
        Ok(mailer) => {
            info!(host = %smtp.host, port = smtp.port, "SMTP mailer configured");
            Arc::new(mailer)
        }
        Err(e) => {
            error!(error = %e, "Invalid SMTP configuration, emails will only be logged");
            Arc::new(LogMailer)
        }
    }
}

/// Create the configured admin when no users exist. Returns whether one was created.
pub async fn create_default_admin(
    repos: &dyn RepositoryProvider,
    app_cfg: &AppConfig,
) -> DomainResult<bool> {
    if repos.users().count().await? > 0 {
        return Ok(false);
    }

    info!("Creating default admin user...");
    let mut admin = User::new(&app_cfg.admin.email, app_cfg.admin.name.clone(), UserRole::Admin);
    admin.password_hash = Some(hash_new_password(&app_cfg.admin.password)?);
    let admin = repos.users().save(admin).await?;

    info!(email = %admin.email, "Default admin created");
    warn!("Please change the default admin password immediately");
    Ok(true)
}

/// Initialize tracing from the logging section. Call once at process start.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::crypto::verify_password;
    use crate::infrastructure::InMemoryRepositoryProvider;

    #[tokio::test]
    async fn default_admin_created_once() {
        let repos = InMemoryRepositoryProvider::new();
        let config = AppConfig::default();

        assert!(create_default_admin(&repos, &config).await.unwrap());
        assert!(!create_default_admin(&repos, &config).await.unwrap());

        let admin = repos
            .users()
            .find_by_email(&config.admin.email)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.role, UserRole::Admin);
        let hash = admin.password_hash.unwrap();
        assert!(verify_password(&config.admin.password, &hash).unwrap());
        assert_eq!(repos.users().count().await.unwrap(), 1);
    }

    #[test]
    fn mailer_falls_back_to_log_without_smtp() {
        let config = AppConfig::default();
        // Only checks that construction does not panic without SMTP.
        let _mailer = build_mailer(&config);
    }

    #[tokio::test]
    async fn starting_the_server_writes_no_backup() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.server.host = "127.0.0.1".into();
        config.server.port = 0;
        config.server.shutdown_timeout = 5;
        config.database.url = None;
        config.database.path = dir.path().join("transport.db");
        config.data_management.backup_dir = dir.path().join("backups");
        config.data_management.cache_dirs = vec![];

        let handle = ServerHandle::start(ServerOptions {
            config,
            ..ServerOptions::default()
        })
        .await
        .unwrap();
        assert!(handle.is_running());

        // Backups are enabled by default and none has run yet, so a timer
        // would fire right away.
        let settings = handle.state.repos.backup_settings().load().await.unwrap();
        assert!(settings.enabled);
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(!dir.path().join("backups").exists());
        assert!(handle.state.data.backup_history().await.unwrap().is_empty());
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn one_shot_backup_against_sqlite_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.database.url = None;
        config.database.path = dir.path().join("transport.db");
        config.data_management.backup_dir = dir.path().join("backups");
        config.data_management.cache_dirs = vec![];

        let outcome = run_backup(&config, false).await.unwrap();
        match outcome {
            ScheduleOutcome::Created(backup) => {
                assert!(dir.path().join("backups").join(&backup.filename).exists());
            }
            other => panic!("expected a backup, got {other:?}"),
        }
    }
}
