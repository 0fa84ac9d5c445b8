//! Health check handler

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::application::SharedEventBus;
use crate::domain::{DomainResult, RepositoryProvider};

#[derive(Clone)]
pub struct HealthState {
    pub repos: Arc<dyn RepositoryProvider>,
    pub events: SharedEventBus,
    pub started_at: Arc<Instant>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `ok` or `degraded`
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub database: ComponentHealth,
    /// Open user change feed subscriptions
    pub change_feed_subscribers: usize,
    pub last_backup: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ComponentHealth {
    pub status: String,
    pub latency_ms: Option<u64>,
}

impl ComponentHealth {
    fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Time one store round trip.
async fn probe<T>(check: impl std::future::Future<Output = DomainResult<T>>) -> (ComponentHealth, Option<T>) {
    let started = Instant::now();
    match check.await {
        Ok(value) => (
            ComponentHealth {
                status: "ok".into(),
                latency_ms: Some(started.elapsed().as_millis() as u64),
            },
            Some(value),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Health probe failed");
            (
                ComponentHealth {
                    status: "error".into(),
                    latency_ms: None,
                },
                None,
            )
        }
    }
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Store unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let (database, settings) = probe(state.repos.backup_settings().load()).await;
    let healthy = database.is_ok();

    let body = HealthResponse {
        status: if healthy { "ok" } else { "degraded" }.into(),
        version: env!("CARGO_PKG_VERSION").into(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        database,
        change_feed_subscribers: state.events.subscriber_count(),
        last_backup: settings.and_then(|s| s.last_backup),
    };
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::create_event_bus;
    use crate::domain::BackupSettings;
    use crate::infrastructure::InMemoryRepositoryProvider;

    #[tokio::test]
    async fn reports_last_backup_and_subscribers() {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let at = Utc::now();
        let settings = BackupSettings {
            last_backup: Some(at),
            ..BackupSettings::default()
        };
        repos.backup_settings().store(&settings).await.unwrap();

        let events = create_event_bus();
        let _subscriber = events.subscribe();
        let state = HealthState {
            repos,
            events,
            started_at: Arc::new(Instant::now()),
        };

        let (status, Json(body)) = health_check(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ok");
        assert_eq!(body.change_feed_subscribers, 1);
        assert_eq!(body.last_backup, Some(at));
    }
}
