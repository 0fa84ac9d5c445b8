//! `GET /metrics` in Prometheus text format, read from the global recorder.

use axum::{extract::State, http::header, response::IntoResponse};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::domain::{DomainError, DomainResult};

pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

#[derive(Clone)]
pub struct MetricsState {
    pub handle: PrometheusHandle,
}

impl MetricsState {
    /// Install the process-wide recorder. Fails when one is already installed.
    pub fn install() -> DomainResult<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| DomainError::operation("Failed to install metrics recorder", e))?;
        Ok(Self { handle })
    }

    /// Recorder that is not registered globally. Used by tests and by
    /// embedders that install their own recorder.
    pub fn detached() -> Self {
        let recorder = PrometheusBuilder::new().build_recorder();
        Self {
            handle: recorder.handle(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Health",
    responses(
        (status = 200, description = "Prometheus exposition", content_type = "text/plain")
    )
)]
pub async fn prometheus_metrics(State(state): State<MetricsState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        state.handle.render(),
    )
}
