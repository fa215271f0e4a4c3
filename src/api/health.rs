use std::time::Instant;

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use tracing::error;

use crate::app::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) struct HealthReport {
    status: &'static str,
    /// コーパスストアへの ping 所要時間（ready のみ）。
    #[serde(skip_serializing_if = "Option::is_none")]
    corpus_store_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl HealthReport {
    fn live() -> Self {
        Self {
            status: "live",
            corpus_store_ms: None,
            detail: None,
        }
    }

    fn ready(elapsed_ms: f64) -> Self {
        Self {
            status: "ready",
            corpus_store_ms: Some(elapsed_ms),
            detail: None,
        }
    }

    fn degraded(detail: impl Into<String>) -> Self {
        Self {
            status: "degraded",
            corpus_store_ms: None,
            detail: Some(detail.into()),
        }
    }
}

/// GET /health/ready
/// コーパスストアに ping できなければ 503。
pub(crate) async fn ready(
    State(state): State<AppState>,
) -> Result<Json<HealthReport>, (StatusCode, Json<HealthReport>)> {
    let started = Instant::now();
    let probe = state.service().dao().ping().await;
    state.telemetry().record_ready_probe(probe.is_ok());

    match probe {
        Ok(()) => Ok(Json(HealthReport::ready(
            started.elapsed().as_secs_f64() * 1000.0,
        ))),
        Err(error) => {
            error!("corpus store readiness check failed: {error:#}");
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthReport::degraded(format!("corpus_store: {error:#}"))),
            ))
        }
    }
}

pub(crate) async fn live(State(state): State<AppState>) -> Json<HealthReport> {
    state.telemetry().record_live_probe();
    Json(HealthReport::live())
}
