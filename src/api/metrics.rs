use axum::{
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use prometheus::TEXT_FORMAT;

use crate::app::AppState;

/// GET /metrics
/// 専用レジストリの内容を Prometheus テキスト形式で返す。
pub(crate) async fn exporter(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, TEXT_FORMAT)],
        state.telemetry().render_prometheus(),
    )
}
