use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use tracing::{error, warn};

use crate::app::AppState;
use crate::tagmap::{RawTagMapQuery, TagMapParams, TagMapResponse};

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// GET /v1/tagmap
/// タグ共起からセクター一覧を計算して返す。
///
/// クエリ文字列は全て寛容にパースするので、入力値で 4xx になることはない。
pub(crate) async fn get_tagmap(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> impl IntoResponse {
    // 重複キーは先勝ち
    let raw = RawTagMapQuery::from_pairs(pairs);
    let params = TagMapParams::from_query(&raw, state.config().default_consolidation());
    let deadline = state.config().query_timeout();

    // タイムアウト時は future ごと破棄する
    match tokio::time::timeout(deadline, state.service().query(params)).await {
        Ok(Ok(sets)) => (StatusCode::OK, Json(TagMapResponse { sets })).into_response(),
        Ok(Err(e)) => {
            error!(error = %e, "failed to compute tag map");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
        Err(_) => {
            warn!(
                timeout_secs = deadline.as_secs_f64(),
                "tag map query exceeded deadline"
            );
            error_response(StatusCode::GATEWAY_TIMEOUT, "tag map query timed out")
        }
    }
}
