/// Prometheusメトリクス定義。
use prometheus::{
    Counter, Gauge, Histogram, Registry, histogram_opts, register_counter_with_registry,
    register_gauge_with_registry, register_histogram_with_registry,
};
use std::sync::Arc;

/// クエリ時間のバケット（秒）。全件読み込みを含むので上側を広めに取る。
const QUERY_BUCKETS: &[f64] = &[0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

/// メトリクスコレクター。
#[derive(Debug, Clone)]
pub struct Metrics {
    // カウンター
    pub queries_total: Counter,
    pub query_failures: Counter,
    pub empty_results: Counter,
    pub sectors_emitted: Counter,

    // ヒストグラム
    pub query_duration: Histogram,
    pub corpus_load_duration: Histogram,
    pub plan_duration: Histogram,

    // ゲージ
    pub candidate_tags: Gauge,
    pub inflight_queries: Gauge,
}

impl Metrics {
    /// 新しいメトリクスコレクターを作成する。
    ///
    /// # Errors
    /// 同じレジストリへ同名のメトリクスを二重登録した場合はエラーを返す。
    pub fn new(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        Ok(Self {
            queries_total: register_counter_with_registry!(
                "tagmap_queries_total",
                "Total number of tag map queries received",
                registry
            )?,
            query_failures: register_counter_with_registry!(
                "tagmap_query_failures_total",
                "Number of tag map queries that failed on upstream or worker errors",
                registry
            )?,
            empty_results: register_counter_with_registry!(
                "tagmap_empty_results_total",
                "Number of tag map queries that produced no sectors",
                registry
            )?,
            sectors_emitted: register_counter_with_registry!(
                "tagmap_sectors_emitted_total",
                "Total number of sectors returned to callers",
                registry
            )?,
            query_duration: register_histogram_with_registry!(
                histogram_opts!(
                    "tagmap_query_duration_seconds",
                    "End-to-end duration of a tag map query",
                    QUERY_BUCKETS.to_vec()
                ),
                registry
            )?,
            corpus_load_duration: register_histogram_with_registry!(
                histogram_opts!(
                    "tagmap_corpus_load_duration_seconds",
                    "Duration of the batched tag application read",
                    QUERY_BUCKETS.to_vec()
                ),
                registry
            )?,
            plan_duration: register_histogram_with_registry!(
                "tagmap_plan_duration_seconds",
                "Duration of in-memory sector planning",
                registry
            )?,
            candidate_tags: register_gauge_with_registry!(
                "tagmap_candidate_tags",
                "Number of candidate tags in the most recent plan",
                registry
            )?,
            inflight_queries: register_gauge_with_registry!(
                "tagmap_inflight_queries",
                "Number of tag map queries currently being computed",
                registry
            )?,
        })
    }
}
