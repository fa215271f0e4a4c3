//! Query orchestration: corpus load, planning, name and attribution lookups, reporting.

use std::sync::Arc;
use std::time::Instant;

use prometheus::Gauge;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info, instrument, warn};

use crate::observability::Metrics;
use crate::store::CorpusDao;
use crate::store::models::{ItemId, TagId};

use super::corpus::CorpusSnapshot;
use super::custom::CustomTagset;
use super::engine::{SectorPlan, plan_custom_sector, plan_sectors};
use super::error::TagMapError;
use super::params::TagMapParams;
use super::report::{Sector, build_sectors};

/// 実行中クエリ数のゲージ。タイムアウトで future が破棄されても戻す。
struct InflightGuard(Gauge);

impl InflightGuard {
    fn enter(gauge: &Gauge) -> Self {
        gauge.inc();
        Self(gauge.clone())
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        self.0.dec();
    }
}

/// TagMapService - 1クエリ分のセクター計算を担うサービス
///
/// クエリ間で共有するのは DAO とメトリクスだけ。
#[derive(Clone)]
pub struct TagMapService {
    dao: Arc<dyn CorpusDao>,
    metrics: Arc<Metrics>,
}

impl TagMapService {
    #[must_use]
    pub fn new(dao: Arc<dyn CorpusDao>, metrics: Arc<Metrics>) -> Self {
        Self { dao, metrics }
    }

    #[must_use]
    pub fn dao(&self) -> Arc<dyn CorpusDao> {
        Arc::clone(&self.dao)
    }

    /// セクター一覧を計算する。
    ///
    /// 空のコーパスや候補なしは `Ok(vec![])`。コーパスアクセスの失敗はそのまま返す。
    ///
    /// # Errors
    /// DAO が失敗した場合は [`TagMapError::Corpus`]、計画スレッドが異常終了した場合は
    /// [`TagMapError::Worker`] を返す。
    #[instrument(
        skip_all,
        fields(
            namespace = %params.namespace.as_str(),
            view = params.view.as_str(),
            status = params.status_filter.as_str(),
            consolidation = params.consolidation,
        )
    )]
    #[allow(clippy::cast_precision_loss)]
    pub async fn query(&self, params: TagMapParams) -> Result<Vec<Sector>, TagMapError> {
        self.metrics.queries_total.inc();
        let _inflight = InflightGuard::enter(&self.metrics.inflight_queries);
        let started = Instant::now();

        let result = self.run(params).await;
        self.metrics
            .query_duration
            .observe(started.elapsed().as_secs_f64());

        match &result {
            Ok(sectors) if sectors.is_empty() => {
                self.metrics.empty_results.inc();
                debug!("tag map query produced no sectors");
            }
            Ok(sectors) => {
                self.metrics.sectors_emitted.inc_by(sectors.len() as f64);
                info!(
                    sectors = sectors.len(),
                    elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
                    "tag map query completed"
                );
            }
            Err(error) => {
                self.metrics.query_failures.inc();
                warn!(error = %error, "tag map query failed");
            }
        }
        result
    }

    #[allow(clippy::cast_precision_loss)]
    async fn run(&self, params: TagMapParams) -> Result<Vec<Sector>, TagMapError> {
        let load_started = Instant::now();
        let rows = self
            .dao
            .load_applications(&params.namespace, params.status_filter)
            .await
            .map_err(TagMapError::Corpus)?;
        self.metrics
            .corpus_load_duration
            .observe(load_started.elapsed().as_secs_f64());
        debug!(rows = rows.len(), "tag applications loaded");

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let plan = if params.is_custom() {
            let tagset = CustomTagset::parse(&params.custom_tagset);
            if tagset.is_empty() {
                return Ok(Vec::new());
            }
            let resolved = self
                .dao
                .resolve_tag_ids(&params.namespace, &tagset.names())
                .await
                .map_err(TagMapError::Corpus)?;
            let include = resolve_in_order(&tagset.include, &resolved);
            let exclude = resolve_in_order(&tagset.exclude, &resolved);
            if include.is_empty() {
                debug!(tokens = ?tagset.include, "no include tag resolved");
                return Ok(Vec::new());
            }
            self.plan_blocking(move || {
                let snapshot = CorpusSnapshot::from_applications(&rows);
                plan_custom_sector(&snapshot, &include, &exclude)
            })
            .await?
        } else {
            let plan_params = params.clone();
            self.plan_blocking(move || {
                let snapshot = CorpusSnapshot::from_applications(&rows);
                plan_sectors(&snapshot, &plan_params)
            })
            .await?
        };

        self.metrics
            .candidate_tags
            .set(plan.stats.candidates as f64);
        if plan.sectors.is_empty() {
            return Ok(Vec::new());
        }

        let tag_ids: Vec<TagId> = unique(plan.sectors.iter().flat_map(|s| s.tags.iter()));
        let item_ids: Vec<ItemId> = unique(plan.sectors.iter().flat_map(|s| s.items.iter()));

        let tag_names = self
            .dao
            .tag_names(&tag_ids)
            .await
            .map_err(TagMapError::Corpus)?;
        let attributions = self
            .dao
            .item_attributions(&item_ids)
            .await
            .map_err(TagMapError::Corpus)?;

        Ok(build_sectors(
            &plan.sectors,
            &tag_names,
            &attributions,
            params.max_mappers,
        ))
    }

    async fn plan_blocking<F>(&self, work: F) -> Result<SectorPlan, TagMapError>
    where
        F: FnOnce() -> SectorPlan + Send + 'static,
    {
        let started = Instant::now();
        let plan = tokio::task::spawn_blocking(work).await?;
        self.metrics
            .plan_duration
            .observe(started.elapsed().as_secs_f64());
        debug!(
            total_items = plan.stats.total_items,
            candidates = plan.stats.candidates,
            edges = plan.stats.edges,
            components = plan.stats.components,
            sectors = plan.sectors.len(),
            "sector plan computed"
        );
        Ok(plan)
    }
}

/// 入力順を保ったまま解決できた名前だけを ID にする。
fn resolve_in_order(names: &[String], resolved: &FxHashMap<String, TagId>) -> Vec<TagId> {
    let mut ids: Vec<TagId> = Vec::new();
    for id in names.iter().filter_map(|name| resolved.get(name)) {
        if !ids.contains(id) {
            ids.push(*id);
        }
    }
    ids
}

fn unique<'a, I>(values: I) -> Vec<i64>
where
    I: Iterator<Item = &'a i64>,
{
    let set: FxHashSet<i64> = values.copied().collect();
    let mut out: Vec<i64> = set.into_iter().collect();
    out.sort_unstable();
    out
}
