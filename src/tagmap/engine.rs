//! Sector planning: a pure function of (snapshot, parameters).
//!
//! 名前解決や貢献者集計は行わず、タグIDとアイテムIDだけのプランを返す。

use serde::Serialize;

use crate::store::models::{ItemId, TagId};

use super::assign::assign_items;
use super::association::{PairCounts, score_edges};
use super::candidates::{CandidateSet, select_candidates};
use super::components::{mutual_components, partition};
use super::corpus::CorpusSnapshot;
use super::custom::plan_custom;
use super::neighbors::NeighborGraph;
use super::overlap::OverlapCover;
use super::params::{TagMapParams, ViewMode};
use super::single::single_tag_sectors;
use super::tuning::Tuning;

/// 名前解決前のセクター。`tags` は表示順。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedSector {
    pub tags: Vec<TagId>,
    pub items: Vec<ItemId>,
}

/// プランニング過程の統計。ログとメトリクス用。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlanStats {
    pub total_items: usize,
    pub candidates: usize,
    pub edges: usize,
    pub components: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SectorPlan {
    pub sectors: Vec<PlannedSector>,
    pub stats: PlanStats,
}

/// グラフ系ビュー（tagsets / single / overlap）のプランを作る。
///
/// `view=custom` はここでは扱わず、空のプランを返す。
#[must_use]
pub fn plan_sectors(corpus: &CorpusSnapshot, params: &TagMapParams) -> SectorPlan {
    let mut stats = PlanStats {
        total_items: corpus.total_items(),
        ..PlanStats::default()
    };
    if corpus.is_empty() || params.view == ViewMode::Custom {
        return SectorPlan {
            sectors: Vec::new(),
            stats,
        };
    }

    let tuning = Tuning::derive(params.consolidation, &params.overrides);
    let candidates = select_candidates(corpus, params.max_tags, tuning.min_support);
    stats.candidates = candidates.len();
    if candidates.is_empty() {
        return SectorPlan {
            sectors: Vec::new(),
            stats,
        };
    }

    if params.view == ViewMode::Single {
        let sectors = single_tag_sectors(corpus, &candidates, tuning.max_sets_single);
        return SectorPlan { sectors, stats };
    }

    let memberships = candidates.memberships(corpus);
    // 極値の tagsets はグラフを参照しない
    let skips_graph = params.view == ViewMode::Tagsets
        && (tuning.forces_singletons() || tuning.forces_single_component());
    let graph = if skips_graph {
        NeighborGraph::build(candidates.len(), &[], tuning.k)
    } else {
        let pairs = PairCounts::count(&memberships);
        let edges = score_edges(&pairs, &candidates, corpus.total_items(), &tuning);
        stats.edges = edges.len();
        NeighborGraph::build(candidates.len(), &edges, tuning.k)
    };

    let sectors = if params.view == ViewMode::Overlap {
        let components = mutual_components(&candidates, &graph);
        stats.components = components.len();
        OverlapCover::new(corpus, &candidates, &graph, &tuning).build(&components)
    } else {
        let mut components = partition(&candidates, &graph, &tuning);
        stats.components = components.len();
        components.truncate(tuning.max_sets.saturating_mul(3));

        let assigned = assign_items(&memberships, &components, &candidates);
        components
            .iter()
            .zip(assigned)
            .filter(|(_, items)| !items.is_empty())
            .take(tuning.max_sets)
            .map(|(component, mut items)| {
                items.sort_unstable();
                PlannedSector {
                    tags: display_tags(&candidates, &component.members, tuning.max_set_size),
                    items,
                }
            })
            .collect()
    };

    tracing::debug!(
        view = params.view.as_str(),
        consolidation = tuning.consolidation,
        candidates = stats.candidates,
        edges = stats.edges,
        components = stats.components,
        sectors = sectors.len(),
        "sector plan ready"
    );

    SectorPlan { sectors, stats }
}

/// カスタムタグ集合の単一セクター。該当アイテムが無ければ空のプラン。
#[must_use]
pub fn plan_custom_sector(
    corpus: &CorpusSnapshot,
    include: &[TagId],
    exclude: &[TagId],
) -> SectorPlan {
    let stats = PlanStats {
        total_items: corpus.total_items(),
        candidates: include.len(),
        ..PlanStats::default()
    };
    let items = plan_custom(corpus, include, exclude);
    let sectors = if items.is_empty() {
        Vec::new()
    } else {
        vec![PlannedSector {
            // 表示タグは指定順のまま（サポート順に並べ替えない）
            tags: include.to_vec(),
            items,
        }]
    };
    SectorPlan { sectors, stats }
}

/// メンバーをサポート順に並べ、上限で切る。
fn display_tags(candidates: &CandidateSet, members: &[usize], limit: usize) -> Vec<TagId> {
    members
        .iter()
        .take(limit)
        .map(|idx| candidates.get(*idx).tag_id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::synthetic_corpus;

    fn params(view: ViewMode, consolidation: f64) -> TagMapParams {
        TagMapParams {
            view,
            consolidation,
            ..TagMapParams::default()
        }
    }

    #[test]
    fn empty_corpus_plans_nothing() {
        for view in [ViewMode::Tagsets, ViewMode::Single, ViewMode::Overlap] {
            let plan = plan_sectors(&CorpusSnapshot::default(), &params(view, 0.5));
            assert!(plan.sectors.is_empty());
        }
    }

    #[test]
    fn tagsets_view_is_disjoint() {
        let corpus = synthetic_corpus(400, 60, 7);
        let plan = plan_sectors(&corpus, &params(ViewMode::Tagsets, 0.4));
        assert!(!plan.sectors.is_empty());
        let mut all: Vec<ItemId> = plan.sectors.iter().flat_map(|s| s.items.clone()).collect();
        let total = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), total);
        assert!(total <= corpus.total_items());
    }

    #[test]
    fn planning_is_deterministic() {
        let corpus = synthetic_corpus(300, 50, 11);
        for view in [ViewMode::Tagsets, ViewMode::Single, ViewMode::Overlap] {
            let first = plan_sectors(&corpus, &params(view, 0.3));
            let second = plan_sectors(&corpus, &params(view, 0.3));
            assert_eq!(first.sectors, second.sectors);
        }
    }

    #[test]
    fn custom_view_is_not_planned_here() {
        let corpus = synthetic_corpus(50, 10, 3);
        assert!(plan_sectors(&corpus, &params(ViewMode::Custom, 0.5)).sectors.is_empty());
    }

    #[test]
    fn extreme_tagsets_skip_edge_scoring() {
        let corpus = synthetic_corpus(400, 60, 7);
        for consolidation in [0.0, 1.0] {
            let plan = plan_sectors(&corpus, &params(ViewMode::Tagsets, consolidation));
            assert_eq!(plan.stats.edges, 0);
            assert!(!plan.sectors.is_empty());
        }
        let midpoint = plan_sectors(&corpus, &params(ViewMode::Tagsets, 0.5));
        assert!(midpoint.stats.edges > 0);
    }

    #[test]
    fn custom_sector_keeps_include_order() {
        let corpus = CorpusSnapshot::from_pairs([(1, 5), (1, 6), (2, 5)]);
        let plan = plan_custom_sector(&corpus, &[6, 5], &[]);
        assert_eq!(plan.sectors.len(), 1);
        assert_eq!(plan.sectors[0].tags, vec![6, 5]);
        assert_eq!(plan.sectors[0].items, vec![1]);
    }
}
