//! Overlapping cover: macro cores and triads sized by exact intersection.
//!
//! このビューではアイテムが複数のセクターに属してよい。セクターのアイテムは
//! 全タグを持つアイテムの完全な積集合で決まる。

use rustc_hash::FxHashSet;

use crate::store::models::ItemId;

use super::candidates::CandidateSet;
use super::components::Component;
use super::corpus::CorpusSnapshot;
use super::engine::PlannedSector;
use super::neighbors::NeighborGraph;
use super::tuning::Tuning;

/// 重複被覆を構成するタグ集合の生成器。タグは密インデックスで扱う。
pub struct OverlapCover<'a> {
    corpus: &'a CorpusSnapshot,
    candidates: &'a CandidateSet,
    graph: &'a NeighborGraph,
    tuning: &'a Tuning,
    seen: FxHashSet<Vec<usize>>,
    tagsets: Vec<Vec<usize>>,
}

impl<'a> OverlapCover<'a> {
    #[must_use]
    pub fn new(
        corpus: &'a CorpusSnapshot,
        candidates: &'a CandidateSet,
        graph: &'a NeighborGraph,
        tuning: &'a Tuning,
    ) -> Self {
        Self {
            corpus,
            candidates,
            graph,
            tuning,
            seen: FxHashSet::default(),
            tagsets: Vec::new(),
        }
    }

    /// マクロコアとトライアドを生成し、積集合が空でないものをセクターにする。
    #[must_use]
    pub fn build(mut self, components: &[Component]) -> Vec<PlannedSector> {
        self.macro_cores(components);
        self.triads();
        tracing::debug!(tagsets = self.tagsets.len(), "overlap tagsets generated");

        let tagsets = std::mem::take(&mut self.tagsets);
        tagsets
            .into_iter()
            .filter_map(|tagset| {
                let items = self.intersection(&tagset);
                if items.is_empty() {
                    return None;
                }
                Some(PlannedSector {
                    tags: tagset
                        .iter()
                        .map(|idx| self.candidates.get(*idx).tag_id)
                        .collect(),
                    items,
                })
            })
            .collect()
    }

    fn is_full(&self) -> bool {
        self.tagsets.len() >= self.tuning.max_sets_total
    }

    /// 署名（ソート済みインデックス）で重複を除いて追加する。
    fn push(&mut self, mut tagset: Vec<usize>) -> bool {
        tagset.sort_unstable();
        tagset.dedup();
        if tagset.len() < 2 || self.is_full() || self.seen.contains(&tagset) {
            return false;
        }
        self.seen.insert(tagset.clone());
        self.tagsets.push(tagset);
        true
    }

    fn macro_cores(&mut self, components: &[Component]) {
        let seeds = self.tuning.max_seed_cores.min(self.candidates.len());
        for seed in 0..seeds {
            let Some(component) = components.iter().find(|c| c.contains(seed)) else {
                continue;
            };
            let mut core = vec![seed];
            for neighbor in self.graph.neighbors(seed) {
                if core.len() >= self.tuning.macro_size {
                    break;
                }
                if component.contains(neighbor.tag)
                    && self.graph.is_mutual(seed, neighbor.tag)
                    && !core.contains(&neighbor.tag)
                {
                    core.push(neighbor.tag);
                }
            }
            // 近傍が足りなければコンポーネント内のサポート上位で埋める
            for &member in &component.members {
                if core.len() >= self.tuning.macro_size {
                    break;
                }
                if !core.contains(&member) {
                    core.push(member);
                }
            }
            self.push(core);
            if self.is_full() {
                return;
            }
        }
    }

    fn triads(&mut self) {
        let mut edges: Vec<(usize, usize, f64, u32)> = Vec::new();
        let mut edge_seen: FxHashSet<(usize, usize)> = FxHashSet::default();
        for a in 0..self.graph.len() {
            for neighbor in self.graph.neighbors(a).iter().take(self.tuning.triad_scan) {
                let key = (a.min(neighbor.tag), a.max(neighbor.tag));
                if edge_seen.insert(key) {
                    edges.push((key.0, key.1, neighbor.npmi, neighbor.cooccurrence));
                }
            }
        }
        edges.sort_unstable_by(|x, y| {
            y.2.total_cmp(&x.2)
                .then(y.3.cmp(&x.3))
                .then((x.0, x.1).cmp(&(y.0, y.1)))
        });

        for (a, b, _, _) in edges {
            if self.is_full() {
                return;
            }
            for c in self.graph.shared_neighbors(a, b) {
                let mut signature = vec![a, b, c];
                signature.sort_unstable();
                if self.seen.contains(&signature) {
                    continue;
                }
                if self.intersection_len(&signature) >= self.tuning.min_pair {
                    self.push(signature);
                    break;
                }
            }
        }
    }

    fn item_sets(&self, tagset: &[usize]) -> Option<Vec<&'a FxHashSet<ItemId>>> {
        let corpus = self.corpus;
        let mut sets = tagset
            .iter()
            .map(|idx| corpus.items_with(self.candidates.get(*idx).tag_id))
            .collect::<Option<Vec<_>>>()?;
        sets.sort_unstable_by_key(|set| set.len());
        Some(sets)
    }

    fn intersection_len(&self, tagset: &[usize]) -> usize {
        let Some(sets) = self.item_sets(tagset) else {
            return 0;
        };
        let Some((base, rest)) = sets.split_first() else {
            return 0;
        };
        base.iter()
            .filter(|item| rest.iter().all(|set| set.contains(*item)))
            .count()
    }

    /// タグ集合の全タグを持つアイテム（ID 昇順）。
    fn intersection(&self, tagset: &[usize]) -> Vec<ItemId> {
        let Some(sets) = self.item_sets(tagset) else {
            return Vec::new();
        };
        let Some((base, rest)) = sets.split_first() else {
            return Vec::new();
        };
        let mut items: Vec<ItemId> = base
            .iter()
            .filter(|item| rest.iter().all(|set| set.contains(*item)))
            .copied()
            .collect();
        items.sort_unstable();
        items
    }
}
