//! Mutual-kNN components via union-find.

use petgraph::unionfind::UnionFind;
use rustc_hash::FxHashMap;

use super::candidates::CandidateSet;
use super::neighbors::NeighborGraph;
use super::tuning::Tuning;

/// 相互近傍で連結されたタグ群。メンバーは密インデックス昇順（＝サポート降順）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub members: Vec<usize>,
    /// メンバーのサポート合計。
    pub mass: usize,
}

impl Component {
    fn new(mut members: Vec<usize>, candidates: &CandidateSet) -> Self {
        members.sort_unstable();
        let mass = members.iter().map(|idx| candidates.get(*idx).support).sum();
        Self { members, mass }
    }

    #[must_use]
    pub fn contains(&self, tag: usize) -> bool {
        self.members.binary_search(&tag).is_ok()
    }

    /// 最もサポートの大きいメンバー。
    #[must_use]
    pub fn anchor(&self) -> usize {
        self.members.first().copied().unwrap_or(usize::MAX)
    }
}

/// 相互 kNN エッジだけを union して連結成分を求める。
///
/// 結果はサポート合計の降順（同値は代表タグのサポート順）。
#[must_use]
pub fn mutual_components(candidates: &CandidateSet, graph: &NeighborGraph) -> Vec<Component> {
    let n = candidates.len();
    let mut sets: UnionFind<usize> = UnionFind::new(n);

    for a in 0..n.min(graph.len()) {
        for neighbor in graph.neighbors(a) {
            if graph.is_mutual(a, neighbor.tag) {
                sets.union(a, neighbor.tag);
            }
        }
    }

    let mut grouped: FxHashMap<usize, Vec<usize>> = FxHashMap::default();
    for (idx, root) in sets.into_labeling().into_iter().enumerate() {
        grouped.entry(root).or_default().push(idx);
    }

    sort_by_mass(
        grouped
            .into_values()
            .map(|members| Component::new(members, candidates))
            .collect(),
    )
}

/// consolidation に応じてタグを分割する。
///
/// 下限付近では全タグを単独成分に、上限付近では全候補を1成分にし、グラフは使わない。
#[must_use]
pub fn partition(
    candidates: &CandidateSet,
    graph: &NeighborGraph,
    tuning: &Tuning,
) -> Vec<Component> {
    if candidates.is_empty() {
        return Vec::new();
    }
    if tuning.forces_singletons() {
        return (0..candidates.len())
            .map(|idx| Component::new(vec![idx], candidates))
            .collect();
    }
    if tuning.forces_single_component() {
        return vec![Component::new((0..candidates.len()).collect(), candidates)];
    }
    mutual_components(candidates, graph)
}

fn sort_by_mass(mut components: Vec<Component>) -> Vec<Component> {
    components.sort_unstable_by(|x, y| y.mass.cmp(&x.mass).then(x.anchor().cmp(&y.anchor())));
    components
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tagmap::association::AssociationEdge;
    use crate::tagmap::candidates::CandidateTag;
    use crate::tagmap::tuning::TuningOverrides;

    fn candidates(supports: &[usize]) -> CandidateSet {
        CandidateSet::new(
            supports
                .iter()
                .enumerate()
                .map(|(idx, support)| CandidateTag {
                    tag_id: i64::try_from(idx).expect("small index") + 100,
                    support: *support,
                })
                .collect(),
        )
    }

    fn edge(a: usize, b: usize, npmi: f64) -> AssociationEdge {
        AssociationEdge {
            a,
            b,
            cooccurrence: 10,
            npmi,
        }
    }

    #[test]
    fn mutual_edges_merge_tags() {
        let set = candidates(&[50, 40, 30, 20]);
        let graph = NeighborGraph::build(4, &[edge(0, 1, 0.8), edge(2, 3, 0.7)], 4);
        let components = mutual_components(&set, &graph);
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].members, vec![0, 1]);
        assert_eq!(components[0].mass, 90);
        assert_eq!(components[1].members, vec![2, 3]);
    }

    #[test]
    fn hub_cannot_bridge_through_one_way_edges() {
        // タグ0 はハブ。k=1 なので 0 の上位は 1 だけ、2 と 3 からの矢印は片道になる
        let set = candidates(&[100, 30, 20, 10]);
        let edges = vec![
            edge(0, 1, 0.9),
            edge(0, 2, 0.6),
            edge(0, 3, 0.5),
        ];
        let graph = NeighborGraph::build(4, &edges, 1);
        let components = mutual_components(&set, &graph);
        assert_eq!(components.len(), 3);
        assert_eq!(components[0].members, vec![0, 1]);
        assert!(components.iter().any(|c| c.members == vec![2]));
        assert!(components.iter().any(|c| c.members == vec![3]));
    }

    #[test]
    fn extreme_consolidation_bypasses_the_graph() {
        let set = candidates(&[5, 4, 3]);
        let graph = NeighborGraph::build(3, &[edge(0, 1, 0.9)], 3);

        let strict = Tuning::derive(0.0, &TuningOverrides::default());
        let singletons = partition(&set, &graph, &strict);
        assert_eq!(singletons.len(), 3);
        assert!(singletons.iter().all(|c| c.members.len() == 1));

        let mega = Tuning::derive(1.0, &TuningOverrides::default());
        let merged = partition(&set, &graph, &mega);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].members, vec![0, 1, 2]);
        assert_eq!(merged[0].mass, 12);
    }

    #[test]
    fn components_cover_every_candidate_once() {
        let set = candidates(&[9, 8, 7, 6, 5, 4]);
        let edges = vec![edge(0, 2, 0.5), edge(2, 4, 0.5), edge(1, 3, 0.4)];
        let graph = NeighborGraph::build(6, &edges, 5);
        let components = mutual_components(&set, &graph);
        let mut seen: Vec<usize> = components.iter().flat_map(|c| c.members.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(components[0].members, vec![0, 2, 4]);
    }
}
