//! Per-tag top-k neighbor lists.

use std::cmp::Ordering;

use rustc_hash::FxHashSet;

use super::association::AssociationEdge;

/// 近傍タグ1件。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub tag: usize,
    pub npmi: f64,
    pub cooccurrence: u32,
}

/// (npmi, 共起数) の降順。同点は密インデックス昇順。
fn strongest_first(x: &Neighbor, y: &Neighbor) -> Ordering {
    y.npmi
        .total_cmp(&x.npmi)
        .then(y.cooccurrence.cmp(&x.cooccurrence))
        .then(x.tag.cmp(&y.tag))
}

/// 各タグの上位 k 近傍と、相互性判定用のメンバーシップ集合。
#[derive(Debug, Clone, Default)]
pub struct NeighborGraph {
    lists: Vec<Vec<Neighbor>>,
    sets: Vec<FxHashSet<usize>>,
}

impl NeighborGraph {
    #[must_use]
    pub fn build(tag_count: usize, edges: &[AssociationEdge], k: usize) -> Self {
        let mut lists: Vec<Vec<Neighbor>> = vec![Vec::new(); tag_count];
        for edge in edges {
            if edge.a >= tag_count || edge.b >= tag_count || edge.a == edge.b {
                continue;
            }
            lists[edge.a].push(Neighbor {
                tag: edge.b,
                npmi: edge.npmi,
                cooccurrence: edge.cooccurrence,
            });
            lists[edge.b].push(Neighbor {
                tag: edge.a,
                npmi: edge.npmi,
                cooccurrence: edge.cooccurrence,
            });
        }

        for list in &mut lists {
            list.sort_unstable_by(strongest_first);
            list.truncate(k);
        }

        let sets = lists
            .iter()
            .map(|list| list.iter().map(|neighbor| neighbor.tag).collect())
            .collect();

        Self { lists, sets }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    #[must_use]
    pub fn neighbors(&self, tag: usize) -> &[Neighbor] {
        self.lists
            .get(tag)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn contains(&self, tag: usize, other: usize) -> bool {
        self.sets.get(tag).is_some_and(|set| set.contains(&other))
    }

    /// 互いの上位 k に入っているか。
    #[must_use]
    pub fn is_mutual(&self, a: usize, b: usize) -> bool {
        a != b && self.contains(a, b) && self.contains(b, a)
    }

    /// `a` と `b` の両方の近傍に含まれるタグ。結合強度（npmi の和）の降順。
    #[must_use]
    pub fn shared_neighbors(&self, a: usize, b: usize) -> Vec<usize> {
        let mut shared: Vec<(usize, f64)> = self
            .neighbors(a)
            .iter()
            .filter(|neighbor| neighbor.tag != b && self.contains(b, neighbor.tag))
            .map(|neighbor| {
                let via_b = self
                    .neighbors(b)
                    .iter()
                    .find(|other| other.tag == neighbor.tag)
                    .map_or(0.0, |other| other.npmi);
                (neighbor.tag, neighbor.npmi + via_b)
            })
            .filter(|(tag, _)| *tag != a)
            .collect();
        shared.sort_unstable_by(|x, y| y.1.total_cmp(&x.1).then(x.0.cmp(&y.0)));
        shared.into_iter().map(|(tag, _)| tag).collect()
    }

    /// 全リストに含まれる有向エッジ数。
    #[must_use]
    pub fn directed_edge_count(&self) -> usize {
        self.lists.iter().map(Vec::len).sum()
    }
}
