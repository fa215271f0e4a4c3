//! Pairwise co-occurrence counting and NPMI association scores.

use rustc_hash::FxHashMap;

use crate::store::models::ItemId;

use super::candidates::CandidateSet;
use super::tuning::Tuning;

/// log(0) を避けるための微小値。
pub const NPMI_EPSILON: f64 = 1e-12;

/// 2タグ間の関連エッジ（`a < b` の密インデックス）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssociationEdge {
    pub a: usize,
    pub b: usize,
    pub cooccurrence: u32,
    pub npmi: f64,
}

/// 候補タグ間の共起数。キーは `(a, b)`、`a < b`。
#[derive(Debug, Clone, Default)]
pub struct PairCounts {
    counts: FxHashMap<(usize, usize), u32>,
}

impl PairCounts {
    /// アイテムごとの候補タグ集合（重複なし・昇順）から共起を数える。
    ///
    /// 1アイテムにつき1ペア1回だけ加算する。
    #[must_use]
    pub fn count(memberships: &[(ItemId, Vec<usize>)]) -> Self {
        let mut counts: FxHashMap<(usize, usize), u32> = FxHashMap::default();
        for (_, tags) in memberships {
            if tags.len() < 2 {
                continue;
            }
            for (i, &a) in tags.iter().enumerate() {
                for &b in &tags[i + 1..] {
                    *counts.entry((a, b)).or_insert(0) += 1;
                }
            }
        }
        Self { counts }
    }

    #[must_use]
    pub fn get(&self, a: usize, b: usize) -> u32 {
        let key = if a < b { (a, b) } else { (b, a) };
        self.counts.get(&key).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), u32)> + '_ {
        self.counts.iter().map(|(key, count)| (*key, *count))
    }
}

/// 正規化自己相互情報量（NPMI）。
///
/// 引数の順序に依存しない。`total` が 0 などで計算できない場合は `None`。
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn npmi(cooccurrence: usize, support_a: usize, support_b: usize, total: usize) -> Option<f64> {
    if total == 0 || cooccurrence == 0 || support_a == 0 || support_b == 0 {
        return None;
    }
    let n = total as f64;
    let p_ab = cooccurrence as f64 / n;
    let p_a = support_a as f64 / n;
    let p_b = support_b as f64 / n;

    let pmi = ((p_ab + NPMI_EPSILON) / (p_a * p_b + NPMI_EPSILON)).ln();
    let denom = -(p_ab + NPMI_EPSILON).ln();
    let score = if denom > 0.0 { pmi / denom } else { 0.0 };
    score.is_finite().then_some(score)
}

/// 閾値を通過したエッジを列挙する。
///
/// `min_pair` 未満の共起はスコア計算前に捨て、`edge_threshold` 未満の NPMI も捨てる。
#[must_use]
pub fn score_edges(
    pairs: &PairCounts,
    candidates: &CandidateSet,
    total_items: usize,
    tuning: &Tuning,
) -> Vec<AssociationEdge> {
    let mut edges: Vec<AssociationEdge> = pairs
        .iter()
        .filter(|(_, count)| *count as usize >= tuning.min_pair)
        .filter_map(|((a, b), count)| {
            let score = npmi(
                count as usize,
                candidates.get(a).support,
                candidates.get(b).support,
                total_items,
            )?;
            (score >= tuning.edge_threshold).then_some(AssociationEdge {
                a,
                b,
                cooccurrence: count,
                npmi: score,
            })
        })
        .collect();
    edges.sort_unstable_by(|x, y| (x.a, x.b).cmp(&(y.a, y.b)));
    edges
}
