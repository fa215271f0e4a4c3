//! Candidate tag selection.

use rustc_hash::FxHashMap;

use crate::store::models::{ItemId, TagId};

use super::corpus::CorpusSnapshot;

/// フォールバック判定に使う最小候補数。
const MIN_CANDIDATES: usize = 25;
/// サポート上位から走査するタグ数（`max_tags` の倍数）。
const SCAN_FACTOR: usize = 3;

/// 参加タグとそのサポート。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateTag {
    pub tag_id: TagId,
    pub support: usize,
}

/// サポート降順に並んだ候補タグ。位置が密なインデックスになる。
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    tags: Vec<CandidateTag>,
    index: FxHashMap<TagId, usize>,
}

impl CandidateSet {
    #[must_use]
    pub fn new(tags: Vec<CandidateTag>) -> Self {
        let index = tags
            .iter()
            .enumerate()
            .map(|(idx, tag)| (tag.tag_id, idx))
            .collect();
        Self { tags, index }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    #[must_use]
    pub fn tags(&self) -> &[CandidateTag] {
        &self.tags
    }

    #[must_use]
    pub fn get(&self, idx: usize) -> CandidateTag {
        self.tags[idx]
    }

    #[must_use]
    pub fn index_of(&self, tag: TagId) -> Option<usize> {
        self.index.get(&tag).copied()
    }

    /// 各アイテムの候補タグを密インデックス（昇順）で返す。候補を持たないアイテムは含まない。
    #[must_use]
    pub fn memberships(&self, corpus: &CorpusSnapshot) -> Vec<(ItemId, Vec<usize>)> {
        corpus
            .items()
            .filter_map(|(item, tags)| {
                let mut dense: Vec<usize> =
                    tags.iter().filter_map(|tag| self.index_of(*tag)).collect();
                if dense.is_empty() {
                    return None;
                }
                dense.sort_unstable();
                dense.dedup();
                Some((item, dense))
            })
            .collect()
    }
}

/// サポート閾値で候補タグを選ぶ。
///
/// `min_support` を満たすタグを最大 `max_tags` 件採用する。生き残りが
/// `min(25, max_tags)` 未満ならサポート上位 `max_tags` 件へフォールバックする。
#[must_use]
pub fn select_candidates(
    corpus: &CorpusSnapshot,
    max_tags: usize,
    min_support: usize,
) -> CandidateSet {
    if corpus.is_empty() || max_tags == 0 {
        return CandidateSet::default();
    }

    let ranking = corpus.support_ranking();
    let scanned = &ranking[..ranking.len().min(max_tags.saturating_mul(SCAN_FACTOR))];

    let mut picked: Vec<CandidateTag> = scanned
        .iter()
        .filter(|(_, support)| *support >= min_support)
        .map(|&(tag_id, support)| CandidateTag { tag_id, support })
        .collect();

    if picked.len() < MIN_CANDIDATES.min(max_tags) {
        tracing::debug!(
            survivors = picked.len(),
            min_support,
            "candidate bar too strict; falling back to top tags by support"
        );
        picked = scanned
            .iter()
            .take(max_tags)
            .map(|&(tag_id, support)| CandidateTag { tag_id, support })
            .collect();
    }
    picked.truncate(max_tags);

    CandidateSet::new(picked)
}
