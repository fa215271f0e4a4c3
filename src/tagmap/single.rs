//! Single-tag view: one sector per candidate tag.

use super::candidates::CandidateSet;
use super::corpus::CorpusSnapshot;
use super::engine::PlannedSector;

/// 候補タグごとに1セクター。アイテムは重複してよい。
#[must_use]
pub fn single_tag_sectors(
    corpus: &CorpusSnapshot,
    candidates: &CandidateSet,
    max_sets: usize,
) -> Vec<PlannedSector> {
    candidates
        .tags()
        .iter()
        .filter_map(|tag| {
            let mut items: Vec<_> = corpus.items_with(tag.tag_id)?.iter().copied().collect();
            items.sort_unstable();
            Some(PlannedSector {
                tags: vec![tag.tag_id],
                items,
            })
        })
        .take(max_sets)
        .collect()
}
