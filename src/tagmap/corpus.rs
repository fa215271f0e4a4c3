//! Query-scoped snapshot of tag memberships.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::store::models::{ItemId, TagApplication, TagId};

/// 1アイテムが持つタグ列（重複なし・昇順）。
pub type TagList = SmallVec<[TagId; 8]>;

/// フィルタ済みコーパスのメンバーシップ。
///
/// クエリ開始時に構築し、終了時に破棄する。
#[derive(Debug, Clone, Default)]
pub struct CorpusSnapshot {
    item_tags: FxHashMap<ItemId, TagList>,
    tag_items: FxHashMap<TagId, FxHashSet<ItemId>>,
}

impl CorpusSnapshot {
    /// タグ適用行からスナップショットを作る。
    ///
    /// 否定行・レガシー行は捨て、同じ (item, tag) の重複行は1つにまとめる。
    #[must_use]
    pub fn from_applications<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a TagApplication>,
    {
        let mut item_tags: FxHashMap<ItemId, TagList> = FxHashMap::default();
        let mut tag_items: FxHashMap<TagId, FxHashSet<ItemId>> = FxHashMap::default();

        for row in rows {
            if !row.counts_as_membership() {
                continue;
            }
            if tag_items.entry(row.tag_id).or_default().insert(row.item_id) {
                item_tags.entry(row.item_id).or_default().push(row.tag_id);
            }
        }

        for tags in item_tags.values_mut() {
            tags.sort_unstable();
        }

        Self {
            item_tags,
            tag_items,
        }
    }

    /// (item, tag) の組から直接作る。テストやベンチマーク用。
    #[must_use]
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (ItemId, TagId)>,
    {
        let rows: Vec<TagApplication> = pairs
            .into_iter()
            .map(|(item, tag)| TagApplication::predicted(item, tag))
            .collect();
        Self::from_applications(&rows)
    }

    /// フィルタ済みコーパスの異なりアイテム数 N。
    #[must_use]
    pub fn total_items(&self) -> usize {
        self.item_tags.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.item_tags.is_empty()
    }

    /// タグのサポート（そのタグを持つ異なりアイテム数）。
    #[must_use]
    pub fn support(&self, tag: TagId) -> usize {
        self.tag_items.get(&tag).map_or(0, FxHashSet::len)
    }

    /// サポート降順（同数はタグID昇順）のタグ一覧。
    #[must_use]
    pub fn support_ranking(&self) -> Vec<(TagId, usize)> {
        let mut ranking: Vec<(TagId, usize)> = self
            .tag_items
            .iter()
            .map(|(tag, items)| (*tag, items.len()))
            .collect();
        ranking.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranking
    }

    #[must_use]
    pub fn items_with(&self, tag: TagId) -> Option<&FxHashSet<ItemId>> {
        self.tag_items.get(&tag)
    }

    #[must_use]
    pub fn tags_of(&self, item: ItemId) -> &[TagId] {
        self.item_tags
            .get(&item)
            .map(SmallVec::as_slice)
            .unwrap_or_default()
    }

    /// アイテムとそのタグ列を、アイテムID昇順で走査する。
    pub fn items(&self) -> impl Iterator<Item = (ItemId, &[TagId])> {
        let mut ids: Vec<ItemId> = self.item_tags.keys().copied().collect();
        ids.sort_unstable();
        ids.into_iter().map(move |id| (id, self.tags_of(id)))
    }
}
