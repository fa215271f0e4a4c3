//! Sector reporting: item counts, display names and contributor rankings.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::store::models::{ItemId, TagId};

use super::engine::PlannedSector;

/// 空の帰属文字列の表示名。
pub const UNKNOWN_CONTRIBUTOR: &str = "(unknown)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorCount {
    pub name: String,
    pub count: usize,
}

/// クライアントへ返す1セクター。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sector {
    pub id: usize,
    pub tags: Vec<String>,
    pub item_count: usize,
    pub top_contributors: Vec<ContributorCount>,
}

/// `GET /v1/tagmap` のレスポンス本体。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagMapResponse {
    pub sets: Vec<Sector>,
}

/// 帰属文字列をカンマで分割し、1アイテム内で重複を除いた名前を返す。
#[must_use]
pub fn split_attribution(raw: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for part in raw.split(',') {
        let name = part.trim();
        if !name.is_empty() && !names.iter().any(|existing| existing == name) {
            names.push(name.to_string());
        }
    }
    if names.is_empty() {
        names.push(UNKNOWN_CONTRIBUTOR.to_string());
    }
    names
}

/// 件数降順、同数は名前昇順で上位 `limit` 件。
#[must_use]
pub fn rank_contributors<'a, I>(
    items: I,
    attributions: &FxHashMap<ItemId, String>,
    limit: usize,
) -> Vec<ContributorCount>
where
    I: IntoIterator<Item = &'a ItemId>,
{
    let mut counts: FxHashMap<String, usize> = FxHashMap::default();
    for item in items {
        let Some(raw) = attributions.get(item) else {
            continue;
        };
        for name in split_attribution(raw) {
            *counts.entry(name).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<ContributorCount> = counts
        .into_iter()
        .map(|(name, count)| ContributorCount { name, count })
        .collect();
    ranked.sort_unstable_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    ranked.truncate(limit);
    ranked
}

/// プランを出力セクターへ変換する。
///
/// 名前を解決できるタグが1つも無いセクターは捨てる。ID はプラン順に振り、
/// 最後に item_count の降順で安定ソートする。
#[must_use]
pub fn build_sectors(
    plan: &[PlannedSector],
    tag_names: &FxHashMap<TagId, String>,
    attributions: &FxHashMap<ItemId, String>,
    max_contributors: usize,
) -> Vec<Sector> {
    let mut sectors: Vec<Sector> = Vec::with_capacity(plan.len());
    for planned in plan {
        let tags: Vec<String> = planned
            .tags
            .iter()
            .filter_map(|tag| tag_names.get(tag).cloned())
            .collect();
        if tags.is_empty() || planned.items.is_empty() {
            continue;
        }
        sectors.push(Sector {
            id: sectors.len(),
            tags,
            item_count: planned.items.len(),
            top_contributors: rank_contributors(&planned.items, attributions, max_contributors),
        });
    }
    sectors.sort_by(|a, b| b.item_count.cmp(&a.item_count));
    sectors
}
