//! Custom tagset mode: explicit include/exclude set arithmetic.

use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashSet;

use crate::store::models::{ItemId, TagId};

use super::corpus::CorpusSnapshot;

/// `-` 付きは除外、`.` 付き・無印は包含。ダブルクォートで複数語のタグを書ける。
static TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[-.]?"[^"]+"|[-.]?[^"\s]+"#).expect("compile custom tagset pattern")
});

/// パース済みのカスタムタグ集合（小文字化済みのタグ名）。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomTagset {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl CustomTagset {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut tagset = Self::default();
        for found in TOKEN_PATTERN.find_iter(raw) {
            let token = found.as_str().trim();
            let (exclude, body) = match token.chars().next() {
                Some('-') => (true, &token[1..]),
                Some('.') => (false, &token[1..]),
                _ => (false, token),
            };
            let name = body
                .trim()
                .trim_matches('"')
                .trim_matches('\'')
                .trim()
                .to_lowercase();
            if name.is_empty() {
                continue;
            }
            let bucket = if exclude {
                &mut tagset.exclude
            } else {
                &mut tagset.include
            };
            if !bucket.contains(&name) {
                bucket.push(name);
            }
        }
        tagset
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.include.is_empty()
    }

    /// 名前解決に必要な全タグ名。
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.include.iter().chain(&self.exclude).cloned().collect()
    }
}

/// 包含タグの積集合から除外タグの和集合を引いたアイテム（ID 昇順）。
///
/// 包含タグが無い、またはアイテムを持たない包含タグがある場合は空。
#[must_use]
pub fn plan_custom(
    corpus: &CorpusSnapshot,
    include: &[TagId],
    exclude: &[TagId],
) -> Vec<ItemId> {
    if include.is_empty() {
        return Vec::new();
    }
    let Some(mut sets) = include
        .iter()
        .map(|tag| corpus.items_with(*tag).filter(|items| !items.is_empty()))
        .collect::<Option<Vec<&FxHashSet<ItemId>>>>()
    else {
        return Vec::new();
    };
    sets.sort_unstable_by_key(|set| set.len());
    let Some((base, rest)) = sets.split_first() else {
        return Vec::new();
    };

    let excluded: FxHashSet<ItemId> = exclude
        .iter()
        .filter_map(|tag| corpus.items_with(*tag))
        .flatten()
        .copied()
        .collect();

    let mut items: Vec<ItemId> = base
        .iter()
        .filter(|item| rest.iter().all(|set| set.contains(*item)) && !excluded.contains(*item))
        .copied()
        .collect();
    items.sort_unstable();
    items
}
