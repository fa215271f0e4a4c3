//! Request parameters for the tag map query.
//!
//! 入力値は決して拒否しない。パースできない値や範囲外の値はデフォルトへ
//! フォールバック、もしくは安全な範囲へクランプする。

use serde::{Deserialize, Serialize};

use super::tuning::TuningOverrides;

pub(crate) const DEFAULT_MAX_TAGS: usize = 150;
pub(crate) const MAX_TAGS_RANGE: (usize, usize) = (20, 400);
pub(crate) const DEFAULT_MAX_MAPPERS: usize = 60;
pub(crate) const MAX_MAPPERS_RANGE: (usize, usize) = (10, 200);
pub const DEFAULT_CONSOLIDATION: f64 = 0.1;

/// タグ／アイテムを分割する名前空間（ゲームモード）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Namespace(String);

impl Namespace {
    pub const DEFAULT: &'static str = "osu";

    /// 別名を正規化する。未知の値は既定値へフォールバックする。
    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        let canonical = match raw.trim().to_lowercase().as_str() {
            "taiko" | "1" => "taiko",
            "fruits" | "catch" | "ctb" | "2" => "fruits",
            "mania" | "3" => "mania",
            _ => Self::DEFAULT,
        };
        Self(canonical.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

/// アイテムのステータスバケット。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    Ranked,
    Unranked,
    All,
}

const RANKED_STATUSES: &[&str] = &["Ranked", "Approved"];
const UNRANKED_STATUSES: &[&str] = &["Graveyard", "WIP", "Pending", "Qualified", "Loved"];

impl StatusFilter {
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|value| value.trim().to_lowercase()).as_deref() {
            Some("unranked") => Self::Unranked,
            Some("all") => Self::All,
            _ => Self::Ranked,
        }
    }

    /// バケットに含まれるステータス値。`None` は無制限を表す。
    #[must_use]
    pub fn statuses(self) -> Option<&'static [&'static str]> {
        match self {
            Self::Ranked => Some(RANKED_STATUSES),
            Self::Unranked => Some(UNRANKED_STATUSES),
            Self::All => None,
        }
    }

    #[must_use]
    pub fn admits(self, status: &str) -> bool {
        self.statuses()
            .is_none_or(|allowed| allowed.iter().any(|candidate| *candidate == status))
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ranked => "ranked",
            Self::Unranked => "unranked",
            Self::All => "all",
        }
    }
}

/// 表示モード。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// 相互 kNN コンポーネントへの排他的割り当て。
    #[default]
    Tagsets,
    /// タグ1つにつき1セクター（重複あり）。
    Single,
    /// マクロコアとトライアドによる重複被覆。
    Overlap,
    /// 明示的な include/exclude タグ集合。
    Custom,
}

impl ViewMode {
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|value| value.trim().to_lowercase()).as_deref() {
            Some("single") => Self::Single,
            Some("overlap") => Self::Overlap,
            Some("custom") => Self::Custom,
            _ => Self::Tagsets,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tagsets => "tagsets",
            Self::Single => "single",
            Self::Overlap => "overlap",
            Self::Custom => "custom",
        }
    }
}

/// クエリ文字列そのまま。数値も文字列で受けて後段で寛容にパースする。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTagMapQuery {
    pub namespace: Option<String>,
    pub mode: Option<String>,
    pub status_filter: Option<String>,
    pub view: Option<String>,
    pub custom_tagset: Option<String>,
    pub consolidation: Option<String>,
    pub max_tags: Option<String>,
    pub max_mappers: Option<String>,
    pub min_support: Option<String>,
    pub min_pair: Option<String>,
    pub edge_threshold: Option<String>,
    pub k: Option<String>,
    pub max_sets: Option<String>,
    pub max_set_size: Option<String>,
    pub max_seed_cores: Option<String>,
    pub macro_size: Option<String>,
    pub max_sets_total: Option<String>,
    pub triad_scan: Option<String>,
}

impl RawTagMapQuery {
    /// キーと値の列から組み立てる。同じキーが重複したら最初の値を採用し、未知のキーは無視する。
    #[must_use]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut raw = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "namespace" => &mut raw.namespace,
                "mode" => &mut raw.mode,
                "status_filter" => &mut raw.status_filter,
                "view" => &mut raw.view,
                "custom_tagset" => &mut raw.custom_tagset,
                "consolidation" => &mut raw.consolidation,
                "max_tags" => &mut raw.max_tags,
                "max_mappers" => &mut raw.max_mappers,
                "min_support" => &mut raw.min_support,
                "min_pair" => &mut raw.min_pair,
                "edge_threshold" => &mut raw.edge_threshold,
                "k" => &mut raw.k,
                "max_sets" => &mut raw.max_sets,
                "max_set_size" => &mut raw.max_set_size,
                "max_seed_cores" => &mut raw.max_seed_cores,
                "macro_size" => &mut raw.macro_size,
                "max_sets_total" => &mut raw.max_sets_total,
                "triad_scan" => &mut raw.triad_scan,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into());
            }
        }
        raw
    }
}

/// 正規化済みのクエリパラメータ。
#[derive(Debug, Clone, PartialEq)]
pub struct TagMapParams {
    pub namespace: Namespace,
    pub status_filter: StatusFilter,
    pub view: ViewMode,
    pub custom_tagset: String,
    pub consolidation: f64,
    pub max_tags: usize,
    pub max_mappers: usize,
    pub overrides: TuningOverrides,
}

impl Default for TagMapParams {
    fn default() -> Self {
        Self {
            namespace: Namespace::default(),
            status_filter: StatusFilter::default(),
            view: ViewMode::default(),
            custom_tagset: String::new(),
            consolidation: DEFAULT_CONSOLIDATION,
            max_tags: DEFAULT_MAX_TAGS,
            max_mappers: DEFAULT_MAX_MAPPERS,
            overrides: TuningOverrides::default(),
        }
    }
}

impl TagMapParams {
    /// 生のクエリから正規化済みパラメータを作る。失敗しない。
    #[must_use]
    pub fn from_query(raw: &RawTagMapQuery, default_consolidation: f64) -> Self {
        let namespace = raw
            .namespace
            .as_deref()
            .or(raw.mode.as_deref())
            .map_or_else(Namespace::default, Namespace::normalize);

        let consolidation = parse_f64(raw.consolidation.as_deref())
            .map_or(default_consolidation, |value| value.clamp(0.0, 1.0));

        let max_tags = clamp_or(
            parse_i64(raw.max_tags.as_deref()),
            DEFAULT_MAX_TAGS,
            MAX_TAGS_RANGE,
        );
        let max_mappers = clamp_or(
            parse_i64(raw.max_mappers.as_deref()),
            DEFAULT_MAX_MAPPERS,
            MAX_MAPPERS_RANGE,
        );

        let overrides = TuningOverrides {
            min_support: parse_i64(raw.min_support.as_deref()),
            min_pair: parse_i64(raw.min_pair.as_deref()),
            edge_threshold: parse_f64(raw.edge_threshold.as_deref()),
            k: parse_i64(raw.k.as_deref()),
            max_sets: parse_i64(raw.max_sets.as_deref()),
            max_set_size: parse_i64(raw.max_set_size.as_deref()),
            max_seed_cores: parse_i64(raw.max_seed_cores.as_deref()),
            macro_size: parse_i64(raw.macro_size.as_deref()),
            max_sets_total: parse_i64(raw.max_sets_total.as_deref()),
            triad_scan: parse_i64(raw.triad_scan.as_deref()),
        };

        Self {
            namespace,
            status_filter: StatusFilter::parse(raw.status_filter.as_deref()),
            view: ViewMode::parse(raw.view.as_deref()),
            custom_tagset: raw
                .custom_tagset
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            consolidation: sanitize_consolidation(consolidation),
            max_tags,
            max_mappers,
            overrides,
        }
    }

    /// カスタムタグ集合モードで処理すべきかどうか。
    #[must_use]
    pub fn is_custom(&self) -> bool {
        !self.custom_tagset.is_empty() || self.view == ViewMode::Custom
    }
}

fn sanitize_consolidation(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        DEFAULT_CONSOLIDATION
    }
}

fn parse_f64(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

fn parse_i64(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_or(value: Option<i64>, default: usize, (lo, hi): (usize, usize)) -> usize {
    value.map_or(default, |value| {
        usize::try_from(value.max(0))
            .unwrap_or(usize::MAX)
            .clamp(lo, hi)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn raw() -> RawTagMapQuery {
        RawTagMapQuery::default()
    }

    #[test]
    fn repeated_keys_keep_the_first_value() {
        let query = RawTagMapQuery::from_pairs([
            ("max_tags", "50"),
            ("view", "single"),
            ("max_tags", "60"),
            ("view", "overlap"),
            ("unknown", "1"),
        ]);
        assert_eq!(query.max_tags.as_deref(), Some("50"));
        assert_eq!(query.view.as_deref(), Some("single"));

        let params = TagMapParams::from_query(&query, 0.1);
        assert_eq!(params.max_tags, 50);
        assert_eq!(params.view, ViewMode::Single);
    }

    #[test]
    fn defaults_apply_when_nothing_is_given() {
        let params = TagMapParams::from_query(&raw(), 0.1);
        assert_eq!(params.namespace.as_str(), "osu");
        assert_eq!(params.status_filter, StatusFilter::Ranked);
        assert_eq!(params.view, ViewMode::Tagsets);
        assert_eq!(params.max_tags, 150);
        assert_eq!(params.max_mappers, 60);
        assert!((params.consolidation - 0.1).abs() < f64::EPSILON);
        assert!(!params.is_custom());
    }

    #[rstest]
    #[case("5", 20)]
    #[case("1000", 400)]
    #[case("abc", 150)]
    #[case(" 77 ", 77)]
    fn max_tags_is_clamped_or_defaulted(#[case] input: &str, #[case] expected: usize) {
        let query = RawTagMapQuery {
            max_tags: Some(input.to_string()),
            ..raw()
        };
        assert_eq!(TagMapParams::from_query(&query, 0.1).max_tags, expected);
    }

    #[rstest]
    #[case("1", 10)]
    #[case("999", 200)]
    #[case("", 60)]
    fn max_mappers_is_clamped_or_defaulted(#[case] input: &str, #[case] expected: usize) {
        let query = RawTagMapQuery {
            max_mappers: Some(input.to_string()),
            ..raw()
        };
        assert_eq!(TagMapParams::from_query(&query, 0.1).max_mappers, expected);
    }

    #[rstest]
    #[case("1.7", 1.0)]
    #[case("-3", 0.0)]
    #[case("NaN", 0.25)]
    #[case("inf", 0.25)]
    #[case("oops", 0.25)]
    #[case("0.5", 0.5)]
    fn consolidation_is_clamped_or_defaulted(#[case] input: &str, #[case] expected: f64) {
        let query = RawTagMapQuery {
            consolidation: Some(input.to_string()),
            ..raw()
        };
        let params = TagMapParams::from_query(&query, 0.25);
        assert!((params.consolidation - expected).abs() < 1e-12);
    }

    #[rstest]
    #[case("Mania", "mania")]
    #[case("ctb", "fruits")]
    #[case("1", "taiko")]
    #[case("std", "osu")]
    #[case("something-else", "osu")]
    fn namespace_aliases_normalize(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(Namespace::normalize(input).as_str(), expected);
    }

    #[test]
    fn mode_is_accepted_as_namespace_alias() {
        let query = RawTagMapQuery {
            mode: Some("taiko".into()),
            ..raw()
        };
        assert_eq!(TagMapParams::from_query(&query, 0.1).namespace.as_str(), "taiko");
    }

    #[test]
    fn unknown_enums_fall_back() {
        let query = RawTagMapQuery {
            view: Some("treemap".into()),
            status_filter: Some("weird".into()),
            ..raw()
        };
        let params = TagMapParams::from_query(&query, 0.1);
        assert_eq!(params.view, ViewMode::Tagsets);
        assert_eq!(params.status_filter, StatusFilter::Ranked);
    }

    #[test]
    fn custom_tagset_forces_custom_mode() {
        let query = RawTagMapQuery {
            custom_tagset: Some("  jump -stream ".into()),
            view: Some("overlap".into()),
            ..raw()
        };
        let params = TagMapParams::from_query(&query, 0.1);
        assert!(params.is_custom());
        assert_eq!(params.custom_tagset, "jump -stream");
    }

    #[test]
    fn status_buckets_admit_expected_values() {
        assert!(StatusFilter::Ranked.admits("Approved"));
        assert!(!StatusFilter::Ranked.admits("Loved"));
        assert!(StatusFilter::Unranked.admits("Loved"));
        assert!(StatusFilter::All.admits("anything"));
    }

    #[test]
    fn garbage_overrides_are_ignored() {
        let query = RawTagMapQuery {
            min_support: Some("x".into()),
            edge_threshold: Some("NaN".into()),
            k: Some("12".into()),
            ..raw()
        };
        let params = TagMapParams::from_query(&query, 0.1);
        assert_eq!(params.overrides.min_support, None);
        assert_eq!(params.overrides.edge_threshold, None);
        assert_eq!(params.overrides.k, Some(12));
    }
}
