//! Thresholds derived from the consolidation knob.

/// 上級者向けの個別オーバーライド（未クランプ）。
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TuningOverrides {
    pub min_support: Option<i64>,
    pub min_pair: Option<i64>,
    pub edge_threshold: Option<f64>,
    pub k: Option<i64>,
    pub max_sets: Option<i64>,
    pub max_set_size: Option<i64>,
    pub max_seed_cores: Option<i64>,
    pub macro_size: Option<i64>,
    pub max_sets_total: Option<i64>,
    pub triad_scan: Option<i64>,
}

/// 1クエリ分の閾値一式。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuning {
    pub consolidation: f64,
    /// 候補タグになるための最小サポート。
    pub min_support: usize,
    /// エッジ／トライアドに必要な最小共起数。
    pub min_pair: usize,
    /// NPMI の下限。
    pub edge_threshold: f64,
    /// タグごとに保持する近傍数。
    pub k: usize,
    /// tagsets ビューのセクター上限。
    pub max_sets: usize,
    /// tagsets ビューで表示するタグ数。
    pub max_set_size: usize,
    /// single ビューのセクター上限。
    pub max_sets_single: usize,
    /// overlap ビューのシード数。
    pub max_seed_cores: usize,
    /// マクロコアのタグ数。
    pub macro_size: usize,
    /// overlap ビューのタグ集合上限。
    pub max_sets_total: usize,
    /// トライアド生成時にタグごとに走査するエッジ数。
    pub triad_scan: usize,
}

/// 完全分割を強制する consolidation の上限。
pub const STRICT_CONSOLIDATION: f64 = 0.01;
/// 単一コンポーネントを強制する consolidation の下限。
pub const MEGA_CONSOLIDATION: f64 = 0.99;

impl Tuning {
    #[must_use]
    pub fn derive(consolidation: f64, overrides: &TuningOverrides) -> Self {
        let c = if consolidation.is_finite() {
            consolidation.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let loose = 1.0 - c;

        let min_support = round_usize(3.0 + 12.0 * loose).max(2);
        let min_pair = round_usize(2.0 + 8.0 * loose).max(2);
        let edge_threshold = (0.35 - 0.30 * c).max(0.05);
        let k = round_usize(4.0 + 14.0 * c).clamp(3, 24);
        let max_sets = round_usize(12.0 + 48.0 * loose).clamp(6, 80);
        let max_set_size = round_usize(6.0 + 6.0 * c).clamp(4, 14);
        let max_sets_single = round_usize(18.0 + 90.0 * loose).clamp(6, 120);
        let max_seed_cores = round_usize(10.0 + 12.0 * c).clamp(6, 30);
        let macro_size = round_usize(4.0 + 2.0 * c).clamp(3, 6);
        let max_sets_total = round_usize(100.0 + 120.0 * loose).clamp(80, 220);
        let triad_scan = round_usize(6.0 + 6.0 * c).clamp(4, 12);

        Self {
            consolidation: c,
            min_support: pick(overrides.min_support, min_support, 2, 10_000),
            min_pair: pick(overrides.min_pair, min_pair, 2, 10_000),
            edge_threshold: overrides
                .edge_threshold
                .filter(|value| value.is_finite())
                .map_or(edge_threshold, |value| value.clamp(-1.0, 1.0)),
            k: pick(overrides.k, k, 1, 64),
            max_sets: pick(overrides.max_sets, max_sets, 1, 200),
            max_set_size: pick(overrides.max_set_size, max_set_size, 1, 32),
            max_sets_single,
            max_seed_cores: pick(overrides.max_seed_cores, max_seed_cores, 1, 60),
            macro_size: pick(overrides.macro_size, macro_size, 3, 10),
            max_sets_total: pick(overrides.max_sets_total, max_sets_total, 10, 400),
            triad_scan: pick(overrides.triad_scan, triad_scan, 1, 64),
        }
    }

    /// 各タグを単独コンポーネントにする（最大限の断片化）。
    #[must_use]
    pub fn forces_singletons(&self) -> bool {
        self.consolidation <= STRICT_CONSOLIDATION
    }

    /// 全候補を1コンポーネントにまとめる（最大限の統合）。
    #[must_use]
    pub fn forces_single_component(&self) -> bool {
        self.consolidation >= MEGA_CONSOLIDATION
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_usize(value: f64) -> usize {
    value.round().max(0.0) as usize
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn pick(value: Option<i64>, default: usize, lo: i64, hi: i64) -> usize {
    value.map_or(default, |raw| raw.clamp(lo, hi) as usize)
}
