use serde::{Deserialize, Serialize};

/// コーパス内アイテム（ビートマップ）のID。
pub type ItemId = i64;
/// タグのID。
pub type TagId = i64;

/// タグ適用行（読み取り専用ビュー）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TagApplication {
    pub item_id: ItemId,
    pub tag_id: TagId,
    #[serde(default)]
    pub contributor_id: Option<i64>,
    #[serde(default)]
    pub is_negative: bool,
    #[serde(default)]
    pub is_prediction: bool,
}

impl TagApplication {
    /// ユーザーが付与した通常のタグ適用を作成する。
    #[must_use]
    pub fn by_contributor(item_id: ItemId, tag_id: TagId, contributor_id: i64) -> Self {
        Self {
            item_id,
            tag_id,
            contributor_id: Some(contributor_id),
            is_negative: false,
            is_prediction: false,
        }
    }

    /// モデル予測によるタグ適用を作成する（contributor なし）。
    #[must_use]
    pub fn predicted(item_id: ItemId, tag_id: TagId) -> Self {
        Self {
            item_id,
            tag_id,
            contributor_id: None,
            is_negative: false,
            is_prediction: true,
        }
    }

    /// メンバーシップとして数えてよい行かどうか。
    ///
    /// 否定行と、contributor なしの非予測行（レガシー残骸）は除外する。
    #[must_use]
    pub fn counts_as_membership(&self) -> bool {
        if self.is_negative {
            return false;
        }
        !(self.contributor_id.is_none() && !self.is_prediction)
    }
}

/// タグカタログのレコード。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    pub id: TagId,
    pub name: String,
    pub namespace: String,
}

/// アイテムメタデータのレコード。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: ItemId,
    pub status: String,
    /// `listed_owner` があればそれ、なければ `creator`。カンマ区切りで複数名もあり得る。
    #[serde(default)]
    pub attribution: String,
}
