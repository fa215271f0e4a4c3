//! Corpus DAO trait and its implementations.
//!
//! エンジンは一括読み込みだけを前提にする。アイテム単位の往復は行わない。

mod memory;
mod postgres;

use anyhow::Result;
use async_trait::async_trait;
use rustc_hash::FxHashMap;

use super::models::{ItemId, TagApplication, TagId};
use crate::tagmap::params::{Namespace, StatusFilter};

pub use memory::{CorpusDataset, InMemoryCorpusDao};
pub use postgres::PgCorpusDao;

/// 1ステートメントで渡すIDの上限。
pub const ID_CHUNK_SIZE: usize = 5000;

/// CorpusDao - タグ適用・タグカタログ・アイテムメタデータへの読み取り専用アクセス
#[async_trait]
pub trait CorpusDao: Send + Sync {
    /// ストアへの疎通確認。
    async fn ping(&self) -> Result<()>;

    /// 名前空間とステータスバケットに一致するタグ適用行を一括で読み込む。
    async fn load_applications(
        &self,
        namespace: &Namespace,
        status_filter: StatusFilter,
    ) -> Result<Vec<TagApplication>>;

    /// タグID → タグ名。
    async fn tag_names(&self, tag_ids: &[TagId]) -> Result<FxHashMap<TagId, String>>;

    /// 名前空間内のタグ名 → タグID（カスタムタグ集合用）。
    async fn resolve_tag_ids(
        &self,
        namespace: &Namespace,
        names: &[String],
    ) -> Result<FxHashMap<String, TagId>>;

    /// アイテムID → 帰属文字列。
    async fn item_attributions(&self, item_ids: &[ItemId]) -> Result<FxHashMap<ItemId, String>>;
}
