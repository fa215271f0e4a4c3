//! In-memory corpus accessor backed by a JSON dataset dump.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::CorpusDao;
use crate::store::models::{ItemId, ItemRecord, TagApplication, TagId, TagRecord};
use crate::tagmap::params::{Namespace, StatusFilter};

/// コーパスのダンプ。リプレイ・テスト・ベンチマークで使う。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorpusDataset {
    #[serde(default)]
    pub applications: Vec<TagApplication>,
    #[serde(default)]
    pub tags: Vec<TagRecord>,
    #[serde(default)]
    pub items: Vec<ItemRecord>,
}

impl CorpusDataset {
    /// JSON ファイルからデータセットを読み込む。
    ///
    /// # Errors
    /// ファイルが開けない、または JSON として不正な場合はエラーを返す。
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open dataset at {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to parse dataset at {}", path.display()))
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryCorpusDao {
    applications: Vec<TagApplication>,
    tags: FxHashMap<TagId, TagRecord>,
    items: FxHashMap<ItemId, ItemRecord>,
}

impl InMemoryCorpusDao {
    #[must_use]
    pub fn new(dataset: CorpusDataset) -> Self {
        Self {
            applications: dataset.applications,
            tags: dataset.tags.into_iter().map(|tag| (tag.id, tag)).collect(),
            items: dataset.items.into_iter().map(|item| (item.id, item)).collect(),
        }
    }

    fn admits(
        &self,
        row: &TagApplication,
        namespace: &Namespace,
        status_filter: StatusFilter,
    ) -> bool {
        if !row.counts_as_membership() {
            return false;
        }
        let in_namespace = self
            .tags
            .get(&row.tag_id)
            .is_some_and(|tag| Namespace::normalize(&tag.namespace) == *namespace);
        if !in_namespace {
            return false;
        }
        match status_filter {
            StatusFilter::All => true,
            bucket => self
                .items
                .get(&row.item_id)
                .is_some_and(|item| bucket.admits(&item.status)),
        }
    }
}

#[async_trait]
impl CorpusDao for InMemoryCorpusDao {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn load_applications(
        &self,
        namespace: &Namespace,
        status_filter: StatusFilter,
    ) -> Result<Vec<TagApplication>> {
        Ok(self
            .applications
            .iter()
            .filter(|row| self.admits(row, namespace, status_filter))
            .copied()
            .collect())
    }

    async fn tag_names(&self, tag_ids: &[TagId]) -> Result<FxHashMap<TagId, String>> {
        Ok(tag_ids
            .iter()
            .filter_map(|id| self.tags.get(id).map(|tag| (*id, tag.name.clone())))
            .collect())
    }

    async fn resolve_tag_ids(
        &self,
        namespace: &Namespace,
        names: &[String],
    ) -> Result<FxHashMap<String, TagId>> {
        Ok(self
            .tags
            .values()
            .filter(|tag| Namespace::normalize(&tag.namespace) == *namespace)
            .filter_map(|tag| {
                let lowered = tag.name.to_lowercase();
                names.contains(&lowered).then_some((lowered, tag.id))
            })
            .collect())
    }

    async fn item_attributions(&self, item_ids: &[ItemId]) -> Result<FxHashMap<ItemId, String>> {
        Ok(item_ids
            .iter()
            .filter_map(|id| {
                self.items
                    .get(id)
                    .map(|item| (*id, item.attribution.trim().to_string()))
            })
            .collect())
    }
}
