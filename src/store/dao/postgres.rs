//! PostgreSQL corpus accessor over the community tagging tables.

use anyhow::{Context, Result};
use async_trait::async_trait;
use rustc_hash::FxHashMap;
use sqlx::{PgPool, Row};

use super::{CorpusDao, ID_CHUNK_SIZE};
use crate::store::models::{ItemId, TagApplication, TagId};
use crate::tagmap::params::{Namespace, StatusFilter};

#[derive(Debug, Clone)]
pub struct PgCorpusDao {
    pool: PgPool,
}

impl PgCorpusDao {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CorpusDao for PgCorpusDao {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("corpus store ping failed")?;
        Ok(())
    }

    async fn load_applications(
        &self,
        namespace: &Namespace,
        status_filter: StatusFilter,
    ) -> Result<Vec<TagApplication>> {
        // 否定行・レガシー行はここで落とす。スナップショット側でも再確認する。
        let statuses: Option<Vec<String>> = status_filter
            .statuses()
            .map(|values| values.iter().map(|value| (*value).to_string()).collect());

        let rows = sqlx::query(
            r"
            SELECT
                ta.beatmap_id::BIGINT AS item_id,
                ta.tag_id::BIGINT AS tag_id,
                ta.user_id::BIGINT AS contributor_id,
                ta.true_negative AS is_negative,
                ta.is_prediction AS is_prediction
            FROM echo_tagapplication ta
            JOIN echo_tag t ON t.id = ta.tag_id
            JOIN echo_beatmap b ON b.id = ta.beatmap_id
            WHERE t.mode = $1
              AND ta.true_negative = FALSE
              AND NOT (ta.user_id IS NULL AND ta.is_prediction = FALSE)
              AND ($2::TEXT[] IS NULL OR b.status = ANY($2::TEXT[]))
            ",
        )
        .bind(namespace.as_str())
        .bind(statuses)
        .fetch_all(&self.pool)
        .await
        .with_context(|| {
            format!(
                "failed to load tag applications for namespace={} status={}",
                namespace.as_str(),
                status_filter.as_str()
            )
        })?;

        rows.into_iter()
            .map(|row| {
                Ok(TagApplication {
                    item_id: row.try_get("item_id")?,
                    tag_id: row.try_get("tag_id")?,
                    contributor_id: row.try_get("contributor_id")?,
                    is_negative: row.try_get("is_negative")?,
                    is_prediction: row.try_get("is_prediction")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .context("failed to decode tag application row")
    }

    async fn tag_names(&self, tag_ids: &[TagId]) -> Result<FxHashMap<TagId, String>> {
        let mut names: FxHashMap<TagId, String> = FxHashMap::default();
        for chunk in tag_ids.chunks(ID_CHUNK_SIZE) {
            let rows = sqlx::query(
                r"
                SELECT id::BIGINT AS id, name
                FROM echo_tag
                WHERE id = ANY($1::BIGINT[])
                ",
            )
            .bind(chunk)
            .fetch_all(&self.pool)
            .await
            .context("failed to fetch tag names")?;

            for row in rows {
                names.insert(row.try_get("id")?, row.try_get("name")?);
            }
        }
        Ok(names)
    }

    async fn resolve_tag_ids(
        &self,
        namespace: &Namespace,
        names: &[String],
    ) -> Result<FxHashMap<String, TagId>> {
        if names.is_empty() {
            return Ok(FxHashMap::default());
        }
        let rows = sqlx::query(
            r"
            SELECT id::BIGINT AS id, LOWER(name) AS name
            FROM echo_tag
            WHERE mode = $1 AND LOWER(name) = ANY($2::TEXT[])
            ",
        )
        .bind(namespace.as_str())
        .bind(names)
        .fetch_all(&self.pool)
        .await
        .context("failed to resolve tag names")?;

        let mut resolved: FxHashMap<String, TagId> = FxHashMap::default();
        for row in rows {
            resolved.insert(row.try_get("name")?, row.try_get("id")?);
        }
        Ok(resolved)
    }

    async fn item_attributions(&self, item_ids: &[ItemId]) -> Result<FxHashMap<ItemId, String>> {
        let mut attributions: FxHashMap<ItemId, String> = FxHashMap::default();
        for chunk in item_ids.chunks(ID_CHUNK_SIZE) {
            let rows = sqlx::query(
                r"
                SELECT
                    id::BIGINT AS id,
                    TRIM(COALESCE(NULLIF(TRIM(listed_owner), ''), creator, '')) AS attribution
                FROM echo_beatmap
                WHERE id = ANY($1::BIGINT[])
                ",
            )
            .bind(chunk)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("failed to fetch attributions for {} items", chunk.len()))?;

            for row in rows {
                attributions.insert(row.try_get("id")?, row.try_get("attribution")?);
            }
        }
        Ok(attributions)
    }
}
