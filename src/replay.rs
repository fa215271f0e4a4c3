use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

use crate::observability::Telemetry;
use crate::store::{CorpusDao, CorpusDataset, InMemoryCorpusDao};
use crate::tagmap::params::DEFAULT_CONSOLIDATION;
use crate::tagmap::{RawTagMapQuery, TagMapParams, TagMapResponse, TagMapService};

/// Configuration required by the offline replay helper.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    pub dataset: PathBuf,
    /// HTTP のクエリ文字列と同じ形で渡すパラメータ。
    pub query: RawTagMapQuery,
}

/// Replay a JSON corpus dump through the tag map service without a database.
///
/// # Errors
/// データセットの読み込み、もしくはクエリ実行に失敗した場合はエラーを返す。
pub async fn replay_tagmap(config: &ReplayConfig) -> Result<TagMapResponse> {
    let dataset = CorpusDataset::from_json_file(&config.dataset)?;
    info!(
        applications = dataset.applications.len(),
        tags = dataset.tags.len(),
        items = dataset.items.len(),
        "replay dataset loaded"
    );

    let telemetry = Telemetry::metrics_only()?;
    let dao: Arc<dyn CorpusDao> = Arc::new(InMemoryCorpusDao::new(dataset));
    let service = TagMapService::new(dao, telemetry.metrics_arc());

    let params = TagMapParams::from_query(&config.query, DEFAULT_CONSOLIDATION);
    let started = Instant::now();
    let sets = service
        .query(params)
        .await
        .context("tag map replay query failed")?;
    info!(
        sectors = sets.len(),
        elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
        "replay completed"
    );

    Ok(TagMapResponse { sets })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::synthetic_dataset;
    use std::io::Write;

    fn dump(dataset: &CorpusDataset) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        serde_json::to_writer(&mut file, dataset).expect("serialize dataset");
        file.flush().expect("flush");
        file
    }

    #[tokio::test]
    async fn replays_dataset_dump() {
        let file = dump(&synthetic_dataset(300, 36, 21));
        let config = ReplayConfig {
            dataset: file.path().to_path_buf(),
            query: RawTagMapQuery {
                status_filter: Some("all".into()),
                consolidation: Some("0.5".into()),
                ..RawTagMapQuery::default()
            },
        };
        let response = replay_tagmap(&config).await.expect("replay");
        assert!(!response.sets.is_empty());
        assert!(
            response
                .sets
                .windows(2)
                .all(|pair| pair[0].item_count >= pair[1].item_count)
        );
    }

    #[tokio::test]
    async fn missing_dataset_is_an_error() {
        let config = ReplayConfig {
            dataset: PathBuf::from("/nonexistent/tagmap-dataset.json"),
            query: RawTagMapQuery::default(),
        };
        let error = replay_tagmap(&config).await.expect_err("missing file");
        assert!(format!("{error:#}").contains("failed to open dataset"));
    }
}
