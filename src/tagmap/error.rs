use thiserror::Error;

/// クエリ全体を失敗させるエラー。部分的な結果は返さない。
#[derive(Debug, Error)]
pub enum TagMapError {
    #[error("corpus accessor failed: {0:#}")]
    Corpus(anyhow::Error),
    #[error("planning worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}
