//! Corpus accessor: read-only views over tag applications, the tag catalog and item metadata.

pub mod dao;
pub mod models;

pub use dao::{CorpusDao, CorpusDataset, InMemoryCorpusDao, PgCorpusDao};
