use super::{
    chunk::ChunkConfig,
    document::{self, parser::ParseConfig},
    embedder::Embedder,
    path_exists,
    vector::{create_vector_store, VectorStore, VectorStoreBackend},
};
use crate::{err, error::ShelfError};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};

/// Parameters of a single ingestion run.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Document to ingest.
    pub source: PathBuf,

    /// Optional text selection applied when parsing the source.
    pub parse: Option<ParseConfig>,

    pub chunk: ChunkConfig,

    /// Embedding model used when the store gets created.
    pub model: String,

    /// Directory holding all stores.
    pub db_dir: PathBuf,

    pub store_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Amount of chunks the source was split into.
    pub chunks: usize,

    /// `false` if an existing store was reused.
    pub created: bool,
}

/// Loads, splits and stores documents.
pub struct Ingestion<'a, B> {
    backend: &'a B,
    embedder: &'a (dyn Embedder + Send + Sync),
}

impl<'a, B> Ingestion<'a, B>
where
    B: VectorStoreBackend + Sync,
{
    pub fn new(backend: &'a B, embedder: &'a (dyn Embedder + Send + Sync)) -> Self {
        Self { backend, embedder }
    }

    /// Ingest `config.source` into the store named `config.store_name`.
    /// Fails with `NotFound` before anything is created if the source does not exist.
    pub async fn run(
        &self,
        config: &IngestConfig,
    ) -> Result<(IngestReport, VectorStore<B::Db>), ShelfError> {
        if !path_exists(&config.source).await? {
            return err!(
                NotFound,
                "The file {} does not exist. Please check the path.",
                config.source.display()
            );
        }

        let document = document::load(&config.source, config.parse.clone()).await?;
        let chunks = config.chunk.split(&document);

        info!("Number of chunks: {}", chunks.len());
        if let Some(sample) = chunks.first() {
            debug!("Sample chunk:\n{}", sample.content);
        }

        let store = create_vector_store(
            self.backend,
            &chunks,
            self.embedder,
            &config.model,
            &config.db_dir,
            &config.store_name,
        )
        .await?;

        let report = IngestReport {
            chunks: chunks.len(),
            created: store.created,
        };

        Ok((report, store))
    }
}
