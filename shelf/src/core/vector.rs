use super::{
    chunk::Chunk,
    embedder::{embed_batched, Embedder},
    path_exists,
};
use crate::{err, error::ShelfError, map_err};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

/// A chunk together with its embedding, as stored in a vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub id: Uuid,
    pub content: String,
    pub source: String,
    pub chunk_index: usize,
    pub vector: Vec<f64>,
}

impl EmbeddingRecord {
    pub fn new(chunk: &Chunk, vector: Vec<f64>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: chunk.content.clone(),
            source: chunk.source.clone(),
            chunk_index: chunk.index,
            vector,
        }
    }
}

/// Properties of a vector store, saved once on creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreInfo {
    pub name: String,
    pub embedding_provider: String,
    pub embedding_model: String,
    pub size: usize,
    pub created_at: DateTime<Utc>,
}

impl StoreInfo {
    pub fn new(name: &str, embedding_provider: &str, embedding_model: &str, size: usize) -> Self {
        Self {
            name: name.to_string(),
            embedding_provider: embedding_provider.to_string(),
            embedding_model: embedding_model.to_string(),
            size,
            created_at: Utc::now(),
        }
    }
}

/// A stored chunk matching a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub content: String,
    pub source: String,
    pub chunk_index: usize,

    /// Cosine similarity to the query vector.
    pub score: f64,
}

/// Vector database operations on a single store.
#[async_trait::async_trait]
pub trait VectorDb {
    fn id(&self) -> &'static str;

    /// Get the properties the store was created with.
    async fn info(&self) -> Result<StoreInfo, ShelfError>;

    /// Store the records in the vector storage.
    async fn insert_embeddings(&self, records: &[EmbeddingRecord]) -> Result<(), ShelfError>;

    /// Perform semantic search, returning at most `limit` hits ordered by descending score.
    /// Hits with equal scores keep their insertion order.
    ///
    /// * `search`: The query vector.
    /// * `limit`: Amount of results to return.
    async fn query(&self, search: &[f64], limit: usize) -> Result<Vec<SearchHit>, ShelfError>;

    /// Returns the amount of stored vectors.
    async fn count(&self) -> Result<usize, ShelfError>;
}

/// Creates and opens directory based vector stores.
#[async_trait::async_trait]
pub trait VectorStoreBackend {
    type Db: VectorDb + Send + Sync;

    /// Name of the file whose presence in a store directory
    /// means the store has already been created.
    fn marker(&self) -> &'static str;

    /// Create a store in `dir` containing `records`.
    /// On error, the marker must not be left behind.
    async fn create(
        &self,
        dir: &Path,
        info: &StoreInfo,
        records: &[EmbeddingRecord],
    ) -> Result<Self::Db, ShelfError>;

    /// Open the existing store in `dir`.
    async fn open(&self, dir: &Path) -> Result<Self::Db, ShelfError>;
}

/// An opened vector store.
#[derive(Debug)]
pub struct VectorStore<Db> {
    pub db: Db,

    /// The store directory.
    pub dir: PathBuf,

    /// `false` if an existing store was reused.
    pub created: bool,
}

impl<Db> VectorStore<Db>
where
    Db: VectorDb + Send + Sync,
{
    /// Open an existing store in `dir`. Errors with `NotFound` if the
    /// directory does not contain the backend's marker file.
    pub async fn open<B>(backend: &B, dir: impl AsRef<Path>) -> Result<Self, ShelfError>
    where
        B: VectorStoreBackend<Db = Db> + Sync,
    {
        let dir = dir.as_ref();
        let marker = dir.join(backend.marker());

        if !path_exists(&marker).await? {
            return err!(NotFound, "Vector store '{}' does not exist", dir.display());
        }

        Ok(Self {
            db: backend.open(dir).await?,
            dir: dir.to_path_buf(),
            created: false,
        })
    }

    pub async fn insert(&self, records: &[EmbeddingRecord]) -> Result<(), ShelfError> {
        self.db.insert_embeddings(records).await
    }

    pub async fn count(&self) -> Result<usize, ShelfError> {
        self.db.count().await
    }

    /// Get at most `k` stored chunks most similar to `vector`.
    pub async fn similarity_search(
        &self,
        vector: &[f64],
        k: usize,
    ) -> Result<Vec<SearchHit>, ShelfError> {
        self.db.query(vector, k).await
    }

    pub async fn info(&self) -> Result<StoreInfo, ShelfError> {
        self.db.info().await
    }
}

/// Returns the vector store named `store_name` in `db_dir`, creating it from
/// `chunks` if its marker file does not exist.
///
/// An existing store is reused as is; nothing gets embedded in that case.
/// Reusing a store created with a different embedding provider or model is an error.
///
/// * `backend`: Storage implementation.
/// * `chunks`: Chunks to embed when creating the store.
/// * `embedder`: Embedding provider.
/// * `model`: Embedding model.
/// * `db_dir`: Directory holding all stores.
/// * `store_name`: Name of the store directory in `db_dir`.
pub async fn create_vector_store<B>(
    backend: &B,
    chunks: &[Chunk],
    embedder: &(dyn Embedder + Send + Sync),
    model: &str,
    db_dir: &Path,
    store_name: &str,
) -> Result<VectorStore<B::Db>, ShelfError>
where
    B: VectorStoreBackend + Sync,
{
    let dir = db_dir.join(store_name);

    if !path_exists(&dir).await? {
        map_err!(tokio::fs::create_dir_all(&dir).await);
    }

    if path_exists(&dir.join(backend.marker())).await? {
        info!("Vector store {store_name} already exists. Loading it instead of re-initializing.");

        let db = backend.open(&dir).await?;
        let info = db.info().await?;

        if info.embedding_provider != embedder.id() || info.embedding_model != model {
            return err!(
                InvalidEmbeddingModel,
                "store '{store_name}' was created with '{}/{}', got '{}/{model}'",
                info.embedding_provider,
                info.embedding_model,
                embedder.id()
            );
        }

        return Ok(VectorStore {
            db,
            dir,
            created: false,
        });
    }

    info!("Creating vector store {store_name}");
    info!(
        "Starting embedding and storage process for {} documents...",
        chunks.len()
    );

    if chunks.is_empty() {
        return err!(InvalidInput, "no chunks to create store '{store_name}' from");
    }

    let Some(size) = embedder.size(model).await? else {
        return err!(
            InvalidEmbeddingModel,
            "Model {model} not supported by embedder '{}'",
            embedder.id()
        );
    };

    let content = chunks.iter().map(|c| c.content.as_str()).collect::<Vec<_>>();
    let vectors = embed_batched(embedder, &content, model).await?;

    if let Some(vector) = vectors.iter().find(|v| v.len() != size) {
        return err!(
            InvalidEmbeddingModel,
            "expected vectors of size {size} from '{model}', got {}",
            vector.len()
        );
    }

    let records = chunks
        .iter()
        .zip(vectors)
        .map(|(chunk, vector)| EmbeddingRecord::new(chunk, vector))
        .collect::<Vec<_>>();

    let info = StoreInfo::new(store_name, embedder.id(), model, size);
    let db = backend.create(&dir, &info, &records).await?;

    info!("Finished creating vector store {store_name}");

    Ok(VectorStore {
        db,
        dir,
        created: true,
    })
}

/// Cosine similarity of `a` and `b`. Returns 0 if either vector has no magnitude
/// or if their lengths differ.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .fold((0.0, 0.0, 0.0), |(dot, na, nb), (x, y)| {
            (dot + x * y, na + x * x, nb + y * y)
        });

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}
