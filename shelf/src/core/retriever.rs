use super::{
    embedder::Embedder,
    vector::{SearchHit, VectorDb, VectorStore},
};
use crate::{err, error::ShelfError};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_K: usize = 3;
pub const DEFAULT_SCORE_THRESHOLD: f64 = 0.1;

/// How the retriever selects stored chunks for a query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum SearchKind {
    /// The `k` most similar chunks.
    Similarity { k: usize },

    /// At most `k` of the most similar chunks scoring at least `score_threshold`.
    SimilarityScoreThreshold { k: usize, score_threshold: f64 },
}

impl SearchKind {
    pub fn k(&self) -> usize {
        match self {
            Self::Similarity { k } | Self::SimilarityScoreThreshold { k, .. } => *k,
        }
    }
}

impl Default for SearchKind {
    fn default() -> Self {
        Self::SimilarityScoreThreshold {
            k: DEFAULT_K,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
        }
    }
}

/// Answers text queries with chunks from a vector store.
pub struct Retriever<'a, Db> {
    store: &'a VectorStore<Db>,
    embedder: &'a (dyn Embedder + Send + Sync),
    model: String,
    kind: SearchKind,
}

impl<'a, Db> Retriever<'a, Db>
where
    Db: VectorDb + Send + Sync,
{
    /// Create a retriever embedding queries with the model the store was created with.
    /// Errors if `embedder` is not the provider the store was created with.
    pub async fn new(
        store: &'a VectorStore<Db>,
        embedder: &'a (dyn Embedder + Send + Sync),
        kind: SearchKind,
    ) -> Result<Self, ShelfError> {
        let info = store.info().await?;

        if info.embedding_provider != embedder.id() {
            return err!(
                InvalidProvider,
                "store '{}' was created with provider '{}', got '{}'",
                info.name,
                info.embedding_provider,
                embedder.id()
            );
        }

        Ok(Self {
            store,
            embedder,
            model: info.embedding_model,
            kind,
        })
    }

    pub fn kind(&self) -> SearchKind {
        self.kind
    }

    pub async fn invoke(&self, query: &str) -> Result<Vec<SearchHit>, ShelfError> {
        let query = query.trim();

        if query.is_empty() {
            return err!(InvalidInput, "query cannot be empty");
        }

        let Some(vector) = self
            .embedder
            .embed(&[query], &self.model)
            .await?
            .into_iter()
            .next()
        else {
            return err!(
                InvalidInput,
                "embedder '{}' returned no vector for the query",
                self.embedder.id()
            );
        };

        let hits = self
            .store
            .similarity_search(&vector, self.kind.k())
            .await?;

        let hits = match self.kind {
            SearchKind::Similarity { .. } => hits,
            SearchKind::SimilarityScoreThreshold {
                score_threshold, ..
            } => hits
                .into_iter()
                .filter(|hit| hit.score >= score_threshold)
                .collect(),
        };

        debug!("Retrieved {} hits for '{query}'", hits.len());

        Ok(hits)
    }
}
