use crate::{err, error::ShelfError};
use tracing::info;

/// Maximum amount of chunks sent to an embedder at once.
pub const EMBEDDING_BATCH_SIZE: usize = 256;

/// Operations related to embeddings and their models.
#[async_trait::async_trait]
pub trait Embedder {
    /// Used as the provider identifier when storing vectors.
    fn id(&self) -> &'static str;

    /// Return the default model and its vector size.
    fn default_model(&self) -> (String, usize);

    /// List all available models and their vector sizes.
    async fn list_embedding_models(&self) -> Result<Vec<(String, usize)>, ShelfError>;

    /// Get the vectors for the elements in `content`.
    /// The content passed in can be a user's query,
    /// or a chunked document.
    ///
    /// * `content`: The text to embed.
    /// * `model`: The embedding model to use.
    async fn embed(&self, content: &[&str], model: &str) -> Result<Vec<Vec<f64>>, ShelfError>;

    /// Return the vector size of `model`, or `None` if the model is not supported.
    async fn size(&self, model: &str) -> Result<Option<usize>, ShelfError> {
        let models = self.list_embedding_models().await?;
        Ok(models
            .into_iter()
            .find(|(name, _)| name == model)
            .map(|(_, size)| size))
    }
}

/// Embed `content` in batches of [EMBEDDING_BATCH_SIZE], returning the vectors
/// in the same order as the input.
///
/// Errors if the embedder does not return exactly one vector per input.
pub async fn embed_batched(
    embedder: &(dyn Embedder + Send + Sync),
    content: &[&str],
    model: &str,
) -> Result<Vec<Vec<f64>>, ShelfError> {
    let mut vectors = Vec::with_capacity(content.len());
    let batches = content.len().div_ceil(EMBEDDING_BATCH_SIZE);

    for (i, batch) in content.chunks(EMBEDDING_BATCH_SIZE).enumerate() {
        info!(
            "Embedding batch {}/{batches} ({} chunks) with '{model}'",
            i + 1,
            batch.len()
        );

        let embeddings = embedder.embed(batch, model).await?;

        if embeddings.len() != batch.len() {
            return err!(
                InvalidInput,
                "embedder '{}' returned {} vectors for {} inputs",
                embedder.id(),
                embeddings.len(),
                batch.len()
            );
        }

        vectors.extend(embeddings);
    }

    Ok(vectors)
}
