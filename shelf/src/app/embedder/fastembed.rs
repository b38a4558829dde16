use crate::{core::embedder::Embedder, error::ShelfError, map_err};

pub use shelf_embedders::fastembed::local::{
    LocalFastEmbedder, LocalFastEmbedderOptions, DEFAULT_MODEL, DEFAULT_MODEL_SIZE,
};

#[async_trait::async_trait]
impl Embedder for LocalFastEmbedder {
    fn id(&self) -> &'static str {
        "fastembed"
    }

    fn default_model(&self) -> (String, usize) {
        (String::from(DEFAULT_MODEL), DEFAULT_MODEL_SIZE)
    }

    async fn list_embedding_models(&self) -> Result<Vec<(String, usize)>, ShelfError> {
        Ok(self
            .list_models()
            .into_iter()
            .map(|m| (m.model_code, m.dim))
            .collect())
    }

    async fn embed(&self, content: &[&str], model: &str) -> Result<Vec<Vec<f64>>, ShelfError> {
        Ok(map_err!(self.embed(content, model)))
    }

    async fn size(&self, model: &str) -> Result<Option<usize>, ShelfError> {
        Ok(LocalFastEmbedder::size(self, model))
    }
}
