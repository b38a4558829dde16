use crate::core::embedder::Embedder;
use crate::error::ShelfError;
use crate::map_err;

pub use shelf_embedders::openai::{OpenAiEmbeddings, DEFAULT_MODEL};

#[async_trait::async_trait]
impl Embedder for OpenAiEmbeddings {
    fn id(&self) -> &'static str {
        "openai"
    }

    fn default_model(&self) -> (String, usize) {
        let size = OpenAiEmbeddings::size(self, DEFAULT_MODEL).unwrap_or(1536);
        (String::from(DEFAULT_MODEL), size)
    }

    async fn list_embedding_models(&self) -> Result<Vec<(String, usize)>, ShelfError> {
        Ok(self.list_embedding_models())
    }

    async fn embed(&self, content: &[&str], model: &str) -> Result<Vec<Vec<f64>>, ShelfError> {
        Ok(map_err!(self.embed(content, model).await))
    }
}
