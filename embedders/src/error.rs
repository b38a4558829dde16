use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[cfg(feature = "fe-local")]
    #[error("fastembed error: {0}")]
    Fastembed(#[from] fastembed::Error),

    #[cfg(feature = "openai")]
    #[error("http client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[cfg(feature = "openai")]
    #[error("openai: {0}")]
    OpenAI(#[from] crate::openai::OpenAIError),
}
