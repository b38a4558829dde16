use crate::error::EmbeddingError;
use fastembed::{EmbeddingModel, ModelInfo};
use ort::execution_providers::CPUExecutionProvider;
#[cfg(feature = "cuda")]
use ort::execution_providers::CUDAExecutionProvider;
use std::{collections::HashMap, path::PathBuf};

/// Model code of the default local model. It is the ONNX export of `BAAI/bge-base-en-v1.5`.
pub const DEFAULT_MODEL: &str = "Xenova/bge-base-en-v1.5";

/// Vector size of the [default model][DEFAULT_MODEL].
pub const DEFAULT_MODEL_SIZE: usize = 768;

/// Options for initialising [LocalFastEmbedder] models.
#[derive(Debug, Clone, Default)]
pub struct LocalFastEmbedderOptions {
    /// Where downloaded models are kept. Uses fastembed's default if `None`.
    pub cache_dir: Option<PathBuf>,

    /// Print the model download progress to stdout.
    pub show_download_progress: bool,
}

pub struct LocalFastEmbedder {
    pub models: HashMap<String, fastembed::TextEmbedding>,
}

impl LocalFastEmbedder {
    /// Initialise the FastEmbedder locally with a single model.
    /// Downloads the model if it is not present in the cache.
    pub fn new(model: &str, options: LocalFastEmbedderOptions) -> Result<Self, EmbeddingError> {
        tracing::info!("Initializing local Fastembed");
        #[cfg(feature = "cuda")]
        {
            use ort::execution_providers::ExecutionProvider;
            tracing::info!(
                "Using CUDA: {:?}",
                ExecutionProvider::is_available(&CUDAExecutionProvider::default())
            );
        }

        let Some(info) = list_models().into_iter().find(|m| m.model_code == model) else {
            return Err(EmbeddingError::InvalidModel(format!(
                "model '{model}' not supported by fastembed"
            )));
        };

        tracing::info!("Setting up text embedding model: {}", info.model_code);

        let mut init = fastembed::InitOptions::new(info.model)
            .with_execution_providers(vec![
                #[cfg(feature = "cuda")]
                CUDAExecutionProvider::default().into(),
                CPUExecutionProvider::default().into(),
            ])
            .with_show_download_progress(options.show_download_progress);

        if let Some(cache_dir) = options.cache_dir {
            init = init.with_cache_dir(cache_dir);
        }

        let embedding = fastembed::TextEmbedding::try_new(init)?;

        let mut models = HashMap::new();
        models.insert(info.model_code, embedding);

        Ok(Self { models })
    }

    pub fn list_models(&self) -> Vec<ModelInfo<EmbeddingModel>> {
        list_models()
    }

    /// Vector size of `model`, if it is supported.
    pub fn size(&self, model: &str) -> Option<usize> {
        list_models()
            .into_iter()
            .find(|m| m.model_code == model)
            .map(|m| m.dim)
    }

    pub fn embed(&self, content: &[&str], model: &str) -> Result<Vec<Vec<f64>>, EmbeddingError> {
        if content.is_empty() {
            return Err(EmbeddingError::InvalidInput(format!(
                "cannot be empty (len = {})",
                content.len()
            )));
        }

        let embedder = self.models.get(model).ok_or_else(|| {
            EmbeddingError::InvalidModel(format!("model '{model}' not loaded"))
        })?;

        let embeddings = embedder.embed(content.to_vec(), None)?;

        debug_assert_eq!(
            embeddings.len(),
            content.len(),
            "Content length is different from embeddings!"
        );

        Ok(embeddings
            .into_iter()
            .map(|e| e.into_iter().map(|e| e as f64).collect())
            .collect())
    }
}

fn list_models() -> Vec<ModelInfo<EmbeddingModel>> {
    const MODEL_LIST: &[EmbeddingModel] = &[
        EmbeddingModel::BGESmallENV15,
        EmbeddingModel::BGELargeENV15,
        EmbeddingModel::BGEBaseENV15,
        EmbeddingModel::AllMiniLML6V2,
        EmbeddingModel::AllMiniLML12V2,
    ];

    fastembed::TextEmbedding::list_supported_models()
        .into_iter()
        .filter(|model| MODEL_LIST.contains(&model.model))
        .collect()
}

impl std::fmt::Debug for LocalFastEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalFastEmbedder")
            .field("models", &self.models.keys().collect::<Vec<_>>())
            .finish()
    }
}
