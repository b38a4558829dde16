use super::vector::sqlite::SqliteBackend;
use crate::{config::StartArgs, core::embedder::Embedder, err, error::ShelfError, map_err};
use std::{sync::Arc, time::Duration};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Initialise the global tracing subscriber using the `--log`/`RUST_LOG` filter.
pub fn init_logging(args: &StartArgs) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from(args.log()))
        .init();
}

/// Everything needed to embed and store chunks.
#[derive(Clone)]
pub struct AppState {
    pub embedder: Arc<dyn Embedder + Send + Sync>,

    /// Model used for embedding.
    pub model: String,

    pub backend: SqliteBackend,
}

impl AppState {
    /// Load the embedder for `provider`. Uses the provider's default model if `model` is `None`.
    pub async fn new(
        args: &StartArgs,
        provider: &str,
        model: Option<&str>,
    ) -> Result<Self, ShelfError> {
        let embedder = Self::init_embedder(args, provider, model).await?;
        let model = match model {
            Some(model) => model.to_string(),
            None => embedder.default_model().0,
        };

        info!("Using embedding provider '{provider}' with model '{model}'");

        Ok(Self {
            embedder,
            model,
            backend: SqliteBackend,
        })
    }

    async fn init_embedder(
        args: &StartArgs,
        provider: &str,
        model: Option<&str>,
    ) -> Result<Arc<dyn Embedder + Send + Sync>, ShelfError> {
        #[cfg(not(any(feature = "fe-local", feature = "openai")))]
        compile_error!("one of `fe-local` or `openai` features must be enabled");

        #[cfg(feature = "fe-local")]
        if provider == "fastembed" {
            use super::embedder::fastembed::{
                LocalFastEmbedder, LocalFastEmbedderOptions, DEFAULT_MODEL,
            };

            let timeout = download_timeout(&args.hf_hub_download_timeout())?;
            let model = model.unwrap_or(DEFAULT_MODEL).to_string();
            let options = LocalFastEmbedderOptions {
                cache_dir: args.model_cache().map(Into::into),
                show_download_progress: true,
            };

            // Downloads the model if it is not cached
            let init = tokio::task::spawn_blocking(move || LocalFastEmbedder::new(&model, options));

            let Ok(joined) = tokio::time::timeout(timeout, init).await else {
                return err!(
                    Timeout,
                    "loading the embedding model took longer than {}s",
                    timeout.as_secs()
                );
            };

            let loaded = map_err!(joined);
            let fastembed = map_err!(loaded);

            return Ok(Arc::new(fastembed));
        }

        #[cfg(feature = "openai")]
        if provider == "openai" {
            use super::embedder::openai::OpenAiEmbeddings;

            let Some(key) = args.open_ai_key() else {
                return err!(InvalidProvider, "openai requires the OPENAI_KEY variable");
            };

            let mut openai = OpenAiEmbeddings::new(&key);
            if let Some(endpoint) = args.openai_endpoint() {
                openai = openai.with_endpoint(&endpoint);
            }

            return Ok(Arc::new(openai));
        }

        err!(InvalidProvider, "unsupported embedding provider '{provider}'")
    }
}

/// Parse the model download timeout, given in seconds.
pub fn download_timeout(seconds: &str) -> Result<Duration, ShelfError> {
    match seconds.trim().parse::<u64>() {
        Ok(seconds) => Ok(Duration::from_secs(seconds)),
        Err(e) => err!(
            InvalidInput,
            "HF_HUB_DOWNLOAD_TIMEOUT must be a whole number of seconds, got '{seconds}' ({e})"
        ),
    }
}
