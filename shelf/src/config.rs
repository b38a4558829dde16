use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Directory scanned for documents to convert.
pub const DEFAULT_BOOK_DIR: &str = "books";
/// Directory holding the vector stores.
pub const DEFAULT_DB_DIR: &str = "db";
/// Name of the vector store directory in the [DEFAULT_DB_DIR].
pub const DEFAULT_STORE_NAME: &str = "chroma_db";
/// Document ingested when no file is given.
pub const DEFAULT_SOURCE_FILE: &str = "books/black_parrot.txt";
/// Seconds to wait for model downloads from the Hugging Face hub.
pub const DEFAULT_HF_HUB_DOWNLOAD_TIMEOUT: &str = "600000";

#[cfg(feature = "fe-local")]
const DEFAULT_EMBEDDING_PROVIDER: &str = "fastembed";
#[cfg(not(feature = "fe-local"))]
const DEFAULT_EMBEDDING_PROVIDER: &str = "openai";

#[derive(Debug, Parser)]
#[command(name = "shelf", version = "0.1", about = "Ingest documents into a vector store", long_about = None)]
pub struct StartArgs {
    /// RUST_LOG string to use as the env filter.
    #[arg(short, long, global = true)]
    log: Option<String>,

    /// Directory containing the documents to convert to text.
    #[arg(long, global = true)]
    book_dir: Option<String>,

    /// Directory holding the vector stores.
    #[arg(long, global = true)]
    db_dir: Option<String>,

    /// Name of the vector store.
    #[arg(long = "store", global = true)]
    store_name: Option<String>,

    /// Document to ingest.
    #[arg(short = 'f', long = "file", global = true)]
    source_file: Option<String>,

    /// Embedding provider used when creating a store, `fastembed` or `openai`.
    #[arg(long, global = true)]
    embedding_provider: Option<String>,

    /// Embedding model used when creating a store. Defaults to the provider's default model.
    #[arg(long, global = true)]
    embedding_model: Option<String>,

    /// Where fastembed keeps downloaded models.
    #[arg(long, global = true)]
    model_cache: Option<String>,

    /// Timeout for downloading models from the Hugging Face hub, in seconds.
    #[arg(long, global = true)]
    hf_hub_download_timeout: Option<String>,

    /// If using the [OpenAiEmbeddings][crate::app::embedder::openai::OpenAiEmbeddings] module, set its endpoint.
    #[cfg(feature = "openai")]
    #[arg(long, global = true)]
    openai_endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Convert every docx and pdf document in the book directory to text.
    Convert,

    /// Split a document and store its embeddings.
    /// An existing store is reused without embedding anything.
    Ingest {
        #[arg(long, value_enum, default_value_t = SplitterKind::Recursive)]
        splitter: SplitterKind,

        /// Maximum chunk size.
        #[arg(long, default_value_t = shelf_splitter::DEFAULT_CHUNK_SIZE)]
        size: usize,

        /// Overlap between consecutive chunks.
        #[arg(long, default_value_t = shelf_splitter::DEFAULT_CHUNK_OVERLAP)]
        overlap: usize,
    },

    /// Interactively query a vector store. Type `exit` to quit.
    Query {
        /// Maximum amount of chunks returned per query.
        #[arg(short, long, default_value_t = crate::core::retriever::DEFAULT_K)]
        k: usize,

        /// Minimum similarity score of returned chunks.
        #[arg(short, long, default_value_t = crate::core::retriever::DEFAULT_SCORE_THRESHOLD)]
        threshold: f64,

        /// Return the `k` most similar chunks regardless of their score.
        #[arg(long)]
        no_threshold: bool,
    },

    /// Run the greeting graph and print the final state.
    Greet {
        #[arg(long, default_value = "Charles")]
        name: String,

        #[arg(long, default_value_t = 23)]
        age: u32,

        #[arg(long = "skill", default_values = ["python", "JavaScript"])]
        skills: Vec<String>,
    },

    /// Try connecting to postgres using the `DB_*` environment variables.
    DbCheck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SplitterKind {
    Character,
    Recursive,
    Sliding,
}

/// Implement a getter method on [StartArgs], using the `$var` environment variable as a fallback
/// and either default or return `None` if neither the argument nor the environment variable is set.
macro_rules! arg {
    ($id:ident, $var:literal, default $value:expr) => {
        impl StartArgs {
            pub fn $id(&self) -> String {
                match &self.$id {
                    Some(val) => val.to_string(),
                    None => match std::env::var($var) {
                        Ok(val) => val,
                        Err(_) => $value,
                    },
                }
            }
        }
    };
    ($id:ident, $var:literal, optional) => {
        impl StartArgs {
            pub fn $id(&self) -> Option<String> {
                match &self.$id {
                    Some(val) => Some(val.to_string()),
                    None => std::env::var($var).ok().filter(|val| !val.is_empty()),
                }
            }
        }
    };
}

impl StartArgs {
    pub fn book_dir_path(&self) -> PathBuf {
        PathBuf::from(self.book_dir())
    }

    pub fn db_dir_path(&self) -> PathBuf {
        PathBuf::from(self.db_dir())
    }

    pub fn source_file_path(&self) -> PathBuf {
        PathBuf::from(self.source_file())
    }

    #[cfg(feature = "openai")]
    pub fn open_ai_key(&self) -> Option<String> {
        std::env::var("OPENAI_KEY").ok().filter(|key| !key.is_empty())
    }
}

arg!(log,                     "RUST_LOG",                default "info".to_string());
arg!(book_dir,                "BOOK_DIR",                default DEFAULT_BOOK_DIR.to_string());
arg!(db_dir,                  "DB_DIR",                  default DEFAULT_DB_DIR.to_string());
arg!(store_name,              "STORE_NAME",              default DEFAULT_STORE_NAME.to_string());
arg!(source_file,             "SOURCE_FILE",             default DEFAULT_SOURCE_FILE.to_string());
arg!(embedding_provider,      "EMBEDDING_PROVIDER",      default DEFAULT_EMBEDDING_PROVIDER.to_string());
arg!(hf_hub_download_timeout, "HF_HUB_DOWNLOAD_TIMEOUT", default DEFAULT_HF_HUB_DOWNLOAD_TIMEOUT.to_string());
arg!(embedding_model,         "EMBEDDING_MODEL",         optional);
arg!(model_cache,             "FASTEMBED_CACHE_DIR",     optional);

#[cfg(feature = "openai")]
arg!(openai_endpoint,         "OPENAI_ENDPOINT",         optional);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subcommands() {
        let args = StartArgs::try_parse_from(["shelf", "convert", "--book-dir", "docs"]).unwrap();
        assert!(matches!(args.command, Command::Convert));
        assert_eq!("docs", args.book_dir());

        let args = StartArgs::try_parse_from([
            "shelf",
            "ingest",
            "--splitter",
            "character",
            "--size",
            "500",
            "--store",
            "books_db",
        ])
        .unwrap();

        let Command::Ingest {
            splitter,
            size,
            overlap,
        } = args.command
        else {
            panic!("not an ingest command");
        };

        assert_eq!(SplitterKind::Character, splitter);
        assert_eq!(500, size);
        assert_eq!(shelf_splitter::DEFAULT_CHUNK_OVERLAP, overlap);
        assert_eq!("books_db", args.store_name());
    }

    #[test]
    fn query_defaults() {
        let args = StartArgs::try_parse_from(["shelf", "query"]).unwrap();
        let Command::Query {
            k,
            threshold,
            no_threshold,
        } = args.command
        else {
            panic!("not a query command");
        };

        assert_eq!(3, k);
        assert_eq!(0.1, threshold);
        assert!(!no_threshold);
    }

    #[test]
    fn greet_skills() {
        let args = StartArgs::try_parse_from(["shelf", "greet"]).unwrap();
        let Command::Greet { name, age, skills } = args.command else {
            panic!("not a greet command");
        };
        assert_eq!("Charles", name);
        assert_eq!(23, age);
        assert_eq!(vec!["python", "JavaScript"], skills);

        let args = StartArgs::try_parse_from([
            "shelf", "greet", "--name", "Ana", "--skill", "rust", "--skill", "go",
        ])
        .unwrap();
        let Command::Greet { name, skills, .. } = args.command else {
            panic!("not a greet command");
        };
        assert_eq!("Ana", name);
        assert_eq!(vec!["rust", "go"], skills);
    }

    #[test]
    fn requires_subcommand() {
        assert!(StartArgs::try_parse_from(["shelf"]).is_err());
        assert!(StartArgs::try_parse_from(["shelf", "ingest", "--splitter", "semantic"]).is_err());
    }
}
