use shelf_embedders::error::EmbeddingError;
use shelf_splitter::SplitterError;
use std::{error::Error as _, string::FromUtf8Error};
use thiserror::Error;
use tracing::error;
use validify::ValidationErrors;

#[derive(Debug, Error)]
pub enum ShelfErr {
    #[error("Does not exist; {0}")]
    NotFound(String),

    #[error("Invalid file name; {0}")]
    InvalidFileName(String),

    #[error("Unsupported file type; {0}")]
    UnsupportedFileType(String),

    #[error("Invalid embedding model; {0}")]
    InvalidEmbeddingModel(String),

    #[error("Invalid provider; {0}")]
    InvalidProvider(String),

    #[error("Invalid input; {0}")]
    InvalidInput(String),

    #[error("Graph; {0}")]
    Graph(String),

    #[error("Timeout; {0}")]
    Timeout(String),

    #[error("Blocking task; {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("embedding error; {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("splitter: {0}")]
    Splitter(#[from] SplitterError),

    #[error("IO; {0}")]
    IO(#[from] std::io::Error),

    #[error("FMT; {0}")]
    Fmt(#[from] std::fmt::Error),

    #[error("UTF-8; {0}")]
    Utf8(#[from] FromUtf8Error),

    #[error("SQL; {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migrations; {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("JSON error; {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Parse pdf; {0}")]
    ParsePdf(#[from] pdfium_render::prelude::PdfiumError),

    #[error("Docx read; {0}")]
    DocxRead(#[from] docx_rs::ReaderError),

    #[error("Validation; {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Regex; {0}")]
    Regex(#[from] regex::Error),

    #[error("uuid: {0}")]
    Uuid(#[from] uuid::Error),
}

#[derive(Debug, Error)]
#[error("{error}")]
pub struct ShelfError {
    file: &'static str,
    line: u32,
    column: u32,
    pub error: ShelfErr,
}

impl ShelfError {
    pub fn new(file: &'static str, line: u32, column: u32, error: ShelfErr) -> ShelfError {
        ShelfError {
            file,
            line,
            column,
            error,
        }
    }

    pub fn location(&self) -> String {
        format!("{}:{}:{}", self.file, self.line, self.column)
    }

    pub fn print(&self) {
        let location = self.location();

        error!("{location} | {self}");

        if self.error.source().is_some() {
            error!("Causes:");
        }

        let mut src = self.error.source();
        while let Some(source) = src {
            error!(" - {source}");
            src = source.source();
        }
    }
}

#[macro_export]
macro_rules! err {
    ($ty:ident $(, $l:literal $(,)? $($args:expr),* )?) => {
        Err($crate::error::ShelfError::new(
            file!(),
            line!(),
            column!(),
            $crate::error::ShelfErr::$ty $( (format!($l, $( $args, )*)) )?,
        ))
    };
}

#[macro_export]
macro_rules! map_err {
    ($ex:expr) => {
        $ex.map_err(|e| $crate::error::ShelfError::new(file!(), line!(), column!(), e.into()))?
    };
}
