use crate::{core::path_exists, err, error::ShelfError, map_err};
use parser::{ParseConfig, Parser};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

pub mod convert;
pub mod parser;

/// All possible file types shelf can process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentType {
    /// Encapsulates any files that can be read as strings.
    /// Does not necessarily have to be `.txt`, could be `.json`, `.csv`, etc.
    Text,

    /// Office Open XML document.
    Docx,

    /// PDF document.
    Pdf,
}

impl DocumentType {
    /// Determine the type from the extension of the file at `path`.
    pub fn from_path(path: &Path) -> Result<Self, ShelfError> {
        let Some(ext) = path.extension() else {
            return err!(InvalidFileName, "missing extension: {}", path.display());
        };

        let Some(ext) = ext.to_str() else {
            return err!(InvalidFileName, "extension invalid unicode: {:?}", ext);
        };

        Self::try_from(ext)
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentType::Text => write!(f, "txt"),
            DocumentType::Docx => write!(f, "docx"),
            DocumentType::Pdf => write!(f, "pdf"),
        }
    }
}

impl TryFrom<&str> for DocumentType {
    type Error = ShelfError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "txt" | "md" | "xml" | "json" | "csv" => Ok(Self::Text),
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            _ => err!(UnsupportedFileType, "{value}"),
        }
    }
}

/// A source document loaded into memory as plain text.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    /// Where the document was loaded from.
    pub source: PathBuf,

    /// Parsed text content.
    pub content: String,
}

impl Document {
    pub fn new(source: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
        }
    }
}

/// Load the document at `path`, parsing it according to its extension.
///
/// Fails with [NotFound][crate::error::ShelfErr::NotFound] before reading
/// anything if the file does not exist.
///
/// * `path`: Path to the source document.
/// * `config`: Optional parsing configuration, the parser default is used if `None`.
pub async fn load(path: &Path, config: Option<ParseConfig>) -> Result<Document, ShelfError> {
    if !path_exists(path).await? {
        return err!(
            NotFound,
            "The file {} does not exist. Please check the path.",
            path.display()
        );
    }

    let ty = DocumentType::from_path(path)?;

    let parser = match config {
        Some(config) => Parser::new_from(ty, config)?,
        None => Parser::new(ty),
    };

    debug!("Reading {} as {ty}", path.display());

    let file = map_err!(tokio::fs::read(path).await);
    let content = parser.parse(&file)?;

    Ok(Document::new(path, content))
}
