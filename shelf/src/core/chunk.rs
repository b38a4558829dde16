use super::document::Document;
use crate::{error::ShelfError, map_err};
use serde::{Deserialize, Serialize};
use shelf_splitter::{CharacterSplitter, RecursiveSplitter, SlidingWindow};
use tracing::{debug, info};

/// Selects the splitter used to chunk documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChunkConfig {
    Character(CharacterSplitter),
    Recursive(RecursiveSplitter),
    Sliding(SlidingWindow),
}

impl ChunkConfig {
    /// Create a `CharacterSplitter` config splitting on paragraphs.
    ///
    /// * `size`: Maximum chunk size in characters.
    /// * `overlap`: Maximum overlap between consecutive chunks in characters.
    pub fn character(size: usize, overlap: usize) -> Result<Self, ShelfError> {
        Ok(Self::Character(map_err!(CharacterSplitter::new(size, overlap))))
    }

    /// Create a `RecursiveSplitter` config with the default separators.
    ///
    /// * `size`: Maximum chunk size in characters.
    /// * `overlap`: Maximum overlap between consecutive chunks in characters.
    pub fn recursive(size: usize, overlap: usize) -> Result<Self, ShelfError> {
        Ok(Self::Recursive(map_err!(RecursiveSplitter::new(size, overlap))))
    }

    /// Create a `SlidingWindow` config.
    ///
    /// * `size`: Chunk base size in bytes.
    /// * `overlap`: Bytes to extend the base with on both sides.
    pub fn sliding(size: usize, overlap: usize) -> Result<Self, ShelfError> {
        Ok(Self::Sliding(map_err!(SlidingWindow::new(size, overlap))))
    }

    /// Split the document's content into chunks.
    pub fn split(&self, document: &Document) -> Vec<Chunk> {
        let source = document.source.display().to_string();

        let chunks: Vec<String> = match self {
            Self::Character(splitter) => splitter.chunk(&document.content),
            Self::Recursive(splitter) => splitter.chunk(&document.content),
            Self::Sliding(splitter) => splitter
                .chunk(&document.content)
                .into_iter()
                .map(String::from)
                .collect(),
        };

        info!("Split '{source}' into {} chunks using {self}", chunks.len());

        if let Some(sample) = chunks.first() {
            debug!("Sample chunk:\n{sample}");
        }

        chunks
            .into_iter()
            .enumerate()
            .map(|(index, content)| Chunk {
                content,
                source: source.clone(),
                index,
            })
            .collect()
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self::Recursive(RecursiveSplitter::default())
    }
}

impl std::fmt::Display for ChunkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Character(s) => write!(f, "CharacterSplitter({}/{})", s.size, s.overlap),
            Self::Recursive(s) => write!(f, "RecursiveSplitter({}/{})", s.size, s.overlap),
            Self::Sliding(s) => write!(f, "SlidingWindow({}/{})", s.size, s.overlap),
        }
    }
}

/// A window of a document's content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,

    /// Display path of the document the chunk came from.
    pub source: String,

    /// Position of the chunk in the document, starting at 0.
    pub index: usize,
}
