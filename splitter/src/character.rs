use super::{
    check_config,
    merge::{merge_splits, split_chars},
    SplitterError, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

const CHARACTER_SPLITTER_DEFAULT_SEPARATOR: &str = "\n\n";

/// Splits text on a single literal separator and merges the pieces back into
/// chunks of at most `size` characters.
///
/// Consecutive chunks share up to `overlap` characters worth of pieces.
/// A piece that is on its own larger than `size` cannot be split further
/// and ends up as an oversized chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterSplitter {
    pub size: usize,
    pub overlap: usize,
    pub separator: String,
}

impl CharacterSplitter {
    /// Create a new `CharacterSplitter` using the default separator (`"\n\n"`).
    /// Errors if `overlap` is greater than `size`.
    pub fn new(size: usize, overlap: usize) -> Result<Self, SplitterError> {
        check_config(size, overlap)?;
        Ok(Self {
            size,
            overlap,
            separator: CHARACTER_SPLITTER_DEFAULT_SEPARATOR.to_string(),
        })
    }

    pub fn separator(mut self, separator: &str) -> Self {
        self.separator = separator.to_string();
        self
    }

    pub fn chunk(&self, input: &str) -> Vec<String> {
        let CharacterSplitter {
            size,
            overlap,
            ref separator,
        } = *self;

        let splits = if separator.is_empty() {
            split_chars(input)
        } else {
            input
                .split(separator.as_str())
                .filter(|s| !s.is_empty())
                .collect()
        };

        let chunks = merge_splits(&splits, separator, size, overlap);

        debug!(
            "Split {} pieces into {} chunks (size = {size}, overlap = {overlap})",
            splits.len(),
            chunks.len()
        );

        chunks
    }
}

impl Default for CharacterSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP).expect("overlap is greater than size")
    }
}
