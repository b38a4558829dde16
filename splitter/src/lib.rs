//! Text splitters used to cut documents into overlapping chunks.
//!
//! All splitters are deterministic; the same input and configuration
//! always yield the same chunks.

mod merge;

pub mod character;
pub mod recursive;
pub mod sliding;

pub use character::CharacterSplitter;
pub use recursive::RecursiveSplitter;
pub use sliding::SlidingWindow;

/// Default chunk size for the separator based splitters, in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default chunk overlap for the separator based splitters, in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum SplitterError {
    #[error("{0}")]
    Config(String),
}

/// Errors if `overlap` is greater than `size` or if `size` is 0.
pub(crate) fn check_config(size: usize, overlap: usize) -> Result<(), SplitterError> {
    if size == 0 {
        return Err(SplitterError::Config(
            "size must be greater than 0".to_string(),
        ));
    }
    if overlap > size {
        return Err(SplitterError::Config(
            "overlap must be less than size".to_string(),
        ));
    }
    Ok(())
}
