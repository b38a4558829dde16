use super::{check_config, SplitterError};
use serde::{Deserialize, Serialize};
use tracing::debug;

const SLIDING_WINDOW_DEFAULT_SIZE: usize = 1000;
const SLIDING_WINDOW_DEFAULT_OVERLAP: usize = 200;

/// The most basic of splitters. Ignores the text structure completely.
///
/// `size` determines the base amount of bytes for every chunk and
/// `overlap` determines how many bytes to extend the base with
/// on both sides. Window edges are snapped to char boundaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlidingWindow {
    pub size: usize,
    pub overlap: usize,
}

impl SlidingWindow {
    /// Create a new `SlidingWindow` splitter.
    /// Errors if `overlap` is greater than `size`.
    pub fn new(size: usize, overlap: usize) -> Result<Self, SplitterError> {
        check_config(size, overlap)?;
        Ok(Self { size, overlap })
    }
}

impl Default for SlidingWindow {
    fn default() -> Self {
        Self::new(SLIDING_WINDOW_DEFAULT_SIZE, SLIDING_WINDOW_DEFAULT_OVERLAP)
            .expect("overlap is greater than size")
    }
}

impl SlidingWindow {
    pub fn chunk<'a>(&self, input: &'a str) -> Vec<&'a str> {
        let SlidingWindow { size, overlap } = self;

        let input = input.trim();

        if input.is_empty() {
            return vec![];
        }

        // Return whole input if it fits
        if input.len() <= size + overlap {
            return vec![input];
        }

        let mut chunks = vec![];

        let mut start: usize = 0;
        let mut end = *size;
        let input_size = input.len();

        loop {
            let mut chunk_start = start.saturating_sub(*overlap);
            let mut chunk_end = end + overlap;

            // Snap to first char boundary
            while !input.is_char_boundary(chunk_start) {
                chunk_start -= 1;
            }

            if chunk_end >= input_size {
                push_trimmed(&mut chunks, &input[chunk_start..]);
                break;
            }

            // Snap to last char boundary
            while !input.is_char_boundary(chunk_end) {
                chunk_end += 1;
            }

            push_trimmed(&mut chunks, &input[chunk_start..chunk_end]);

            start = end;
            end += size;
        }

        debug!(
            "Chunked {} chunks, avg chunk size: {}",
            chunks.len(),
            chunks.iter().fold(0, |acc, el| acc + el.len()) / chunks.len().max(1)
        );

        chunks
    }
}

fn push_trimmed<'a>(chunks: &mut Vec<&'a str>, chunk: &'a str) {
    let chunk = chunk.trim();
    if !chunk.is_empty() {
        chunks.push(chunk);
    }
}
