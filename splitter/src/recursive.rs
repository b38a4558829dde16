use super::{
    check_config,
    merge::{char_len, merge_splits, split_keep_separator},
    SplitterError, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default separators for the [recursive splitter][RecursiveSplitter].
const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

/// Splits text using a prioritised list of separators.
///
/// The first separator found in the text is used to split it. Pieces shorter than `size`
/// are merged back into chunks, while pieces that are too long are split again with the
/// remaining separators. The empty separator splits into single characters, so with the
/// default separators every chunk ends up at most `size` characters long.
///
/// Separators are kept at the start of the piece following them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecursiveSplitter {
    pub size: usize,
    pub overlap: usize,
    pub separators: Vec<String>,
}

impl RecursiveSplitter {
    /// Create a new `RecursiveSplitter` with the default separators.
    /// Errors if `overlap` is greater than `size`.
    pub fn new(size: usize, overlap: usize) -> Result<Self, SplitterError> {
        check_config(size, overlap)?;
        Ok(Self {
            size,
            overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn separators(mut self, separators: &[&str]) -> Self {
        self.separators = separators.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn chunk(&self, input: &str) -> Vec<String> {
        let chunks = self.chunk_recursive(input, &self.separators);

        debug!(
            "Chunked {} chunks, avg chunk size: {}",
            chunks.len(),
            if chunks.is_empty() {
                0
            } else {
                chunks.iter().fold(0, |acc, el| acc + el.len()) / chunks.len()
            }
        );

        chunks
    }

    /// Split `input` with the first separator in `separators` it contains.
    ///
    /// Pieces that fit are buffered and merged once a piece that does not fit
    /// is encountered. Those are split again with the separators following
    /// the one used here.
    fn chunk_recursive(&self, input: &str, separators: &[String]) -> Vec<String> {
        let mut chunks = vec![];

        let mut separator = separators.last().map(String::as_str).unwrap_or_default();
        let mut remaining: &[String] = &[];

        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                separator = "";
                break;
            }
            if input.contains(sep.as_str()) {
                separator = sep.as_str();
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut fitting: Vec<&str> = vec![];

        for split in split_keep_separator(input, separator) {
            if char_len(split) < self.size {
                fitting.push(split);
                continue;
            }

            if !fitting.is_empty() {
                chunks.extend(merge_splits(&fitting, "", self.size, self.overlap));
                fitting.clear();
            }

            if remaining.is_empty() {
                let split = split.trim();
                if !split.is_empty() {
                    chunks.push(split.to_string());
                }
            } else {
                chunks.extend(self.chunk_recursive(split, remaining));
            }
        }

        if !fitting.is_empty() {
            chunks.extend(merge_splits(&fitting, "", self.size, self.overlap));
        }

        chunks
    }
}

impl Default for RecursiveSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP).expect("overlap is greater than size")
    }
}

#[cfg(test)]
mod tests {
    const INPUT: &str = r#"
What I Worked On

February 2021

Before college the two main things I worked on, outside of school, were writing and programming. I didn't write essays. I wrote what beginning writers were supposed to write then, and probably still are: short stories. My stories were awful. They had hardly any plot... just characters with strong feelings, which I imagined made them deep.

The first programs I tried writing were on the IBM 1401 that our school district used for what was then called "data processing." This was in 9th grade, so I was 13 or 14. The school district's 1401 happened to be in the basement of our junior high school, and my friend Rich Draves and I got permission to use it. It was like a mini Bond villain's lair down there, with all these alien-looking machines, CPU, disk drives, printer, card reader, sitting up on a raised floor under bright fluorescent lights.
"#;

    use super::*;

    #[test]
    fn recursive_splitter_works() {
        let text = "Hi.\n\nI'm Harrison.\n\nHow? Are? You?\nOkay then f f f f.\nThis is a weird text to write, but gotta test the splittingggg some how.\n\nBye!\n\n-H.";
        let splitter = RecursiveSplitter::new(10, 1).unwrap();
        let chunks = splitter.chunk(text);
        let expected = [
            "Hi.",
            "I'm",
            "Harrison.",
            "How? Are?",
            "You?",
            "Okay then",
            "f f f f.",
            "This is a",
            "weird",
            "text to",
            "write,",
            "but gotta",
            "test the",
            "splitting",
            "gggg",
            "some how.",
            "Bye!",
            "-H.",
        ];
        assert_eq!(expected.as_slice(), chunks.as_slice());
    }

    #[test]
    fn recursive_splitter_respects_size() {
        let splitter = RecursiveSplitter::new(100, 20).unwrap();
        let chunks = splitter.chunk(INPUT);
        assert!(!chunks.is_empty());
        for chunk in chunks.iter() {
            assert!(chunk.chars().count() <= 100, "{chunk}");
            assert!(!chunk.trim().is_empty());
        }
    }

    #[test]
    fn recursive_splitter_keeps_paragraphs_whole() {
        let splitter = RecursiveSplitter::default();
        let chunks = splitter.chunk(INPUT);
        assert_eq!(1, chunks.len());
        assert!(chunks[0].starts_with("What I Worked On"));
        assert!(chunks[0].ends_with("fluorescent lights."));
    }

    #[test]
    fn recursive_splitter_is_deterministic() {
        let splitter = RecursiveSplitter::new(50, 10).unwrap();
        let first = splitter.chunk(INPUT);
        let second = splitter.chunk(INPUT);
        assert_eq!(first, second);
    }

    #[test]
    fn recursive_splitter_empty() {
        let splitter = RecursiveSplitter::default();
        assert!(splitter.chunk("").is_empty());
        assert!(splitter.chunk(" \n\n ").is_empty());
    }

    #[test]
    fn recursive_splitter_custom_separators() {
        let splitter = RecursiveSplitter::new(8, 0)
            .unwrap()
            .separators(&["|", ""]);
        let chunks = splitter.chunk("abc|def|ghijklmnopq");
        assert_eq!(vec!["abc|def", "|ghijklm", "nopq"], chunks);
    }
}
