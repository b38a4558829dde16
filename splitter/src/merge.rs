use std::collections::VecDeque;
use tracing::warn;

/// Amount of characters in `input`. All separator based splitters measure
/// chunks in characters.
#[inline(always)]
pub(crate) fn char_len(input: &str) -> usize {
    input.chars().count()
}

/// Split `input` into single character slices.
pub(crate) fn split_chars(input: &str) -> Vec<&str> {
    input
        .char_indices()
        .map(|(i, ch)| &input[i..i + ch.len_utf8()])
        .collect()
}

/// Split `input` on `separator`, keeping the separator at the start of
/// the piece following it. Empty pieces are discarded.
pub(crate) fn split_keep_separator<'a>(input: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return split_chars(input);
    }

    let mut splits = vec![];
    let mut start = 0;

    for (idx, _) in input.match_indices(separator) {
        if idx > start {
            splits.push(&input[start..idx]);
        }
        start = idx;
    }

    if start < input.len() {
        splits.push(&input[start..]);
    }

    splits
}

/// Combine `splits` into chunks of at most `size` characters, joining them with `separator`.
///
/// When a chunk is full, splits are dropped from its front until at most `overlap`
/// characters remain; those carry over to the start of the next chunk.
///
/// A single split larger than `size` is emitted as is.
pub(crate) fn merge_splits(
    splits: &[&str],
    separator: &str,
    size: usize,
    overlap: usize,
) -> Vec<String> {
    let sep_len = char_len(separator);
    let sep_if = |current: &VecDeque<&str>| if current.is_empty() { 0 } else { sep_len };

    let mut chunks = vec![];
    let mut current: VecDeque<&str> = VecDeque::new();
    let mut total = 0;

    for split in splits {
        let len = char_len(split);

        if total + len + sep_if(&current) > size {
            if total > size {
                warn!("Created a chunk of size {total}, which is longer than the specified {size}");
            }

            if !current.is_empty() {
                if let Some(chunk) = join(&current, separator) {
                    chunks.push(chunk);
                }

                // Keep popping until the remainder fits in the overlap
                // and leaves room for the incoming split
                while total > overlap || (total + len + sep_if(&current) > size && total > 0) {
                    let Some(first) = current.pop_front() else {
                        break;
                    };
                    let sep = if current.is_empty() { 0 } else { sep_len };
                    total = total.saturating_sub(char_len(first) + sep);
                }
            }
        }

        current.push_back(split);
        total += len + if current.len() > 1 { sep_len } else { 0 };
    }

    if total > size {
        warn!("Created a chunk of size {total}, which is longer than the specified {size}");
    }

    if let Some(chunk) = join(&current, separator) {
        chunks.push(chunk);
    }

    chunks
}

/// Join and trim. Returns `None` if nothing but whitespace remains.
fn join(splits: &VecDeque<&str>, separator: &str) -> Option<String> {
    let joined = splits.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
