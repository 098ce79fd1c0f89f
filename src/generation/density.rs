use regex::Regex;
use std::sync::LazyLock;

use crate::constants::{CHARS_PER_TOKEN, TOKENS_PER_CITATION};

static CITATION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[CIT-\d+\]").expect("static pattern is valid"));

/// Number of `[CIT-n]` markers in `text`.
pub fn count_citation_markers(text: &str) -> usize {
    CITATION_MARKER.find_iter(text).count()
}

/// Inline citations per expected slot, capped at 1.
///
/// One marker is expected every 200 estimated tokens (4 characters each); short texts
/// expect at least one.
pub fn citation_density(text: &str) -> f32 {
    let markers = count_citation_markers(text);
    if markers == 0 {
        return 0.0;
    }
    let tokens = (text.chars().count() / CHARS_PER_TOKEN).max(1);
    let expected = (tokens as f32 / TOKENS_PER_CITATION as f32).max(1.0);
    (markers as f32 / expected).min(1.0)
}
