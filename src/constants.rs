//! Cross-cutting, shared constants.
//!
//! Every threshold below is a calibration default. Runtime values flow through
//! [`crate::config::Config`] and the per-component config structs; these constants only
//! seed their `Default` impls.

/// Minimum coverage required for a validation to pass.
pub const DEFAULT_COVERAGE_MIN: f32 = 0.70;
/// Minimum confidence (average of the top-3 fused scores) required to pass.
pub const DEFAULT_CONFIDENCE_MIN: f32 = 0.40;
/// Maximum tolerated violation weight.
pub const DEFAULT_VIOLATION_MAX: u32 = 3;
/// Validation score at or above which generation is allowed.
pub const DEFAULT_GENERATE_GATE: f32 = 0.65;
/// Maximum number of major-or-worse lint findings tolerated for a ready artifact.
pub const DEFAULT_LINT_MAX_MAJOR: usize = 0;
/// Minimum generation score for a ready artifact.
pub const DEFAULT_GENERATE_READY_MIN: f32 = 0.70;

/// Weight of the vector score in hybrid fusion.
pub const DEFAULT_HYBRID_ALPHA: f32 = 0.7;
/// Relevance/diversity trade-off for MMR.
pub const DEFAULT_MMR_LAMBDA: f32 = 0.5;
/// Multiplier applied to `k` to size the fetched pool (`fetch_k = max(k, 4k)`).
pub const FETCH_K_MULTIPLIER: usize = 4;

/// BM25 term-frequency saturation.
pub const BM25_K1: f32 = 1.5;
/// BM25 length normalization.
pub const BM25_B: f32 = 0.75;
/// Floor for negative idf values, as a fraction of the average idf.
pub const BM25_EPSILON: f32 = 0.25;

/// Number of hits averaged into coverage.
pub const COVERAGE_TOP_N: usize = 5;
/// Number of hits averaged into confidence.
pub const CONFIDENCE_TOP_N: usize = 3;
/// Score penalty per unit of violation weight.
pub const VIOLATION_PENALTY: f32 = 0.05;

/// Characters of content used as the guideline retrieval query.
pub const GUIDELINE_QUERY_CHARS: usize = 500;
/// Characters of content used as the terminology query.
pub const TERMINOLOGY_QUERY_CHARS: usize = 300;
/// Characters of content used as the glossary query.
pub const GLOSSARY_QUERY_CHARS: usize = 120;

/// Maximum citation snippet length in characters.
pub const CITATION_SNIPPET_CHARS: usize = 300;
/// Expected tokens per inline citation marker.
pub const TOKENS_PER_CITATION: usize = 200;
/// Approximate characters per token used by the citation density estimate.
pub const CHARS_PER_TOKEN: usize = 4;

/// Default query prefix for E5-style embedders.
pub const DEFAULT_QUERY_PREFIX: &str = "query: ";
/// Default passage prefix for E5-style embedders.
pub const DEFAULT_PASSAGE_PREFIX: &str = "passage: ";

/// Default embedding dimension (multilingual E5 large).
pub const DEFAULT_EMBEDDING_DIM: usize = 1024;

/// Returns `fetch_k = max(k, 4k)`.
#[inline]
pub fn default_fetch_k(k: usize) -> usize {
    k.max(k.saturating_mul(FETCH_K_MULTIPLIER))
}

/// Clamps a score into `[0, 1]`, mapping NaN to `0`.
#[inline]
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Returns the first `max_chars` characters of `text` without splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fetch_k() {
        assert_eq!(default_fetch_k(0), 0);
        assert_eq!(default_fetch_k(1), 4);
        assert_eq!(default_fetch_k(5), 20);
    }

    #[test]
    fn test_clamp_unit() {
        assert_eq!(clamp_unit(-0.5), 0.0);
        assert_eq!(clamp_unit(1.5), 1.0);
        assert_eq!(clamp_unit(0.25), 0.25);
        assert_eq!(clamp_unit(f32::NAN), 0.0);
    }

    #[test]
    fn test_truncate_chars_respects_code_points() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("ab", 10), "ab");
        assert_eq!(truncate_chars("미정입니다", 2), "미정");
        assert_eq!(truncate_chars("", 5), "");
    }
}
