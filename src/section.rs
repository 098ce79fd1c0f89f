//! Document section codes (`M1`, `M2.3`, ...).

/// Section used when a request names none.
pub const DEFAULT_SECTION: &str = "M2.3";

/// Placeholder for section hints that match no known section.
pub const UNKNOWN_SECTION: &str = "UNKNOWN";

/// Sections the router and lint schemas know about.
pub const KNOWN_SECTIONS: [&str; 6] = ["M1", "M2.3", "M2.4", "M2.5", "M2.6", "M2.7"];

/// Upper-cases and `M`-prefixes a section code: `"2.3"` becomes `"M2.3"`.
///
/// Empty input yields [`DEFAULT_SECTION`].
pub fn normalize_section(raw: &str) -> String {
    let s = raw.trim().to_uppercase();
    if s.is_empty() {
        return DEFAULT_SECTION.to_string();
    }
    if s.starts_with('M') {
        s
    } else {
        format!("M{s}")
    }
}

/// Like [`normalize_section`] but maps anything outside [`KNOWN_SECTIONS`] to `UNKNOWN`.
pub fn canonical_section(raw: &str) -> String {
    let s = normalize_section(raw);
    if KNOWN_SECTIONS.contains(&s.as_str()) {
        s
    } else {
        UNKNOWN_SECTION.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_section_adds_prefix() {
        assert_eq!(normalize_section("2.3"), "M2.3");
        assert_eq!(normalize_section(" m2.6 "), "M2.6");
        assert_eq!(normalize_section("M1"), "M1");
        assert_eq!(normalize_section(""), "M2.3");
    }

    #[test]
    fn test_canonical_section_rejects_unknown() {
        assert_eq!(canonical_section("2.7"), "M2.7");
        assert_eq!(canonical_section("M9.9"), "UNKNOWN");
        assert_eq!(canonical_section("qos"), "UNKNOWN");
    }
}
