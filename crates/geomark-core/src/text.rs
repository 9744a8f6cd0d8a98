// crates/geomark-core/src/text.rs

/// Convert a string into a folded key suitable for comparison.
///
/// This performs:
/// 1\) Transliterate Unicode → ASCII (e.g. `Łódź` -> `Lodz`)
/// 2\) Normalize to lowercase
/// 3\) Collapse runs of whitespace and trim
///
/// # Examples
///
/// ```rust
/// use geomark_core::text::fold_key;
///
/// assert_eq!(fold_key("Łódź"), "lodz");
/// assert_eq!(fold_key("  São   Paulo "), "sao paulo");
/// ```
pub fn fold_key(s: &str) -> String {
    let folded = deunicode::deunicode(s).to_lowercase();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Compares two strings for equality after folding.
pub fn equals_folded(a: &str, b: &str) -> bool {
    fold_key(a) == fold_key(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_accents_and_case() {
        assert!(equals_folded("MÜNCHEN", "munchen"));
        assert!(equals_folded("Zürich", "zurich"));
        assert!(!equals_folded("Berlin", "Paris"));
    }
}
