//! Edit-distance similarity on a 0-100 scale

use strsim::normalized_levenshtein;

/// Similarity ratio between two strings, rounded to a whole number in [0, 100]
///
/// Two empty strings are identical (100); one empty string matches nothing (0).
pub fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    (normalized_levenshtein(a, b) * 100.0).round()
}

/// Length of `needle` as a percentage of `haystack`, capped at 100
pub fn length_ratio(needle: &str, haystack: &str) -> f64 {
    let haystack_len = haystack.chars().count();
    if haystack_len == 0 {
        return 0.0;
    }
    let needle_len = needle.chars().count();
    (needle_len as f64 / haystack_len as f64 * 100.0).min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_strings() {
        assert_eq!(ratio("103D72", "103D72"), 100.0);
        assert_eq!(ratio("", ""), 100.0);
    }

    #[test]
    fn test_empty_side() {
        assert_eq!(ratio("", "ABC"), 0.0);
        assert_eq!(ratio("ABC", ""), 0.0);
    }

    #[test]
    fn test_single_edit() {
        // one deletion over six characters
        assert_eq!(ratio("103D72", "103D7"), 83.0);
    }

    #[test]
    fn test_symmetric() {
        assert_eq!(ratio("ACME GAS", "ACME GASES"), ratio("ACME GASES", "ACME GAS"));
    }

    #[test]
    fn test_length_ratio() {
        assert_eq!(length_ratio("ACME", "ACME GAS"), 50.0);
        assert_eq!(length_ratio("ABC", ""), 0.0);
        assert_eq!(length_ratio("ABCDEF", "ABC"), 100.0);
    }
}
