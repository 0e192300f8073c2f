//! Free-text similarity used to accept slightly misspelled album and song names.

/// Similarity policy for album and song names; 0.8 tolerates minor typos,
/// 1.0 would demand exact input.
pub const NAME_SIMILARITY_THRESHOLD: f64 = 0.80;

/// Whether `a` and `b` are similar enough under `threshold`.
///
/// Scored with the Sørensen-Dice coefficient over character bigrams, ignoring
/// whitespace; symmetric in its arguments. Number tokens never go through
/// this: short numeric strings produce too many false positives, so they are
/// matched by exact membership in their variant set instead.
pub fn similar(a: &str, b: &str, threshold: f64) -> bool {
    strsim::sorensen_dice(a, b) >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_passes() {
        assert!(similar("love story", "love story", NAME_SIMILARITY_THRESHOLD));
    }

    #[test]
    fn minor_typo_passes() {
        assert!(similar("lover story", "love story", NAME_SIMILARITY_THRESHOLD));
        assert!(similar("midnight", "midnights", NAME_SIMILARITY_THRESHOLD));
    }

    #[test]
    fn different_names_fail() {
        assert!(!similar("evermore", "folklore", NAME_SIMILARITY_THRESHOLD));
        assert!(!similar("red", "1989", NAME_SIMILARITY_THRESHOLD));
    }

    #[test]
    fn comparison_is_symmetric() {
        let (a, b) = ("fearless", "fearles");
        assert_eq!(
            similar(a, b, NAME_SIMILARITY_THRESHOLD),
            similar(b, a, NAME_SIMILARITY_THRESHOLD)
        );
    }

    #[test]
    fn whitespace_is_ignored() {
        assert!(similar("lovestory", "love story", NAME_SIMILARITY_THRESHOLD));
    }
}
