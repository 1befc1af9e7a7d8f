/// Trims, collapses inner whitespace and lowercases.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
        .to_lowercase()
}

/// Case insensitive, whitespace insensitive equality.
pub fn answer_matches(candidate: &str, expected: &str) -> bool {
    let candidate = normalize(candidate);
    !candidate.is_empty() && candidate == normalize(expected)
}

#[cfg(test)]
mod tests {
    use super::{answer_matches, normalize};

    #[test]
    fn normalize_trims_collapses_and_lowercases() {
        assert_eq!(normalize("  Ice \t  Cream \n"), "ice cream");
    }

    #[test]
    fn matching_ignores_case_and_surrounding_whitespace() {
        assert!(answer_matches(" Apple ", "apple"));
        assert!(answer_matches("사과", " 사과"));
    }

    #[test]
    fn matching_is_not_substring_containment() {
        assert!(!answer_matches("an apple", "apple"));
        assert!(!answer_matches("app", "apple"));
    }

    #[test]
    fn empty_candidate_never_matches() {
        assert!(!answer_matches("   ", ""));
        assert!(!answer_matches("", "apple"));
    }
}
