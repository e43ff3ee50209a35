use std::collections::HashSet;

pub const DEFAULT_MIN_TOKEN_CHARS: usize = 4;

pub fn normalize(input: &str) -> String {
    input
        .to_lowercase()
        .chars()
        .filter(|character| character.is_ascii_lowercase() || character.is_ascii_digit())
        .collect()
}

pub fn word_set(text: &str, min_token_chars: usize) -> HashSet<String> {
    text.to_lowercase()
        .split(|character: char| !(character.is_ascii_alphanumeric() || character == '_'))
        .filter(|token| token.chars().count() >= min_token_chars)
        .map(ToOwned::to_owned)
        .collect()
}

pub fn jaccard(left: &HashSet<String>, right: &HashSet<String>) -> f64 {
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let (small, large) = if left.len() <= right.len() {
        (left, right)
    } else {
        (right, left)
    };
    let intersection = small.iter().filter(|token| large.contains(*token)).count();
    let union = left.len() + right.len() - intersection;

    intersection as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn text_similarity(left: &str, right: &str, min_token_chars: usize) -> f64 {
        jaccard(
            &word_set(left, min_token_chars),
            &word_set(right, min_token_chars),
        )
    }

    #[test]
    fn normalize_strips_separators_and_case() {
        assert_eq!(normalize("Income_Certificate"), "incomecertificate");
        assert_eq!(normalize("INCOME CERTIFICATE"), "incomecertificate");
        assert_eq!(normalize("Form-16 (A)"), "form16a");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn word_set_keeps_tokens_longer_than_three_chars() {
        let set = word_set("The PAN card, Aadhaar & passport copy", DEFAULT_MIN_TOKEN_CHARS);
        let mut tokens = set.into_iter().collect::<Vec<String>>();
        tokens.sort();
        assert_eq!(tokens, vec!["aadhaar", "card", "copy", "passport"]);
    }

    #[test]
    fn jaccard_of_partial_overlap() {
        let left = word_set("passport photo address proof", DEFAULT_MIN_TOKEN_CHARS);
        let right = word_set("passport photo income proof", DEFAULT_MIN_TOKEN_CHARS);
        // 3 shared of 5 distinct
        assert!((jaccard(&left, &right) - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn similarity_is_zero_when_either_side_is_empty() {
        assert_eq!(text_similarity("", "passport photo", 4), 0.0);
        assert_eq!(text_similarity("passport photo", "   ", 4), 0.0);
        assert_eq!(text_similarity("a b c", "a b c", 4), 0.0);
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(input in ".*") {
            let once = normalize(&input);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn similarity_is_symmetric(left in "[a-zA-Z ,.]{0,120}", right in "[a-zA-Z ,.]{0,120}") {
            let forward = text_similarity(&left, &right, DEFAULT_MIN_TOKEN_CHARS);
            let backward = text_similarity(&right, &left, DEFAULT_MIN_TOKEN_CHARS);
            prop_assert_eq!(forward, backward);
            prop_assert!((0.0..=1.0).contains(&forward));
        }
    }
}
