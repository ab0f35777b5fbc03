//! Helpers for pulling a province identifier out of free-text partner fields
//! such as `"Sumatera Utara (45,20%)"`.

/// First whitespace-delimited token, uppercased. `None` for blank text.
pub fn first_token_upper(text: &str) -> Option<String> {
    text.split_whitespace().next().map(str::to_uppercase)
}

/// True when `candidate` is a prefix of `text` that ends on a word boundary.
///
/// Both sides are expected to be normalized already. A boundary is the end
/// of `text` or any non-alphanumeric character.
pub fn is_word_prefix(text: &str, candidate: &str) -> bool {
    if candidate.is_empty() || !text.starts_with(candidate) {
        return false;
    }
    match text[candidate.len()..].chars().next() {
        None => true,
        Some(c) => !c.is_alphanumeric(),
    }
}

/// Longest candidate that is a word prefix of `text`.
///
/// Ties on length cannot happen between distinct candidates that are both
/// prefixes of the same text, so the result does not depend on input order.
pub fn longest_word_prefix<'a, I>(text: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    candidates
        .into_iter()
        .filter(|c| is_word_prefix(text, c))
        .max_by_key(|c| c.len())
}

#[cfg(test)]
mod tests {
    use super::{first_token_upper, is_word_prefix, longest_word_prefix};

    #[test]
    fn first_token_is_uppercased() {
        assert_eq!(first_token_upper("Riau (22,61%)").as_deref(), Some("RIAU"));
        assert_eq!(
            first_token_upper("  sumatera utara market").as_deref(),
            Some("SUMATERA")
        );
        assert_eq!(first_token_upper("   "), None);
    }

    #[test]
    fn word_prefix_requires_boundary() {
        assert!(is_word_prefix("RIAU (22,61%)", "RIAU"));
        assert!(is_word_prefix("BALI", "BALI"));
        assert!(!is_word_prefix("RIAUX", "RIAU"));
        assert!(!is_word_prefix("KEPULAUAN RIAU", "RIAU"));
        assert!(!is_word_prefix("RIAU", ""));
    }

    #[test]
    fn longest_prefix_prefers_multi_word_names() {
        let known = ["JAWA", "JAWA BARAT", "BALI"];
        assert_eq!(
            longest_word_prefix("JAWA BARAT (35,64%)", known),
            Some("JAWA BARAT")
        );
        assert_eq!(longest_word_prefix("JAWA TENGAH", known), Some("JAWA"));
        assert_eq!(longest_word_prefix("JAMBI", known), None);
    }
}
