//! Keyword matching against SKU strings.
//!
//! Matching is two-pass. The first pass looks for each keyword as a
//! standalone token (no word character directly before or after it), so
//! `i5` is not found inside `i512`. Only when no keyword matches that way
//! does the second pass fall back to plain substring containment, which keeps
//! keywords that are not clean tokens usable. Both passes are
//! case-insensitive and walk the list in order, so list order is priority.

/// Find the first keyword present in `haystack`.
///
/// Returns the keyword as configured (original casing). Empty keywords never
/// match.
pub fn match_keyword<'k, S: AsRef<str>>(keywords: &'k [S], haystack: &str) -> Option<&'k str> {
    let hay = haystack.to_lowercase();
    let candidates = || {
        keywords
            .iter()
            .map(AsRef::as_ref)
            .filter(|keyword| !keyword.trim().is_empty())
    };
    candidates()
        .find(|keyword| contains_token(&hay, &keyword.to_lowercase()))
        .or_else(|| candidates().find(|keyword| hay.contains(&keyword.to_lowercase())))
}

/// Word character as understood by the token pass.
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Case-insensitive token test used by the first matching pass.
pub fn occurs_as_token(haystack: &str, keyword: &str) -> bool {
    contains_token(&haystack.to_lowercase(), &keyword.to_lowercase())
}

/// True if `needle` occurs in `hay` with a non-word character (or the string
/// edge) on both sides. Overlapping occurrences are all considered.
fn contains_token(hay: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let mut start = 0;
    while let Some(offset) = hay[start..].find(needle) {
        let begin = start + offset;
        let end = begin + needle.len();
        let open = hay[..begin]
            .chars()
            .next_back()
            .is_none_or(|c| !is_word_char(c));
        let close = hay[end..].chars().next().is_none_or(|c| !is_word_char(c));
        if open && close {
            return true;
        }
        start = begin + hay[begin..].chars().next().map_or(1, char::len_utf8);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_match_beats_earlier_substring_match() {
        // "HD" only occurs inside "FHD", so the bounded "FHD" wins even though
        // "HD" is listed first.
        let keywords = ["HD", "FHD"];
        assert_eq!(match_keyword(&keywords, "I5-8GB-FHD-W11"), Some("FHD"));
    }

    #[test]
    fn list_order_is_priority() {
        let keywords = ["i7", "i5"];
        assert_eq!(match_keyword(&keywords, "i5-i7-combo"), Some("i7"));
    }

    #[test]
    fn falls_back_to_substring() {
        let keywords = ["256"];
        assert_eq!(match_keyword(&keywords, "I5-8GB-256SSD"), Some("256"));
    }

    #[test]
    fn token_pass_rejects_prefix_of_longer_token() {
        let keywords = ["i5", "i512"];
        assert_eq!(match_keyword(&keywords, "X-i512-Y"), Some("i512"));
    }

    #[test]
    fn case_insensitive_and_keeps_configured_casing() {
        let keywords = ["W11"];
        assert_eq!(match_keyword(&keywords, "i5-w11-agrade"), Some("W11"));
    }

    #[test]
    fn overlapping_occurrence_is_found() {
        // first "aa" is followed by 'a'; the overlapping one at index 1 is
        // preceded by 'a'; only the last one is bounded.
        let keywords = ["aa"];
        assert_eq!(match_keyword(&keywords, "aaa-aa"), Some("aa"));
        assert!(contains_token("aaa-aa", "aa"));
        assert!(!contains_token("aaa", "aa"));
    }

    #[test]
    fn keyword_with_symbols_bounded_by_edges() {
        let keywords = ["M.2"];
        assert_eq!(match_keyword(&keywords, "m.2"), Some("M.2"));
    }

    #[test]
    fn empty_keywords_never_match() {
        let keywords = ["", "  "];
        assert_eq!(match_keyword(&keywords, "anything"), None);
    }

    #[test]
    fn none_when_absent() {
        let keywords = ["T480", "T490"];
        assert_eq!(match_keyword(&keywords, "X1-CARBON"), None);
    }
}
