//! Property tests for keyword matching.

use proptest::prelude::*;
use regex::Regex;
use speccheck_core::{match_keyword, occurs_as_token};

/// Token test written independently of the matcher: the keyword bounded by
/// a non-word character or the string edge on each side.
fn standalone(keyword: &str) -> Regex {
    Regex::new(&format!(r"(?i)(?:^|\W){}(?:\W|$)", regex::escape(keyword))).unwrap()
}

fn keyword_list() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-cA-C0-2]{1,3}", 0..6)
}

fn haystack() -> impl Strategy<Value = String> {
    "[a-cA-C0-2 _\\-]{0,24}"
}

proptest! {
    #[test]
    fn matching_is_deterministic(keywords in keyword_list(), hay in haystack()) {
        prop_assert_eq!(match_keyword(&keywords, &hay), match_keyword(&keywords, &hay));
    }

    #[test]
    fn returns_earliest_token_match_then_earliest_substring(
        keywords in keyword_list(),
        hay in haystack(),
    ) {
        let lowered = hay.to_lowercase();
        let token_index = keywords.iter().position(|k| standalone(k).is_match(&hay));
        let substring_index = keywords
            .iter()
            .position(|k| lowered.contains(&k.to_lowercase()));

        let result = match_keyword(&keywords, &hay);
        prop_assert_eq!(result.is_some(), substring_index.is_some());
        if let Some(found) = result {
            let expected = token_index.or(substring_index).unwrap();
            prop_assert_eq!(found, keywords[expected].as_str());
        }
    }

    #[test]
    fn token_test_agrees_with_boundary_pattern(keyword in "[a-cA-C0-2]{1,3}", hay in haystack()) {
        prop_assert_eq!(occurs_as_token(&hay, &keyword), standalone(&keyword).is_match(&hay));
    }

    #[test]
    fn separated_keyword_is_always_found(
        keyword in "[a-z0-9]{1,5}",
        prefix in "[A-Z0-9]{0,6}",
        suffix in "[A-Z0-9]{0,6}",
    ) {
        let hay = format!("{prefix}-{keyword}-{suffix}");
        prop_assert!(occurs_as_token(&hay, &keyword));
        prop_assert!(standalone(&keyword).is_match(&hay));
        let keywords = [keyword.clone()];
        prop_assert_eq!(match_keyword(&keywords, &hay), Some(keyword.as_str()));
    }
}
