//! Tagged-block extraction from oracle replies
//!
//! Every oracle round wraps its structured payload in a named block such
//! as `<keys>...</keys>`. Models drift on the closing delimiter: replies
//! have been observed with `<\keys>`, `<\\keys>` and a plain repeated
//! `<keys>` closer. Rather than chain per-round regex fallbacks, a single
//! scanner accepts an enumerated set of closer spellings. A missing block
//! is `None`, which callers must treat as an empty payload, never as a
//! failed round.

/// Extract the payload of the first `tag` block in `response`.
///
/// The opener is `<tag>`. The closer is the earliest occurrence after the
/// opener of any accepted variant: `</tag>`, `<\tag>`, `<\\tag>`, or a
/// repeated `<tag>`. The payload is returned trimmed; an empty block
/// yields `Some("")`.
pub fn extract_block(response: &str, tag: &str) -> Option<String> {
    let opener = format!("<{tag}>");
    let start = response.find(&opener)? + opener.len();
    let rest = &response[start..];

    let closers = [
        format!("</{tag}>"),
        format!("<\\{tag}>"),
        format!("<\\\\{tag}>"),
        opener,
    ];

    let end = closers.iter().filter_map(|c| rest.find(c.as_str())).min()?;

    Some(rest[..end].trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_standard_closer() {
        let reply = "sure, here you go\n<keys>\nfamily\nhealth\n</keys>\nanything else?";
        assert_eq!(
            extract_block(reply, "keys"),
            Some("family\nhealth".to_string())
        );
    }

    #[test]
    fn test_extracts_escaped_slash_closer() {
        let reply = "<keys>\nfamily\n<\\keys>";
        assert_eq!(extract_block(reply, "keys"), Some("family".to_string()));
    }

    #[test]
    fn test_extracts_doubled_backslash_closer() {
        let reply = "<keys>family<\\\\keys>";
        assert_eq!(extract_block(reply, "keys"), Some("family".to_string()));
    }

    #[test]
    fn test_extracts_repeated_opener_as_closer() {
        let reply = "<new>\ntravel | trips and destinations\n<new>";
        assert_eq!(
            extract_block(reply, "new"),
            Some("travel | trips and destinations".to_string())
        );
    }

    #[test]
    fn test_earliest_closer_wins() {
        // A repeated opener before the proper closer bounds the payload
        let reply = "<ans>first<ans>second</ans>";
        assert_eq!(extract_block(reply, "ans"), Some("first".to_string()));
    }

    #[test]
    fn test_missing_block_is_none() {
        assert_eq!(extract_block("no tags here", "keys"), None);
    }

    #[test]
    fn test_unterminated_block_is_none() {
        assert_eq!(extract_block("<keys>family\nhealth", "keys"), None);
    }

    #[test]
    fn test_empty_block_is_some_empty() {
        assert_eq!(extract_block("<context></context>", "context"), Some(String::new()));
        assert_eq!(
            extract_block("<context>\n  \n</context>", "context"),
            Some(String::new())
        );
    }

    #[test]
    fn test_tag_names_do_not_cross_match() {
        let reply = "<fact>family | has a sister</fact>";
        assert_eq!(extract_block(reply, "new"), None);
        assert_eq!(
            extract_block(reply, "fact"),
            Some("family | has a sister".to_string())
        );
    }
}
