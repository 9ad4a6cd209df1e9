//! Title tokenization for the case-insensitive title search.
//!
//! A title is indexed as its lower-cased alphanumeric runs, stored as a
//! space-delimited column with a leading and trailing space so that a token
//! match is a plain substring search for `" token "`. A query matches a title
//! when every query token is one of the title's tokens.

/// Splits `text` into lower-cased runs of alphanumeric characters.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Renders the stored token column for a title.
pub fn token_column(title: &str) -> String {
    let tokens = tokenize(title);
    if tokens.is_empty() {
        return String::new();
    }
    format!(" {} ", tokens.join(" "))
}

/// JSON array of the distinct query tokens, bound as a single parameter.
pub fn query_terms(query: &str) -> String {
    let mut tokens = tokenize(query);
    tokens.sort();
    tokens.dedup();
    serde_json::Value::from(tokens).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_splits_and_lowercases() {
        assert_eq!(
            tokenize("Half-Crown (George III)"),
            vec!["half", "crown", "george", "iii"]
        );
        assert!(tokenize("  --  ").is_empty());
    }

    #[test]
    fn test_token_column_is_space_delimited() {
        assert_eq!(token_column("Gold Sovereign"), " gold sovereign ");
        assert_eq!(token_column("!!!"), "");
    }

    #[test]
    fn test_query_terms_are_distinct() {
        assert_eq!(query_terms("Crown crown CROWN half"), r#"["crown","half"]"#);
        assert_eq!(query_terms(""), "[]");
    }
}
