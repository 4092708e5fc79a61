//! FTS5 query sanitization.
//!
//! User-supplied recall queries are never passed to `MATCH` verbatim:
//! FTS5's query syntax includes boolean operators, column filters, and
//! phrase/prefix tokens that would let a crafted prompt change the shape
//! of the query instead of just its terms. We extract plain terms and
//! rebuild a safe `OR`-joined MATCH expression ourselves.

/// Turn free text into a safe FTS5 MATCH expression: each alphanumeric
/// token (plus internal `_`/`-`) becomes a quoted phrase, joined with OR,
/// so a term containing `"`, `*`, `:`, or a reserved keyword can never
/// escape its quoting.
pub fn sanitize_fts5_query(input: &str) -> Option<String> {
    let terms: Vec<String> = input
        .split(|c: char| !c.is_alphanumeric() && c != '_' && c != '-')
        .filter(|t| !t.is_empty())
        .map(|t| format!("\"{}\"", t.replace('"', "")))
        .filter(|t| t.len() > 2)
        .collect();

    if terms.is_empty() {
        return None;
    }

    Some(terms.join(" OR "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_fts5_operators() {
        let sanitized = sanitize_fts5_query("rust AND \"drop table\" OR *").unwrap();
        assert!(!sanitized.contains("AND"));
        assert!(sanitized.contains("\"rust\""));
    }

    #[test]
    fn test_sanitize_empty_input_returns_none() {
        assert!(sanitize_fts5_query("   ").is_none());
        assert!(sanitize_fts5_query("* : \"").is_none());
    }

    #[test]
    fn test_sanitize_joins_multiple_terms_with_or() {
        let sanitized = sanitize_fts5_query("dark mode preference").unwrap();
        assert_eq!(sanitized, "\"dark\" OR \"mode\" OR \"preference\"");
    }
}
