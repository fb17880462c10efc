//! Free-text search helpers shared by the storage adapters.

/// Maximum number of stores a search returns.
pub const SEARCH_LIMIT: i64 = 5;

/// Splits a query into lower-case alphanumeric terms, dropping duplicates.
pub fn terms(query: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for word in query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let word = word.to_lowercase();
        if !out.contains(&word) {
            out.push(word);
        }
    }
    out
}

/// Renders terms as a PostgreSQL `to_tsquery` expression in which any term may match.
///
/// Terms from [`terms`] contain only alphanumerics, so no operator escaping is needed.
pub fn ts_query(terms: &[String]) -> String {
    terms.join(" | ")
}

fn field_score(terms: &[String], text: &str) -> f64 {
    let tokens: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    if tokens.is_empty() {
        return 0.0;
    }

    terms
        .iter()
        .map(|term| tokens.iter().filter(|t| *t == term).count())
        .filter(|hits| *hits > 0)
        .map(|hits| 0.5 + 0.5 * hits as f64 / tokens.len() as f64)
        .sum()
}

/// Relevance of a store's name and description for the given terms; 0 means no match.
pub fn relevance(terms: &[String], name: &str, description: Option<&str>) -> f64 {
    field_score(terms, name) + description.map_or(0.0, |d| field_score(terms, d))
}
