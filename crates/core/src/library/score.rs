//! Search-candidate scoring.
//!
//! Open Library search results are matched back against the CSV row with a
//! token-set Jaccard similarity, weighted toward the title.

use std::collections::HashSet;

use crate::library::openlibrary::SearchDoc;

/// Title weight in the combined score; the remainder goes to the author.
const TITLE_WEIGHT: f64 = 0.75;

/// Lowercase, strip non-alphanumerics, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_space = true;
    for c in s.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_space = false;
        } else if !last_space {
            out.push(' ');
            last_space = true;
        }
    }
    out.trim_end().to_string()
}

/// Word tokens of the normalized text.
pub fn token_set(s: &str) -> HashSet<String> {
    normalize_text(s)
        .split_whitespace()
        .map(|t| t.to_string())
        .collect()
}

/// Jaccard similarity of two token sets. Two empty sets score 0.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let inter = a.intersection(b).count() as f64;
    let uni = a.union(b).count() as f64;
    if uni == 0.0 {
        0.0
    } else {
        inter / uni
    }
}

/// Combined title/author similarity between a CSV row and a search doc.
pub fn score_candidate(row_title: &str, row_author: &str, doc: &SearchDoc) -> f64 {
    let doc_title = doc.title.as_deref().unwrap_or("");
    let doc_author = doc
        .author_name
        .as_deref()
        .and_then(|a| a.first())
        .map(String::as_str)
        .unwrap_or("");

    let t_score = jaccard(&token_set(row_title), &token_set(doc_title));
    let a_score = jaccard(&token_set(row_author), &token_set(doc_author));
    TITLE_WEIGHT * t_score + (1.0 - TITLE_WEIGHT) * a_score
}

/// Best-scoring doc at or above `min_score`, if any.
pub fn choose_best<'a>(
    title: &str,
    author: &str,
    docs: &'a [SearchDoc],
    min_score: f64,
) -> Option<&'a SearchDoc> {
    let mut best: Option<&SearchDoc> = None;
    let mut best_score = 0.0;
    for doc in docs {
        let score = score_candidate(title, author, doc);
        if score > best_score {
            best_score = score;
            best = Some(doc);
        }
    }
    if best_score < min_score {
        return None;
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(title: &str, author: &str) -> SearchDoc {
        SearchDoc {
            title: Some(title.to_string()),
            author_name: Some(vec![author.to_string()]),
            isbn: None,
            first_publish_year: None,
        }
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("The Left Hand of Darkness!"), "the left hand of darkness");
        assert_eq!(normalize_text("  A -- B  "), "a b");
        assert_eq!(normalize_text(""), "");
    }

    #[test]
    fn test_jaccard() {
        let a = token_set("the dispossessed");
        let b = token_set("the dispossessed");
        assert_eq!(jaccard(&a, &b), 1.0);

        let c = token_set("completely different");
        assert_eq!(jaccard(&a, &c), 0.0);

        let empty = HashSet::new();
        assert_eq!(jaccard(&empty, &empty), 0.0);
    }

    #[test]
    fn test_exact_match_scores_one() {
        let d = doc("Dune", "Frank Herbert");
        let score = score_candidate("Dune", "Frank Herbert", &d);
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_title_weighted_over_author() {
        let d = doc("Dune", "Somebody Else");
        let score = score_candidate("Dune", "Frank Herbert", &d);
        assert!((score - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_choose_best_respects_threshold() {
        let docs = vec![doc("Unrelated Work", "Nobody"), doc("Dune", "Frank Herbert")];
        let best = choose_best("Dune", "Frank Herbert", &docs, 0.42).unwrap();
        assert_eq!(best.title.as_deref(), Some("Dune"));

        let weak = vec![doc("Unrelated Work", "Nobody")];
        assert!(choose_best("Dune", "Frank Herbert", &weak, 0.42).is_none());
    }

    #[test]
    fn test_choose_best_empty_docs() {
        assert!(choose_best("Dune", "Frank Herbert", &[], 0.1).is_none());
    }
}
