//! Open Library API client.
//!
//! Two endpoints are used: the Books API for structured metadata by ISBN
//! (`/api/books?bibkeys=ISBN:...&format=json&jscmd=data`) and the search
//! endpoint (`/search.json`) for ISBN discovery by title/author.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use crate::errors::MetadataError;
use crate::library::isbn::extract_year;
use crate::library::{DEFAULT_TIMEOUT_SECS, USER_AGENT};

/// Production Open Library base URL.
pub const OPENLIBRARY_URL: &str = "https://openlibrary.org";

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// The subset of book metadata the enrichment passes fill in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookMeta {
    pub publish_year: Option<i32>,
    pub publisher: Option<String>,
    pub cover_image: Option<String>,
}

impl BookMeta {
    /// `true` when no field was found.
    pub fn is_empty(&self) -> bool {
        self.publish_year.is_none() && self.publisher.is_none() && self.cover_image.is_none()
    }
}

/// A record from the Books API (`jscmd=data` shape).
#[derive(Debug, Clone, Deserialize)]
pub struct BookRecord {
    pub title: Option<String>,
    pub publish_date: Option<String>,
    #[serde(default)]
    pub authors: Vec<NamedEntry>,
    #[serde(default)]
    pub publishers: Vec<NamedEntry>,
    pub cover: Option<CoverLinks>,
}

/// A `{ "name": ... }` entry (authors, publishers).
#[derive(Debug, Clone, Deserialize)]
pub struct NamedEntry {
    pub name: Option<String>,
}

/// Cover image URLs by size.
#[derive(Debug, Clone, Deserialize)]
pub struct CoverLinks {
    pub small: Option<String>,
    pub medium: Option<String>,
    pub large: Option<String>,
}

impl BookRecord {
    /// Publication year parsed out of the free-form `publish_date`.
    pub fn publish_year(&self) -> Option<i32> {
        self.publish_date.as_deref().and_then(extract_year)
    }

    /// First non-blank publisher name.
    pub fn publisher(&self) -> Option<String> {
        self.publishers
            .iter()
            .filter_map(|p| p.name.as_deref())
            .map(str::trim)
            .find(|n| !n.is_empty())
            .map(String::from)
    }

    /// All author names, in order.
    pub fn author_names(&self) -> Vec<String> {
        self.authors
            .iter()
            .filter_map(|a| a.name.clone())
            .collect()
    }

    /// Largest available cover URL.
    pub fn cover_image(&self) -> Option<String> {
        let cover = self.cover.as_ref()?;
        cover
            .large
            .clone()
            .or_else(|| cover.medium.clone())
            .or_else(|| cover.small.clone())
    }

    /// The fields the `enrich` pass cares about.
    pub fn meta(&self) -> BookMeta {
        BookMeta {
            publish_year: self.publish_year(),
            publisher: self.publisher(),
            cover_image: self.cover_image(),
        }
    }
}

/// One document from the search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchDoc {
    pub title: Option<String>,
    pub author_name: Option<Vec<String>>,
    pub isbn: Option<Vec<String>>,
    pub first_publish_year: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<SearchDoc>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Asynchronous Open Library client.
#[derive(Debug, Clone)]
pub struct OpenLibraryClient {
    http: reqwest::Client,
    base_url: String,
}

impl OpenLibraryClient {
    /// Client against the production API with the default timeout.
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Client against the production API with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::build(OPENLIBRARY_URL, timeout)
    }

    /// Client against an alternate base URL (test seam).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self::build(&base_url.into(), Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    fn build(base_url: &str, timeout: Duration) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .expect("failed to build reqwest client");
        info!(base_url = %base_url, "created OpenLibraryClient");
        Self { http, base_url }
    }

    /// Look up a book record by ISBN-13. `Ok(None)` when the API has no
    /// entry for that ISBN.
    pub async fn fetch_record(&self, isbn13: &str) -> Result<Option<BookRecord>, MetadataError> {
        let url = format!("{}/api/books", self.base_url);
        let bibkey = format!("ISBN:{}", isbn13);
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("bibkeys", bibkey.as_str()),
                ("format", "json"),
                ("jscmd", "data"),
            ])
            .send()
            .await?;
        check_response(&resp)?;

        let mut entries: HashMap<String, BookRecord> = resp
            .json()
            .await
            .map_err(|e| MetadataError::ParseError(e.to_string()))?;
        let record = entries.remove(&bibkey);
        debug!(isbn13, found = record.is_some(), "books lookup");
        Ok(record)
    }

    /// Metadata fields for an ISBN; empty when the API has no entry.
    pub async fn fetch_meta(&self, isbn13: &str) -> Result<BookMeta, MetadataError> {
        Ok(self
            .fetch_record(isbn13)
            .await?
            .map(|r| r.meta())
            .unwrap_or_default())
    }

    /// Search by title and optional author. Returns an empty list when both
    /// terms are blank.
    pub async fn search(&self, title: &str, author: &str) -> Result<Vec<SearchDoc>, MetadataError> {
        let mut q_parts = Vec::new();
        if !title.is_empty() {
            q_parts.push(format!("title:\"{}\"", title));
        }
        if !author.is_empty() {
            q_parts.push(format!("author:\"{}\"", author));
        }
        if q_parts.is_empty() {
            return Ok(Vec::new());
        }
        let q = q_parts.join(" AND ");

        let url = format!("{}/search.json", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("q", q.as_str()),
                ("limit", "20"),
                (
                    "fields",
                    "title,author_name,first_publish_year,isbn,edition_count,key",
                ),
            ])
            .send()
            .await?;
        check_response(&resp)?;

        let body: SearchResponse = resp
            .json()
            .await
            .map_err(|e| MetadataError::ParseError(e.to_string()))?;
        debug!(title, author, count = body.docs.len(), "search complete");
        Ok(body.docs)
    }
}

impl Default for OpenLibraryClient {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn check_response(resp: &reqwest::Response) -> Result<(), MetadataError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    Err(MetadataError::ApiError {
        status: status.as_u16(),
        body: status.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_field_extraction() {
        let json = r#"{
            "title": "The Information",
            "publish_date": "May 2011",
            "authors": [{"name": "James Gleick"}],
            "publishers": [{"name": "  Pantheon  "}, {"name": "Vintage"}],
            "cover": {"small": "s.jpg", "medium": "m.jpg"}
        }"#;
        let record: BookRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.publish_year(), Some(2011));
        assert_eq!(record.publisher().as_deref(), Some("Pantheon"));
        assert_eq!(record.cover_image().as_deref(), Some("m.jpg"));
        assert_eq!(record.author_names(), vec!["James Gleick"]);
        assert!(!record.meta().is_empty());
    }

    #[test]
    fn test_record_missing_fields() {
        let record: BookRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(record.publish_year(), None);
        assert_eq!(record.publisher(), None);
        assert_eq!(record.cover_image(), None);
        assert!(record.meta().is_empty());
    }

    #[test]
    fn test_cover_prefers_large() {
        let json = r#"{"cover": {"small": "s.jpg", "medium": "m.jpg", "large": "l.jpg"}}"#;
        let record: BookRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.cover_image().as_deref(), Some("l.jpg"));
    }

    #[test]
    fn test_search_response_parsing() {
        let json = r#"{"numFound": 1, "docs": [
            {"title": "Dune", "author_name": ["Frank Herbert"], "isbn": ["9780441172719"]}
        ]}"#;
        let body: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.docs.len(), 1);
        assert_eq!(body.docs[0].title.as_deref(), Some("Dune"));
    }
}
