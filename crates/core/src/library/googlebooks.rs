//! Google Books API client (fallback metadata source).
//!
//! Uses the keyless volumes endpoint: `/books/v1/volumes?q=isbn:<isbn13>`.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use crate::errors::MetadataError;
use crate::library::isbn::extract_year;
use crate::library::openlibrary::{check_response, BookMeta};
use crate::library::{DEFAULT_TIMEOUT_SECS, USER_AGENT};

/// Production Google Books base URL.
pub const GOOGLEBOOKS_URL: &str = "https://www.googleapis.com";

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
struct Volume {
    #[serde(rename = "volumeInfo")]
    volume_info: Option<VolumeInfo>,
}

#[derive(Debug, Deserialize)]
struct VolumeInfo {
    #[serde(rename = "publishedDate")]
    published_date: Option<String>,
    publisher: Option<String>,
    #[serde(rename = "imageLinks")]
    image_links: Option<ImageLinks>,
}

#[derive(Debug, Deserialize)]
struct ImageLinks {
    thumbnail: Option<String>,
    #[serde(rename = "smallThumbnail")]
    small_thumbnail: Option<String>,
}

/// Asynchronous Google Books client.
#[derive(Debug, Clone)]
pub struct GoogleBooksClient {
    http: reqwest::Client,
    base_url: String,
}

impl GoogleBooksClient {
    /// Client against the production API with the default timeout.
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Client against the production API with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::build(GOOGLEBOOKS_URL, timeout)
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
        info!(base_url = %base_url, "created GoogleBooksClient");
        Self { http, base_url }
    }

    /// Metadata fields for an ISBN; empty when no volume matches.
    pub async fn fetch_meta(&self, isbn13: &str) -> Result<BookMeta, MetadataError> {
        let url = format!("{}/books/v1/volumes", self.base_url);
        let q = format!("isbn:{}", isbn13);
        let resp = self.http.get(&url).query(&[("q", q.as_str())]).send().await?;
        check_response(&resp)?;

        let body: VolumesResponse = resp
            .json()
            .await
            .map_err(|e| MetadataError::ParseError(e.to_string()))?;

        let Some(info) = body.items.into_iter().next().and_then(|v| v.volume_info) else {
            debug!(isbn13, "no volume found");
            return Ok(BookMeta::default());
        };

        let publish_year = info.published_date.as_deref().and_then(extract_year);
        let publisher = info
            .publisher
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        let cover_image = info
            .image_links
            .and_then(|img| img.thumbnail.or(img.small_thumbnail));

        Ok(BookMeta {
            publish_year,
            publisher,
            cover_image,
        })
    }
}

impl Default for GoogleBooksClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_parsing() {
        let json = r#"{"items": [{"volumeInfo": {
            "publishedDate": "2004-10-01",
            "publisher": "Penguin",
            "imageLinks": {"smallThumbnail": "small.jpg", "thumbnail": "thumb.jpg"}
        }}]}"#;
        let body: VolumesResponse = serde_json::from_str(json).unwrap();
        let info = body.items[0].volume_info.as_ref().unwrap();
        assert_eq!(info.published_date.as_deref(), Some("2004-10-01"));
        assert_eq!(
            info.image_links.as_ref().unwrap().thumbnail.as_deref(),
            Some("thumb.jpg")
        );
    }

    #[test]
    fn test_empty_items() {
        let body: VolumesResponse = serde_json::from_str(r#"{"kind": "books#volumes"}"#).unwrap();
        assert!(body.items.is_empty());
    }
}
