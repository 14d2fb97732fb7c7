//! Enrichment passes over the library CSV.
//!
//! Three operations, each a linear scan over the table:
//!
//! - [`enrich`] fills blank `publish_year` / `publisher` / `cover_image`
//!   cells by ISBN lookup (Open Library first, Google Books fallback).
//! - [`fill_isbn`] discovers missing ISBNs via title/author search, then
//!   backfills metadata from the Books API.
//! - [`strip_covers`] clears cover cells that are not local `covers/` paths.

use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::errors::CsvError;
use crate::library::googlebooks::GoogleBooksClient;
use crate::library::isbn::{normalize_isbn13, pick_isbn13};
use crate::library::openlibrary::{BookMeta, OpenLibraryClient};
use crate::library::score::choose_best;
use crate::library::table::{is_blank, CsvTable};

/// Pause between consecutive metadata lookups, to be polite to the APIs.
pub const LOOKUP_DELAY: Duration = Duration::from_millis(200);

/// Default minimum match score for accepting a search candidate.
pub const DEFAULT_MIN_SCORE: f64 = 0.42;

/// Columns the enrich pass guarantees exist in the output.
const EXPECTED_COLUMNS: &[&str] = &[
    "publish_year",
    "publisher",
    "cover_image",
    "updated_at",
    "isbn13",
];

// ---------------------------------------------------------------------------
// Reports and options
// ---------------------------------------------------------------------------

/// Counters from an [`enrich`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichReport {
    /// Rows that had an ISBN and at least one blank field to fill.
    pub looked_up: usize,
    /// Rows where at least one blank was actually filled.
    pub updated: usize,
}

/// Options for [`fill_isbn`].
#[derive(Debug, Clone, Copy)]
pub struct FillOptions {
    /// Overwrite populated metadata cells instead of filling blanks only.
    /// Discovered ISBNs are always written.
    pub overwrite: bool,
    /// Minimum combined title/author score for accepting a candidate.
    pub min_score: f64,
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            min_score: DEFAULT_MIN_SCORE,
        }
    }
}

/// Counters from a [`fill_isbn`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillReport {
    /// Rows that received a discovered ISBN.
    pub filled: usize,
    /// Rows searched without an acceptable candidate.
    pub not_found: usize,
    /// Rows skipped (no title, or ISBN already present).
    pub skipped: usize,
}

/// Counters from a [`strip_covers`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StripReport {
    /// Cells cleared because they were not local `covers/` paths.
    pub removed: usize,
}

// ---------------------------------------------------------------------------
// enrich
// ---------------------------------------------------------------------------

/// Fill blank metadata fields for every row with a usable ISBN-13.
///
/// Only blank cells are written (a `publisher` of the literal `Unknown`
/// counts as blank). Rows that change get an RFC 3339 `updated_at` stamp.
/// Lookup failures are logged and treated as "no data" -- a flaky API never
/// aborts the pass.
pub async fn enrich(
    table: &mut CsvTable,
    openlibrary: &OpenLibraryClient,
    googlebooks: &GoogleBooksClient,
) -> EnrichReport {
    for col in EXPECTED_COLUMNS {
        table.ensure_column(col);
    }

    let mut report = EnrichReport::default();

    for row in 0..table.len() {
        let Some(isbn13) = table.get(row, "isbn13").and_then(normalize_isbn13) else {
            continue;
        };

        let need_year = cell_blank(table, row, "publish_year");
        let need_pub = cell_blank(table, row, "publisher")
            || table.get(row, "publisher").map(str::trim) == Some("Unknown");
        let need_cover = cell_blank(table, row, "cover_image");

        if !(need_year || need_pub || need_cover) {
            continue;
        }

        report.looked_up += 1;
        let meta = lookup_metadata(openlibrary, googlebooks, &isbn13).await;

        let mut changed = false;
        if need_year {
            if let Some(year) = meta.publish_year {
                table.set(row, "publish_year", year.to_string());
                changed = true;
            }
        }
        if need_pub {
            if let Some(ref publisher) = meta.publisher {
                table.set(row, "publisher", publisher.clone());
                changed = true;
            }
        }
        if need_cover {
            if let Some(ref cover) = meta.cover_image {
                table.set(row, "cover_image", cover.clone());
                changed = true;
            }
        }

        if changed {
            table.set(row, "updated_at", Utc::now().to_rfc3339());
            report.updated += 1;
        }
        debug!(row, isbn13, changed, "enrich row done");
    }

    info!(
        looked_up = report.looked_up,
        updated = report.updated,
        "enrich pass complete"
    );
    report
}

/// Open Library first; fall back to Google Books when it has nothing.
async fn lookup_metadata(
    openlibrary: &OpenLibraryClient,
    googlebooks: &GoogleBooksClient,
    isbn13: &str,
) -> BookMeta {
    match openlibrary.fetch_meta(isbn13).await {
        Ok(meta) if !meta.is_empty() => {
            tokio::time::sleep(LOOKUP_DELAY).await;
            return meta;
        }
        Ok(_) => {}
        Err(e) => warn!(isbn13, error = %e, "Open Library lookup failed"),
    }

    match googlebooks.fetch_meta(isbn13).await {
        Ok(meta) => {
            tokio::time::sleep(LOOKUP_DELAY).await;
            meta
        }
        Err(e) => {
            warn!(isbn13, error = %e, "Google Books lookup failed");
            BookMeta::default()
        }
    }
}

// ---------------------------------------------------------------------------
// fill-isbn
// ---------------------------------------------------------------------------

/// Discover missing ISBNs by title/author search and backfill metadata.
///
/// Requires a `title` column and at least one of `isbn13` / `isbn`. The
/// best search candidate at or above `min_score` supplies the ISBN, which
/// is always written; the follow-up Books API record fills the metadata
/// columns (blank-only unless `overwrite` is set). Cover columns are never
/// touched by this pass.
pub async fn fill_isbn(
    table: &mut CsvTable,
    openlibrary: &OpenLibraryClient,
    opts: FillOptions,
) -> Result<FillReport, CsvError> {
    if !table.has_column("title") {
        return Err(CsvError::MissingColumn("title".into()));
    }
    let has_isbn13 = table.has_column("isbn13");
    let has_isbn = table.has_column("isbn");
    if !(has_isbn13 || has_isbn) {
        return Err(CsvError::MissingColumn("isbn13".into()));
    }

    let mut report = FillReport::default();

    for row in 0..table.len() {
        let title = table.get(row, "title").unwrap_or("").trim().to_string();
        let author = table.get(row, "author").unwrap_or("").trim().to_string();

        if is_blank(&title) {
            report.skipped += 1;
            continue;
        }

        let missing = (has_isbn13 && cell_blank(table, row, "isbn13"))
            || (has_isbn && cell_blank(table, row, "isbn"));
        if !missing {
            report.skipped += 1;
            continue;
        }

        let docs = match openlibrary.search(&title, &author).await {
            Ok(docs) => docs,
            Err(e) => {
                warn!(title, error = %e, "search failed");
                Vec::new()
            }
        };

        let Some(best) = choose_best(&title, &author, &docs, opts.min_score) else {
            report.not_found += 1;
            continue;
        };
        let Some(isbn13) = best.isbn.as_deref().and_then(|c| pick_isbn13(c)) else {
            report.not_found += 1;
            continue;
        };

        // The discovered ISBN always wins.
        if has_isbn13 {
            table.set(row, "isbn13", isbn13.clone());
        }
        if has_isbn {
            table.set(row, "isbn", isbn13.clone());
        }

        match openlibrary.fetch_record(&isbn13).await {
            Ok(Some(record)) => {
                if let Some(ref title) = record.title {
                    fill_cell(table, row, "title", title, opts.overwrite);
                }
                let authors = record.author_names();
                if !authors.is_empty() {
                    fill_cell(table, row, "author", &authors.join(", "), opts.overwrite);
                }
                if let Some(ref date) = record.publish_date {
                    fill_cell(table, row, "published", date, opts.overwrite);
                    fill_cell(table, row, "publish_date", date, opts.overwrite);
                }
                if let Some(publisher) = record.publisher() {
                    fill_cell(table, row, "publisher", &publisher, opts.overwrite);
                }
            }
            Ok(None) => debug!(isbn13, "no books record for discovered ISBN"),
            Err(e) => warn!(isbn13, error = %e, "books lookup failed"),
        }

        report.filled += 1;
        tokio::time::sleep(LOOKUP_DELAY).await;
    }

    info!(
        filled = report.filled,
        not_found = report.not_found,
        skipped = report.skipped,
        "fill-isbn pass complete"
    );
    Ok(report)
}

// ---------------------------------------------------------------------------
// strip-covers
// ---------------------------------------------------------------------------

/// Clear every cover cell that is not a local path under `covers/`.
pub fn strip_covers(table: &mut CsvTable, column: &str) -> Result<StripReport, CsvError> {
    if !table.has_column(column) {
        return Err(CsvError::MissingColumn(column.into()));
    }

    let mut report = StripReport::default();
    for row in 0..table.len() {
        let Some(value) = table.get(row, column) else {
            continue;
        };
        if is_blank(value) {
            continue;
        }
        if !value.trim().starts_with("covers/") {
            table.set(row, column, "");
            report.removed += 1;
        }
    }

    info!(removed = report.removed, column, "strip-covers pass complete");
    Ok(report)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn cell_blank(table: &CsvTable, row: usize, column: &str) -> bool {
    table.get(row, column).map(is_blank).unwrap_or(true)
}

/// Write a cell when overwriting is allowed or the cell is blank. Columns
/// the table does not have are ignored.
fn fill_cell(table: &mut CsvTable, row: usize, column: &str, value: &str, overwrite: bool) {
    if !table.has_column(column) {
        return;
    }
    if overwrite || cell_blank(table, row, column) {
        table.set(row, column, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(headers: &[&str], rows: &[&[&str]]) -> CsvTable {
        let mut table = CsvTable::default();
        for h in headers {
            table.ensure_column(h);
        }
        for row in rows {
            table.push_row(row.iter().map(|c| c.to_string()).collect());
        }
        table
    }

    #[test]
    fn test_strip_covers_keeps_local_paths() {
        let mut table = table_with(
            &["title", "cover_image"],
            &[
                &["A", "covers/a.jpg"],
                &["B", "https://example.com/b.jpg"],
                &["C", ""],
                &["D", "nan"],
            ],
        );
        let report = strip_covers(&mut table, "cover_image").unwrap();
        assert_eq!(report.removed, 1);
        assert_eq!(table.get(0, "cover_image"), Some("covers/a.jpg"));
        assert_eq!(table.get(1, "cover_image"), Some(""));
        // Blank-ish cells are left alone.
        assert_eq!(table.get(3, "cover_image"), Some("nan"));
    }

    #[test]
    fn test_strip_covers_missing_column() {
        let mut table = table_with(&["title"], &[&["A"]]);
        let err = strip_covers(&mut table, "cover_image").unwrap_err();
        assert!(matches!(err, CsvError::MissingColumn(_)));
    }

    #[test]
    fn test_fill_cell_blank_only() {
        let mut table = table_with(&["publisher"], &[&["Ace"], &[""]]);
        fill_cell(&mut table, 0, "publisher", "Tor", false);
        fill_cell(&mut table, 1, "publisher", "Tor", false);
        assert_eq!(table.get(0, "publisher"), Some("Ace"));
        assert_eq!(table.get(1, "publisher"), Some("Tor"));

        fill_cell(&mut table, 0, "publisher", "Orbit", true);
        assert_eq!(table.get(0, "publisher"), Some("Orbit"));
    }

    #[tokio::test]
    async fn test_fill_isbn_requires_columns() {
        let mut table = table_with(&["author"], &[&["Someone"]]);
        let client = OpenLibraryClient::with_base_url("http://127.0.0.1:1");
        let err = fill_isbn(&mut table, &client, FillOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CsvError::MissingColumn(_)));

        let mut table = table_with(&["title"], &[&["Dune"]]);
        let err = fill_isbn(&mut table, &client, FillOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CsvError::MissingColumn(_)));
    }

    #[tokio::test]
    async fn test_enrich_skips_rows_without_isbn() {
        // No network call happens for rows with no usable ISBN, so an
        // unroutable client is safe here.
        let mut table = table_with(
            &["title", "isbn13", "publish_year"],
            &[&["No ISBN", "", ""], &["Bad ISBN", "abc", ""]],
        );
        let ol = OpenLibraryClient::with_base_url("http://127.0.0.1:1");
        let gb = GoogleBooksClient::with_base_url("http://127.0.0.1:1");
        let report = enrich(&mut table, &ol, &gb).await;
        assert_eq!(report.looked_up, 0);
        assert_eq!(report.updated, 0);
        // Expected columns were appended.
        assert!(table.has_column("updated_at"));
        assert!(table.has_column("cover_image"));
    }

    #[tokio::test]
    async fn test_enrich_skips_complete_rows() {
        let mut table = table_with(
            &["isbn13", "publish_year", "publisher", "cover_image"],
            &[&["9780441172719", "1965", "Chilton", "covers/dune.jpg"]],
        );
        let ol = OpenLibraryClient::with_base_url("http://127.0.0.1:1");
        let gb = GoogleBooksClient::with_base_url("http://127.0.0.1:1");
        let report = enrich(&mut table, &ol, &gb).await;
        assert_eq!(report.looked_up, 0);
        assert_eq!(table.get(0, "updated_at"), Some(""));
    }
}
