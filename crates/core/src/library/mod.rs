//! Book-library CSV maintenance.
//!
//! The library subsystem is responsible for:
//! 1. **Tables** -- reading and writing the library CSV while preserving
//!    column order.
//! 2. **Lookups** -- querying Open Library (primary) and Google Books
//!    (fallback) for book metadata by ISBN or title/author search.
//! 3. **Passes** -- the enrichment operations that fill missing fields,
//!    discover ISBNs, and strip non-local cover references.

pub mod enrich;
pub mod googlebooks;
pub mod isbn;
pub mod openlibrary;
pub mod score;
pub mod table;

pub use enrich::{enrich, fill_isbn, strip_covers, EnrichReport, FillOptions, FillReport, StripReport};
pub use googlebooks::GoogleBooksClient;
pub use openlibrary::{BookMeta, OpenLibraryClient, SearchDoc};
pub use table::{is_blank, CsvTable};

/// User agent sent with every metadata API request.
pub const USER_AGENT: &str = "shelftools/0.1";

/// Default HTTP timeout for metadata requests.
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;
