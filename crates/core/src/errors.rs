//! Error types for the shelftools core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Csv(#[from] CsvError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

// ---------------------------------------------------------------------------
// Conflict resolution errors
// ---------------------------------------------------------------------------

/// Structural errors from the conflict-marker parser.
///
/// Any of these aborts processing of the whole file; no partially resolved
/// content is ever written.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A conflict block ended before its `=======` separator.
    #[error("conflict block missing ======= separator")]
    MissingSeparator,

    /// A conflict block ended before its `>>>>>>>` end marker.
    #[error("conflict block missing >>>>>>> end marker")]
    MissingEndMarker,

    /// A second `<<<<<<<` appeared inside the ours section.
    #[error("nested conflict start found before ======= separator")]
    NestedStartInOurs,

    /// A second `<<<<<<<` appeared inside the theirs section.
    #[error("nested conflict start found inside theirs section")]
    NestedStartInTheirs,
}

/// Errors from the resolve driver (walker / file processor).
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The configured root directory does not exist.
    #[error("root path does not exist: {0}")]
    RootNotFound(String),

    /// Malformed conflict block structure in a file.
    #[error("conflict parse error: {0}")]
    Parse(#[from] ParseError),

    /// Generic I/O wrapper.
    #[error("resolve I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// CSV table errors
// ---------------------------------------------------------------------------

/// Errors from reading and writing library CSV tables.
#[derive(Debug, Error)]
pub enum CsvError {
    /// The input file could not be found.
    #[error("CSV file not found: {0}")]
    FileNotFound(String),

    /// A required column is missing from the table.
    #[error("CSV is missing required column '{0}'")]
    MissingColumn(String),

    /// Underlying csv crate error.
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Generic I/O wrapper.
    #[error("CSV I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Metadata API errors
// ---------------------------------------------------------------------------

/// Errors from the book-metadata web APIs (Open Library, Google Books).
#[derive(Debug, Error)]
pub enum MetadataError {
    /// HTTP-level transport error (network, TLS, etc.).
    #[error("metadata HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The API returned a non-success status code.
    #[error("metadata API error (HTTP {status}): {body}")]
    ApiError { status: u16, body: String },

    /// JSON deserialization failure.
    #[error("metadata response parse error: {0}")]
    ParseError(String),
}
