//! shelftools core library.
//!
//! This crate provides the domain logic for the shelftools maintenance
//! commands: recursive resolution of version-control conflict markers
//! (keeping the "ours" side) and enrichment of the book-library CSV from
//! public metadata APIs.

pub mod errors;
pub mod library;
pub mod resolve;

// Re-exports for convenience.
pub use errors::{CoreError, CsvError, MetadataError, ParseError, ResolveError};
pub use resolve::{FileOutcome, FileStatus, RunSummary};
