//! Recursive conflict-marker resolution, keeping the "ours" side.
//!
//! The resolve subsystem is responsible for:
//! 1. **Parsing** -- scanning a file's lines for `<<<<<<<` / `=======` /
//!    `>>>>>>>` triples and rewriting each block to its ours content.
//! 2. **File processing** -- per-file safety checks (binary sniff, decode
//!    fallback), backup creation, and write-back.
//! 3. **Walking** -- recursive directory traversal with exclusion and
//!    extension filters, accumulating run-level counters.

pub mod parser;
pub mod processor;
pub mod walker;

pub use parser::{resolve_keep_ours, Resolved, CONFLICT_END, CONFLICT_MID, CONFLICT_START};
pub use processor::{process_file, FileOutcome, FileStatus, ProcessOptions};
pub use walker::{run, ChangedFile, FailedFile, RunOptions, RunReport, RunSummary, DEFAULT_EXCLUDES};
