//! Per-file conflict resolution with safety checks.
//!
//! Wraps the [`parser`](super::parser) with the checks a file needs before
//! and after parsing: binary detection, UTF-8 decode with lossy fallback,
//! backup creation, and write-back. Every failure is captured in the
//! returned [`FileOutcome`] -- nothing here aborts a run.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::errors::ParseError;
use crate::resolve::parser::{resolve_keep_ours, CONFLICT_START};

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

/// The outcome of processing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    /// Whether the file was (or in dry-run mode, would be) rewritten.
    pub changed: bool,
    /// Number of conflict blocks resolved.
    pub blocks: usize,
    /// Status code for reporting.
    pub status: FileStatus,
}

impl FileOutcome {
    fn unchanged(status: FileStatus) -> Self {
        Self {
            changed: false,
            blocks: 0,
            status,
        }
    }
}

/// Per-file status codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    /// The file could not be read.
    ReadFail(String),
    /// The file contains a NUL byte and is treated as binary.
    SkipBinary,
    /// No `<<<<<<<` token anywhere in the file.
    NoConflictMarkers,
    /// Malformed conflict block structure; the file is left untouched.
    ParseFail(ParseError),
    /// Marker token present but no complete block triple was found.
    NoConflictBlocks,
    /// The rewritten file could not be written (or backed up).
    WriteFail(String),
    /// Blocks were resolved. `encoding` records the decode path taken.
    Resolved { blocks: usize, encoding: Encoding },
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadFail(e) => write!(f, "READ_FAIL: {}", e),
            Self::SkipBinary => write!(f, "SKIP_BINARY"),
            Self::NoConflictMarkers => write!(f, "NO_CONFLICT_MARKERS"),
            Self::ParseFail(e) => write!(f, "PARSE_FAIL: {}", e),
            Self::NoConflictBlocks => write!(f, "NO_CONFLICT_BLOCKS_FOUND"),
            Self::WriteFail(e) => write!(f, "WRITE_FAIL: {}", e),
            Self::Resolved { blocks, encoding } => {
                write!(f, "RESOLVED:{} ({})", blocks, encoding)
            }
        }
    }
}

impl FileStatus {
    /// `true` for statuses that represent a per-file failure (as opposed to
    /// a silent skip or a successful resolve).
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::ReadFail(_) | Self::ParseFail(_) | Self::WriteFail(_)
        )
    }
}

/// How the file's bytes were decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Clean UTF-8.
    Utf8,
    /// Invalid sequences were replaced; output is re-encoded as UTF-8.
    Utf8Lossy,
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Utf8 => write!(f, "utf-8"),
            Self::Utf8Lossy => write!(f, "utf-8 (lossy)"),
        }
    }
}

/// Write-mode options for [`process_file`].
#[derive(Debug, Clone, Copy)]
pub struct ProcessOptions {
    /// Detect and report only; never write the file or a backup.
    pub dry_run: bool,
    /// Copy the original bytes to a `.bak` sibling before overwriting.
    pub backup: bool,
}

// ---------------------------------------------------------------------------
// Processing
// ---------------------------------------------------------------------------

/// Resolve the conflict blocks in one file.
///
/// Reads the file, applies the safety checks, and (outside dry-run mode)
/// rewrites it as UTF-8 when at least one block was resolved. The original
/// bytes are preserved in a uniquely named backup first when backups are
/// enabled. On any parse error the file is left byte-for-byte unchanged.
pub fn process_file(path: &Path, opts: ProcessOptions) -> FileOutcome {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read file");
            return FileOutcome::unchanged(FileStatus::ReadFail(e.to_string()));
        }
    };

    // NUL byte heuristic: treat as binary, never parse.
    if data.contains(&0) {
        return FileOutcome::unchanged(FileStatus::SkipBinary);
    }

    let (text, encoding) = match String::from_utf8(data.clone()) {
        Ok(text) => (text, Encoding::Utf8),
        Err(_) => {
            debug!(path = %path.display(), "invalid UTF-8, using lossy decode");
            (
                String::from_utf8_lossy(&data).into_owned(),
                Encoding::Utf8Lossy,
            )
        }
    };

    if !text.contains(CONFLICT_START) {
        return FileOutcome::unchanged(FileStatus::NoConflictMarkers);
    }

    let resolved = match resolve_keep_ours(&text) {
        Ok(resolved) => resolved,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "malformed conflict block");
            return FileOutcome::unchanged(FileStatus::ParseFail(e));
        }
    };

    if resolved.blocks == 0 {
        // The token pre-check passed but no full triple completed. Should
        // not happen in practice; kept as a distinct defensive status.
        return FileOutcome::unchanged(FileStatus::NoConflictBlocks);
    }

    if !opts.dry_run {
        if opts.backup {
            let bak = backup_path(path);
            if let Err(e) = std::fs::write(&bak, &data) {
                warn!(path = %path.display(), error = %e, "failed to write backup");
                return FileOutcome::unchanged(FileStatus::WriteFail(e.to_string()));
            }
            debug!(path = %path.display(), backup = %bak.display(), "backup written");
        }
        // Always re-encoded as UTF-8, regardless of the decode path.
        if let Err(e) = std::fs::write(path, resolved.text.as_bytes()) {
            warn!(path = %path.display(), error = %e, "failed to write resolved file");
            return FileOutcome::unchanged(FileStatus::WriteFail(e.to_string()));
        }
    }

    FileOutcome {
        changed: true,
        blocks: resolved.blocks,
        status: FileStatus::Resolved {
            blocks: resolved.blocks,
            encoding,
        },
    }
}

/// First free backup path for `path`: `<name>.bak`, then `<name>.bak1`,
/// `<name>.bak2`, ... An existing backup is never overwritten.
fn backup_path(path: &Path) -> PathBuf {
    let candidate = append_suffix(path, ".bak");
    if !candidate.exists() {
        return candidate;
    }
    let mut k = 1u32;
    loop {
        let candidate = append_suffix(path, &format!(".bak{}", k));
        if !candidate.exists() {
            return candidate;
        }
        k += 1;
    }
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(suffix);
    PathBuf::from(os)
}
