//! Directory walker and run driver.
//!
//! Enumerates candidate files under a root, applies exclusion and extension
//! filters, runs the [`processor`](super::processor) on each, and aggregates
//! the results into a [`RunReport`] for the caller to print.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::errors::ResolveError;
use crate::resolve::processor::{process_file, FileOutcome, ProcessOptions};

/// Directory names pruned from the walk by default.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    ".git",
    "node_modules",
    "dist",
    "build",
    ".next",
    ".venv",
    "venv",
    "__pycache__",
];

// ---------------------------------------------------------------------------
// Options and report types
// ---------------------------------------------------------------------------

/// Options for a resolve run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Detect and report only; never write files or backups.
    pub dry_run: bool,
    /// Suppress `.bak` backup creation during writes.
    pub no_backup: bool,
    /// Additional directory names to prune (appended to the defaults).
    pub exclude: Vec<String>,
    /// When non-empty, only files with these extensions are processed.
    /// Entries may be given with or without a leading dot.
    pub include_ext: Vec<String>,
}

/// Aggregate counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Files that passed the filters and were processed.
    pub total_files: usize,
    /// Files that were (or would be) rewritten.
    pub changed_files: usize,
    /// Conflict blocks resolved across all changed files.
    pub total_blocks: usize,
}

/// A file that was (or would be) rewritten.
#[derive(Debug, Clone)]
pub struct ChangedFile {
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

/// A file whose processing failed (read, parse, or write).
#[derive(Debug, Clone)]
pub struct FailedFile {
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

/// Everything the reporting layer needs about a finished run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub summary: RunSummary,
    pub changed: Vec<ChangedFile>,
    pub failed: Vec<FailedFile>,
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Walk `root` and resolve conflict markers in every eligible file.
///
/// The only fatal condition is a nonexistent root; per-file problems are
/// recorded in the report and never abort the run. A crash mid-run leaves
/// already-processed files resolved and later files untouched -- there is
/// no cross-file transaction.
pub fn run(root: &Path, opts: &RunOptions) -> Result<RunReport, ResolveError> {
    if !root.exists() {
        return Err(ResolveError::RootNotFound(root.display().to_string()));
    }

    let excludes: HashSet<String> = DEFAULT_EXCLUDES
        .iter()
        .map(|s| s.to_string())
        .chain(opts.exclude.iter().cloned())
        .collect();

    // Normalize configured extensions to their dotless form.
    let include_ext: HashSet<String> = opts
        .include_ext
        .iter()
        .map(|e| e.trim_start_matches('.').to_string())
        .collect();

    info!(
        root = %root.display(),
        dry_run = opts.dry_run,
        excludes = excludes.len(),
        "starting resolve run"
    );

    let process_opts = ProcessOptions {
        dry_run: opts.dry_run,
        backup: !opts.no_backup,
    };

    let mut summary = RunSummary::default();
    let mut changed = Vec::new();
    let mut failed = Vec::new();

    let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
        // Prune excluded directories before descending into them.
        if entry.file_type().is_dir() && entry.depth() > 0 {
            let name = entry.file_name().to_string_lossy();
            if excludes.contains(name.as_ref()) {
                debug!(dir = %entry.path().display(), "pruning excluded directory");
                return false;
            }
        }
        true
    });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "walk error, skipping entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();

        // Defensive double-check beyond pruning: skip anything with an
        // excluded component anywhere in its path.
        if has_excluded_component(path, &excludes) {
            continue;
        }

        if !include_ext.is_empty() {
            let ext = path.extension().map(|e| e.to_string_lossy().to_string());
            match ext {
                Some(ext) if include_ext.contains(&ext) => {}
                _ => continue,
            }
        }

        summary.total_files += 1;

        let outcome = process_file(path, process_opts);
        if outcome.changed {
            summary.changed_files += 1;
            summary.total_blocks += outcome.blocks;
            changed.push(ChangedFile {
                path: path.to_path_buf(),
                outcome,
            });
        } else if outcome.status.is_failure() {
            failed.push(FailedFile {
                path: path.to_path_buf(),
                outcome,
            });
        }
    }

    info!(
        total = summary.total_files,
        changed = summary.changed_files,
        blocks = summary.total_blocks,
        "resolve run complete"
    );

    Ok(RunReport {
        summary,
        changed,
        failed,
    })
}

fn has_excluded_component(path: &Path, excludes: &HashSet<String>) -> bool {
    path.components().any(|c| {
        let part = c.as_os_str().to_string_lossy();
        excludes.contains(part.as_ref())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFLICTED: &str = "keep\n<<<<<<< HEAD\nmine\n=======\ntheirs\n>>>>>>> b\n";

    fn write_file(dir: &Path, rel: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_nonexistent_root_is_fatal() {
        let err = run(Path::new("/no/such/root"), &RunOptions::default()).unwrap_err();
        assert!(matches!(err, ResolveError::RootNotFound(_)));
    }

    #[test]
    fn test_resolves_across_tree() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_file(dir.path(), "a.txt", CONFLICTED.as_bytes());
        let b = write_file(dir.path(), "sub/deep/b.md", CONFLICTED.as_bytes());
        write_file(dir.path(), "clean.txt", b"nothing here\n");

        let report = run(dir.path(), &RunOptions::default()).unwrap();
        assert_eq!(report.summary.total_files, 3);
        assert_eq!(report.summary.changed_files, 2);
        assert_eq!(report.summary.total_blocks, 2);
        assert!(report.failed.is_empty());

        assert_eq!(std::fs::read_to_string(&a).unwrap(), "keep\nmine\n");
        assert_eq!(std::fs::read_to_string(&b).unwrap(), "keep\nmine\n");
    }

    #[test]
    fn test_dry_run_with_binary_sibling() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_file(dir.path(), "a.txt", CONFLICTED.as_bytes());
        write_file(dir.path(), "b.bin", b"\x00<<<<<<< not parsed\n");

        let report = run(
            dir.path(),
            &RunOptions {
                dry_run: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(report.summary.changed_files, 1);
        assert_eq!(report.summary.total_blocks, 1);
        // No writes to disk in dry-run mode.
        assert_eq!(std::fs::read_to_string(&a).unwrap(), CONFLICTED);
        assert!(!dir.path().join("a.txt.bak").exists());
    }

    #[test]
    fn test_default_excludes_pruned() {
        let dir = tempfile::tempdir().unwrap();
        let hidden = write_file(dir.path(), ".git/config.txt", CONFLICTED.as_bytes());
        let vendored = write_file(
            dir.path(),
            "node_modules/pkg/index.js",
            CONFLICTED.as_bytes(),
        );
        write_file(dir.path(), "src/main.txt", CONFLICTED.as_bytes());

        let report = run(dir.path(), &RunOptions::default()).unwrap();
        assert_eq!(report.summary.total_files, 1);
        assert_eq!(report.summary.changed_files, 1);
        assert_eq!(std::fs::read_to_string(&hidden).unwrap(), CONFLICTED);
        assert_eq!(std::fs::read_to_string(&vendored).unwrap(), CONFLICTED);
    }

    #[test]
    fn test_extra_excludes() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "generated/out.txt", CONFLICTED.as_bytes());
        write_file(dir.path(), "src/ok.txt", CONFLICTED.as_bytes());

        let report = run(
            dir.path(),
            &RunOptions {
                exclude: vec!["generated".into()],
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(report.summary.total_files, 1);
        assert_eq!(report.changed.len(), 1);
        assert!(report.changed[0].path.ends_with("src/ok.txt"));
    }

    #[test]
    fn test_include_ext_filter() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "a.ts", CONFLICTED.as_bytes());
        write_file(dir.path(), "b.md", CONFLICTED.as_bytes());
        write_file(dir.path(), "c.rs", CONFLICTED.as_bytes());

        // Extensions accepted with or without the leading dot.
        let report = run(
            dir.path(),
            &RunOptions {
                include_ext: vec![".ts".into(), "md".into()],
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(report.summary.total_files, 2);
        assert_eq!(report.summary.changed_files, 2);
    }

    #[test]
    fn test_parse_failure_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let bad = write_file(dir.path(), "bad.txt", b"<<<<<<< HEAD\nours only\n");
        write_file(dir.path(), "good.txt", CONFLICTED.as_bytes());

        let report = run(dir.path(), &RunOptions::default()).unwrap();
        assert_eq!(report.summary.changed_files, 1);
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].path.ends_with("bad.txt"));
        // The malformed file is untouched.
        assert_eq!(
            std::fs::read(&bad).unwrap(),
            b"<<<<<<< HEAD\nours only\n".to_vec()
        );
    }
}
