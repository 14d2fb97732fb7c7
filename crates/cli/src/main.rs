//! shelftools command-line tool.
//!
//! Provides the `resolve` subcommand for recursively resolving
//! version-control conflict markers (keeping the ours side), and the
//! library CSV subcommands `enrich`, `fill-isbn`, and `strip-covers`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

use shelftools_core::library::enrich::{self, FillOptions, DEFAULT_MIN_SCORE};
use shelftools_core::library::{CsvTable, GoogleBooksClient, OpenLibraryClient};
use shelftools_core::resolve::{self, RunOptions};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// shelftools command-line tool.
#[derive(Parser, Debug)]
#[command(
    name = "shelftools",
    version,
    about = "Conflict-marker cleanup and library CSV enrichment"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve conflict markers under a directory, keeping the OURS side.
    Resolve {
        /// Root folder to scan.
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Report changes but do not write files.
        #[arg(long)]
        dry_run: bool,

        /// Do not write .bak backups before editing.
        #[arg(long)]
        no_backup: bool,

        /// Folder name to exclude (repeatable). Defaults already cover
        /// .git, node_modules, dist, etc.
        #[arg(long, value_name = "NAME")]
        exclude: Vec<String>,

        /// Only process files with these extensions (repeatable),
        /// e.g. --include-ext ts --include-ext md
        #[arg(long, value_name = "EXT")]
        include_ext: Vec<String>,
    },

    /// Fill blank publish_year / publisher / cover_image fields by ISBN.
    Enrich {
        /// Input CSV.
        #[arg(long, default_value = "library.csv")]
        csv: PathBuf,

        /// Output CSV (default: `<input stem>.updated.csv`).
        #[arg(long)]
        out: Option<PathBuf>,

        /// HTTP timeout in seconds.
        #[arg(long, default_value = "20")]
        timeout: u64,
    },

    /// Fill missing ISBNs via Open Library search, then backfill metadata.
    FillIsbn {
        /// Input CSV.
        #[arg(long, default_value = "library.csv")]
        csv: PathBuf,

        /// Output CSV (default: overwrite input).
        #[arg(long)]
        out: Option<PathBuf>,

        /// Overwrite existing populated fields.
        #[arg(long)]
        overwrite: bool,

        /// Minimum match score for accepting a search candidate.
        #[arg(long, default_value_t = DEFAULT_MIN_SCORE)]
        min_score: f64,

        /// HTTP timeout in seconds.
        #[arg(long, default_value = "20")]
        timeout: u64,
    },

    /// Clear cover cells unless they are local paths under covers/.
    StripCovers {
        /// Input CSV.
        #[arg(long, default_value = "library.csv")]
        csv: PathBuf,

        /// Output CSV (default: overwrite input).
        #[arg(long)]
        out: Option<PathBuf>,

        /// Cover column name.
        #[arg(long, default_value = "cover_image")]
        column: String,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    // Minimal logging for CLI
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("warn"))
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Resolve {
            root,
            dry_run,
            no_backup,
            exclude,
            include_ext,
        } => cmd_resolve(&root, dry_run, no_backup, exclude, include_ext),
        Commands::Enrich { csv, out, timeout } => cmd_enrich(&csv, out, timeout).await,
        Commands::FillIsbn {
            csv,
            out,
            overwrite,
            min_score,
            timeout,
        } => cmd_fill_isbn(&csv, out, overwrite, min_score, timeout).await,
        Commands::StripCovers { csv, out, column } => cmd_strip_covers(&csv, out, &column),
    }
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn cmd_resolve(
    root: &Path,
    dry_run: bool,
    no_backup: bool,
    exclude: Vec<String>,
    include_ext: Vec<String>,
) -> Result<()> {
    let opts = RunOptions {
        dry_run,
        no_backup,
        exclude,
        include_ext,
    };

    let report = resolve::run(root, &opts)?;

    for changed in &report.changed {
        println!(
            "{} {} -> {}",
            style("[CHANGED]").green(),
            changed.path.display(),
            changed.outcome.status
        );
    }
    for failed in &report.failed {
        println!(
            "{} {} -> {}",
            style("[FAILED] ").red(),
            failed.path.display(),
            failed.outcome.status
        );
    }

    let summary = report.summary;
    println!();
    println!("--- Summary ---");
    println!("Mode: {}", if dry_run { "DRY RUN" } else { "WRITE" });
    println!("Scanned files: {}", summary.total_files);
    println!("Changed files: {}", summary.changed_files);
    println!("Conflict blocks resolved: {}", summary.total_blocks);
    if !dry_run && !no_backup && summary.changed_files > 0 {
        println!("Backups: .bak files were created next to modified files.");
    }

    Ok(())
}

async fn cmd_enrich(csv: &Path, out: Option<PathBuf>, timeout: u64) -> Result<()> {
    let out = out.unwrap_or_else(|| updated_path(csv));
    let mut table = CsvTable::read(csv).context("failed to read input CSV")?;

    let timeout = Duration::from_secs(timeout);
    let openlibrary = OpenLibraryClient::with_timeout(timeout);
    let googlebooks = GoogleBooksClient::with_timeout(timeout);

    let report = enrich::enrich(&mut table, &openlibrary, &googlebooks).await;
    table.write(&out).context("failed to write output CSV")?;

    println!("Input:  {}", csv.display());
    println!("Output: {}", out.display());
    println!("Looked up {} rows (had ISBN + missing fields).", report.looked_up);
    println!("Updated  {} rows (filled at least one blank).", report.updated);

    Ok(())
}

async fn cmd_fill_isbn(
    csv: &Path,
    out: Option<PathBuf>,
    overwrite: bool,
    min_score: f64,
    timeout: u64,
) -> Result<()> {
    let out = out.unwrap_or_else(|| csv.to_path_buf());
    let mut table = CsvTable::read(csv).context("failed to read input CSV")?;

    let openlibrary = OpenLibraryClient::with_timeout(Duration::from_secs(timeout));
    let opts = FillOptions {
        overwrite,
        min_score,
    };

    let report = enrich::fill_isbn(&mut table, &openlibrary, opts)
        .await
        .context("fill-isbn pass failed")?;
    table.write(&out).context("failed to write output CSV")?;

    println!("Done (fill-isbn).");
    println!("Rows filled with ISBN: {}", report.filled);
    println!("Rows not found:       {}", report.not_found);
    println!("Rows skipped:         {}", report.skipped);
    println!("Wrote CSV:            {}", out.display());

    Ok(())
}

fn cmd_strip_covers(csv: &Path, out: Option<PathBuf>, column: &str) -> Result<()> {
    let out = out.unwrap_or_else(|| csv.to_path_buf());
    let mut table = CsvTable::read(csv).context("failed to read input CSV")?;

    let report = enrich::strip_covers(&mut table, column).context("strip-covers pass failed")?;
    table.write(&out).context("failed to write output CSV")?;

    println!("Done (strip-covers).");
    println!("Removed non-local covers: {}", report.removed);
    println!("Wrote CSV:               {}", out.display());

    Ok(())
}

// ---------------------------------------------------------------------------
// Utilities
// ---------------------------------------------------------------------------

/// `library.csv` -> `library.updated.csv`, in the same directory.
fn updated_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "library".to_string());
    path.with_file_name(format!("{}.updated.csv", stem))
}
