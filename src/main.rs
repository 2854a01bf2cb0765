use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use revtree::{snapshot, Advance, ChangeBatch, Replay, ReplayConfig, Snapshot};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "revtree",
    about = "Namespace tree snapshots for dynamic tree edit distance benchmarks"
)]
struct Cli {
    /// Log level used when RUST_LOG is not set.
    #[arg(long, value_enum, default_value_t = LogLevel::Warn, global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render the baseline tree of a listing (one path per line).
    Baseline {
        /// File listing (e.g. the output of `git ls-tree -r --name-only`).
        listing: PathBuf,
        /// Revision stamped onto every node.
        #[arg(long)]
        revision: String,
        /// Write the snapshot here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Replay name-status diffs on top of a baseline and write every snapshot.
    Replay {
        /// Baseline file listing.
        listing: PathBuf,
        /// Revision of the baseline listing.
        #[arg(long)]
        revision: String,
        /// Name-status diff files, applied in order; each file stem is its revision.
        #[arg(required = true)]
        diffs: Vec<PathBuf>,
        /// Directory receiving `<revision>` and `<from>-<to>` snapshot files.
        #[arg(long)]
        out_dir: PathBuf,
        /// Also write snapshots for modify-only transitions.
        #[arg(long)]
        keep_unchanged: bool,
        /// Check tree invariants after every diff.
        #[arg(long)]
        verify: bool,
    },
    /// Parse a snapshot and report its shape.
    Inspect {
        /// Snapshot file.
        snapshot: PathBuf,
        /// Previous snapshot, used to resolve labels of retained nodes.
        #[arg(long)]
        previous: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_tracing(cli.log_level);

    match cli.command {
        Commands::Baseline {
            listing,
            revision,
            output,
        } => run_baseline(listing, revision, output)?,
        Commands::Replay {
            listing,
            revision,
            diffs,
            out_dir,
            keep_unchanged,
            verify,
        } => run_replay(listing, revision, diffs, out_dir, keep_unchanged, verify)?,
        Commands::Inspect { snapshot, previous } => run_inspect(snapshot, previous)?,
    }

    Ok(())
}

// Logs go to stderr; stdout carries snapshots and reports.
fn setup_tracing(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .compact()
        .init();
}

fn run_baseline(listing_path: PathBuf, revision: String, output: Option<PathBuf>) -> Result<()> {
    let listing = read_text(&listing_path)?;
    let replay = Replay::from_listing(&listing, revision, ReplayConfig::default())
        .with_context(|| format!("failed to build baseline from {}", listing_path.display()))?;
    let snapshot = replay.baseline_snapshot();

    match output {
        Some(path) => {
            fs::write(&path, snapshot.text())
                .with_context(|| format!("failed to write snapshot {}", path.display()))?;
            print_summary(&snapshot);
        }
        None => println!("{}", snapshot),
    }

    Ok(())
}

fn run_replay(
    listing_path: PathBuf,
    revision: String,
    diffs: Vec<PathBuf>,
    out_dir: PathBuf,
    keep_unchanged: bool,
    verify: bool,
) -> Result<()> {
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create output directory {}", out_dir.display()))?;

    let config = ReplayConfig::default()
        .with_drop_unchanged(!keep_unchanged)
        .with_invariant_checks(verify);
    let listing = read_text(&listing_path)?;
    let mut replay = Replay::from_listing(&listing, revision, config)
        .with_context(|| format!("failed to build baseline from {}", listing_path.display()))?;

    let baseline = replay.baseline_snapshot();
    write_snapshot(&out_dir, &baseline)?;
    print_summary(&baseline);

    for diff_path in diffs {
        let revision = diff_path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| anyhow!("cannot derive a revision from {}", diff_path.display()))?
            .to_string();
        let text = read_text(&diff_path)?;
        let batch = ChangeBatch::from_name_status(revision.as_str(), &text)
            .with_context(|| format!("malformed diff {}", diff_path.display()))?;

        match replay
            .advance(&batch)
            .with_context(|| format!("failed to apply {}", diff_path.display()))?
        {
            Advance::Snapshot(snapshot) => {
                write_snapshot(&out_dir, &snapshot)?;
                print_summary(&snapshot);
            }
            Advance::Unchanged { from, to } => println!("{}-{}\tunchanged", from, to),
        }
    }

    info!(revision = %replay.revision(), "replay finished");
    Ok(())
}

fn run_inspect(snapshot_path: PathBuf, previous: Option<PathBuf>) -> Result<()> {
    let text = read_text(&snapshot_path)?;
    let mut parsed = snapshot::parse(&text)
        .with_context(|| format!("invalid snapshot {}", snapshot_path.display()))?;
    let retained = parsed.retained().count();

    if let Some(previous_path) = previous {
        let previous_text = read_text(&previous_path)?;
        let previous = snapshot::parse(&previous_text)
            .with_context(|| format!("invalid snapshot {}", previous_path.display()))?;
        parsed
            .resolve_labels(&previous)
            .context("failed to resolve labels against the previous snapshot")?;
    }

    println!("nodes\t{}", parsed.len());
    println!("labelled\t{}", parsed.labelled_count());
    println!("retained\t{}", retained);
    println!("depth\t{}", parsed.max_depth());
    println!("digest\t{}", blake3::hash(text.trim_end().as_bytes()));

    Ok(())
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn write_snapshot(dir: &Path, snapshot: &Snapshot) -> Result<()> {
    let path = dir.join(snapshot.name());
    fs::write(&path, snapshot.text())
        .with_context(|| format!("failed to write snapshot {}", path.display()))
}

fn print_summary(snapshot: &Snapshot) {
    println!(
        "{}\tnodes={}\tlabelled={}\tbytes={}\tdigest={}",
        snapshot.name(),
        snapshot.node_count(),
        snapshot.labelled_count(),
        snapshot.len(),
        snapshot.digest()
    );
}
