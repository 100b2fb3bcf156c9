use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, trace};

use crate::primitives::io::file_exists;
use crate::store::{DecodeLimits, RleStore, Run, StoreOptions, StoreStats, Value};
use crate::types::RleError;

/// Error type for CLI operations.
#[derive(Error, Debug)]
pub enum CliError {
    /// Generic error message.
    #[error("{0}")]
    Message(String),
    /// Store file does not exist.
    #[error("store {} not found", .0.display())]
    NotFound(PathBuf),
    /// IO error from input files or stdin.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Store encode/decode error.
    #[error(transparent)]
    Store(#[from] RleError),
}

impl From<&str> for CliError {
    fn from(value: &str) -> Self {
        CliError::Message(value.to_string())
    }
}

impl From<String> for CliError {
    fn from(value: String) -> Self {
        CliError::Message(value)
    }
}

/// Configuration for building a store from text lines.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Destination store file; replaced atomically.
    pub out: PathBuf,
    /// Line-oriented input file. `None` reads stdin.
    pub input: Option<PathBuf>,
    /// Parse each line into a typed [`Value`] instead of a string.
    pub typed: bool,
}

/// Report produced by [`run_inspect`].
#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    /// Inspected file.
    pub path: PathBuf,
    /// Size of the file on disk.
    pub size_bytes: u64,
    /// Row and run counts of the decoded store.
    #[serde(flatten)]
    pub stats: StoreStats,
}

/// Row window selected by [`run_dump`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DumpRange {
    /// First row to visit.
    pub start: u64,
    /// Maximum number of rows to visit; `None` means to the end.
    pub limit: Option<u64>,
}

/// JSON form of a run listed by [`run_runs`].
#[derive(Debug, Clone, Serialize)]
pub struct RunEntry {
    /// First row of the run.
    pub start: u64,
    /// Rows covered by the run.
    pub length: u64,
    /// Shared value, converted for export.
    pub value: serde_json::Value,
}

impl From<&Run<Value>> for RunEntry {
    fn from(run: &Run<Value>) -> Self {
        Self {
            start: run.start_row,
            length: run.length,
            value: run.value.to_json(),
        }
    }
}

/// Reads lines from the configured input and saves them as a store.
pub fn run_build(cfg: &BuildConfig) -> Result<StoreStats, CliError> {
    let store: RleStore = RleStore::new();
    let appended = match &cfg.input {
        Some(path) => {
            let file = File::open(path).map_err(|err| {
                CliError::Message(format!("failed to open {}: {err}", path.display()))
            })?;
            append_lines(&store, BufReader::new(file), cfg.typed)?
        }
        None => append_lines(&store, io::stdin().lock(), cfg.typed)?,
    };
    if let Some(parent) = cfg.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    store.save_to_path(&cfg.out)?;
    let stats = store.stats();
    debug!(
        path = %cfg.out.display(),
        appended,
        rows = stats.rows,
        runs = stats.runs,
        "store built"
    );
    Ok(stats)
}

/// Appends one value per line of `reader`.
pub fn append_lines<R>(store: &RleStore, reader: R, typed: bool) -> Result<u64, CliError>
where
    R: BufRead,
{
    let mut appended = 0;
    for line in reader.lines() {
        let line = line?;
        let value = if typed {
            parse_typed(&line)
        } else {
            Value::String(line)
        };
        trace!(row = store.row_count(), kind = %value.kind(), "append");
        store.append(value);
        appended += 1;
    }
    Ok(appended)
}

/// Interprets one input line as a typed value.
///
/// Empty lines become `Null`, `true`/`false` become booleans, integers
/// become `Int` (or `UInt` above `i64::MAX`), decimal numbers become
/// `Float`, and anything else stays a string.
pub fn parse_typed(line: &str) -> Value {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    match trimmed {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(u) = trimmed.parse::<u64>() {
        return Value::UInt(u);
    }
    // Only numeric spellings; `f64::from_str` also accepts `inf` and `nan`.
    if trimmed.bytes().any(|b| b.is_ascii_digit()) {
        if let Ok(f) = trimmed.parse::<f64>() {
            return Value::Float(f);
        }
    }
    Value::String(line.to_string())
}

/// Loads the store at `path`, failing if the file does not exist.
pub fn open_store(path: &Path, limits: DecodeLimits) -> Result<RleStore, CliError> {
    if !file_exists(path) {
        return Err(CliError::NotFound(path.to_path_buf()));
    }
    let store = RleStore::with_options(StoreOptions::new().limits(limits));
    store.load_from_path(path)?;
    Ok(store)
}

/// Loads a store and reports its size and counts.
pub fn run_inspect(path: &Path, limits: DecodeLimits) -> Result<InspectReport, CliError> {
    let store = open_store(path, limits)?;
    let size_bytes = fs::metadata(path)?.len();
    Ok(InspectReport {
        path: path.to_path_buf(),
        size_bytes,
        stats: store.stats(),
    })
}

/// Visits the rows of the store at `path` that fall in `range`.
///
/// Returns the number of rows visited.
pub fn run_dump<F>(
    path: &Path,
    limits: DecodeLimits,
    range: DumpRange,
    mut visit: F,
) -> Result<u64, CliError>
where
    F: FnMut(u64, &Value),
{
    let store = open_store(path, limits)?;
    let end = match range.limit {
        Some(limit) => range.start.saturating_add(limit),
        None => u64::MAX,
    };
    let mut visited = 0;
    store.iterate_range(range.start..end, |row, value| {
        visit(row, value);
        visited += 1;
    });
    Ok(visited)
}

/// Lists the runs of the store at `path`.
///
/// Convert with [`RunEntry::from`] for JSON output.
pub fn run_runs(path: &Path, limits: DecodeLimits) -> Result<Vec<Run<Value>>, CliError> {
    let store = open_store(path, limits)?;
    Ok(store.runs())
}
