//! Run-length encoded, append-only column store.
//!
//! A store keeps a sequence of rows as runs of equal values. Appends only
//! touch the last run, reads and writes move the whole image through a byte
//! stream, and a single reader/writer lock guards every operation.

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::ops::{ControlFlow, Range};
use std::path::Path;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, warn};

use crate::primitives::io::{atomic_write, file_exists};
use crate::types::Result;

pub mod codec;
mod options;
mod run;
mod value;

pub use codec::MAGIC;
pub use options::{DecodeLimits, StoreOptions, DEFAULT_MAX_DEPTH, DEFAULT_MAX_LEN};
pub use run::Run;
pub use value::{StoredValue, Value, ValueKind};

/// Aggregate counts describing a store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StoreStats {
    /// Number of logical rows.
    pub rows: u64,
    /// Number of runs backing those rows.
    pub runs: u64,
    /// Rows per run; zero for an empty store.
    pub compression_ratio: f64,
}

struct Inner<V> {
    runs: Vec<Run<V>>,
    row_count: u64,
}

impl<V: StoredValue> Inner<V> {
    fn push(&mut self, value: V) -> u64 {
        let row = self.row_count;
        match self.runs.last_mut() {
            Some(last) if last.value.identical(&value) => last.length += 1,
            _ => self.runs.push(Run::new(row, value)),
        }
        self.row_count += 1;
        row
    }

    /// Index of the run containing `row`, if any.
    fn run_index(&self, row: u64) -> Option<usize> {
        if row >= self.row_count {
            return None;
        }
        // First run whose start is past `row`, minus one.
        let idx = self.runs.partition_point(|run| run.start_row <= row);
        idx.checked_sub(1).filter(|&i| self.runs[i].contains(row))
    }
}

/// An append-only sequence of values stored as runs.
///
/// Appends, reads, and writes take the lock exclusively; iteration and the
/// read-only accessors share it. Stream I/O in [`RleStore::read`] and
/// [`RleStore::write`] happens while the exclusive lock is held.
pub struct RleStore<V: StoredValue = Value> {
    inner: RwLock<Inner<V>>,
    limits: DecodeLimits,
}

impl<V: StoredValue> Default for RleStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: StoredValue> RleStore<V> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::with_options(StoreOptions::default())
    }

    /// Creates an empty store with room for `runs` runs.
    pub fn with_capacity(runs: usize) -> Self {
        Self::with_options(StoreOptions::new().capacity_hint(runs))
    }

    /// Creates an empty store from explicit options.
    pub fn with_options(options: StoreOptions) -> Self {
        Self {
            inner: RwLock::new(Inner {
                runs: Vec::with_capacity(options.capacity_hint),
                row_count: 0,
            }),
            limits: options.limits,
        }
    }

    /// Builds a store by appending every item of `values`.
    pub fn from_values<I: IntoIterator<Item = V>>(values: I) -> Self {
        let store = Self::new();
        store.extend(values);
        store
    }

    /// Appends one row and returns its index.
    ///
    /// The index always equals the row count before the call.
    pub fn append(&self, value: V) -> u64 {
        self.inner.write().push(value)
    }

    /// Appends every item of `values` under a single lock acquisition and
    /// returns the index of the first appended row.
    pub fn extend<I: IntoIterator<Item = V>>(&self, values: I) -> u64 {
        let mut inner = self.inner.write();
        let first = inner.row_count;
        for value in values {
            inner.push(value);
        }
        first
    }

    /// Calls `visit` once per row, in ascending row order.
    ///
    /// The shared lock is held for the whole walk. `visit` must not call
    /// back into the same store: the lock is fair, so a re-entrant read
    /// queued behind a waiting append deadlocks.
    pub fn iterate<F>(&self, mut visit: F)
    where
        F: FnMut(u64, &V),
    {
        let inner = self.inner.read();
        for run in &inner.runs {
            for offset in 0..run.length {
                visit(run.start_row + offset, &run.value);
            }
        }
    }

    /// Like [`RleStore::iterate`], including the ban on re-entering the
    /// store from `visit`, but stops as soon as `visit` breaks and
    /// returns the break value.
    pub fn try_iterate<B, F>(&self, mut visit: F) -> Option<B>
    where
        F: FnMut(u64, &V) -> ControlFlow<B>,
    {
        let inner = self.inner.read();
        for run in &inner.runs {
            for offset in 0..run.length {
                if let ControlFlow::Break(b) = visit(run.start_row + offset, &run.value) {
                    return Some(b);
                }
            }
        }
        None
    }

    /// Visits the rows in `range`, starting from the run that contains
    /// `range.start`. The end is clamped to the row count. Same locking
    /// rules as [`RleStore::iterate`].
    pub fn iterate_range<F>(&self, range: Range<u64>, mut visit: F)
    where
        F: FnMut(u64, &V),
    {
        let inner = self.inner.read();
        let end = range.end.min(inner.row_count);
        if range.start >= end {
            return;
        }
        let Some(first) = inner.run_index(range.start) else {
            return;
        };
        for run in &inner.runs[first..] {
            if run.start_row >= end {
                break;
            }
            let from = run.start_row.max(range.start);
            let to = run.end_row().min(end);
            for row in from..to {
                visit(row, &run.value);
            }
        }
    }

    /// Returns the value stored at `row`.
    pub fn get(&self, row: u64) -> Option<V> {
        let inner = self.inner.read();
        inner
            .run_index(row)
            .map(|idx| inner.runs[idx].value.clone())
    }

    /// Number of rows appended so far.
    pub fn row_count(&self) -> u64 {
        self.inner.read().row_count
    }

    /// Number of runs backing the rows.
    pub fn run_count(&self) -> u64 {
        self.inner.read().runs.len() as u64
    }

    /// Whether the store holds no rows.
    pub fn is_empty(&self) -> bool {
        self.inner.read().row_count == 0
    }

    /// Snapshot of the run sequence.
    pub fn runs(&self) -> Vec<Run<V>> {
        self.inner.read().runs.clone()
    }

    /// Expands the store into one value per row.
    pub fn to_vec(&self) -> Vec<V> {
        let inner = self.inner.read();
        let mut out = Vec::with_capacity(inner.row_count as usize);
        for run in &inner.runs {
            for _ in 0..run.length {
                out.push(run.value.clone());
            }
        }
        out
    }

    /// Row and run counts of the store.
    pub fn stats(&self) -> StoreStats {
        let inner = self.inner.read();
        let rows = inner.row_count;
        let runs = inner.runs.len() as u64;
        let compression_ratio = if runs == 0 {
            0.0
        } else {
            rows as f64 / runs as f64
        };
        StoreStats {
            rows,
            runs,
            compression_ratio,
        }
    }

    /// Serializes the whole store to `writer`.
    ///
    /// The store is never modified; on error `writer` may hold a partial,
    /// unusable prefix.
    pub fn write<W: Write>(&self, mut writer: W) -> Result<()> {
        let inner = self.inner.write();
        codec::encode_runs(&mut writer, &inner.runs, inner.row_count)?;
        writer.flush()?;
        debug!(
            runs = inner.runs.len(),
            rows = inner.row_count,
            "rle store written"
        );
        Ok(())
    }

    /// Replaces the store's content with the image read from `reader`.
    ///
    /// The decode is all-or-nothing: if anything in the stream is missing or
    /// malformed the current content is kept and the error is returned.
    pub fn read<R: Read>(&self, mut reader: R) -> Result<()> {
        let mut inner = self.inner.write();
        match codec::decode_runs::<V, _>(&mut reader, &self.limits) {
            Ok(decoded) => {
                inner.runs = decoded.runs;
                inner.row_count = decoded.row_count;
                debug!(
                    runs = inner.runs.len(),
                    rows = inner.row_count,
                    "rle store read"
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    error = %err,
                    rows = inner.row_count,
                    "rle store read rejected; keeping current content"
                );
                Err(err)
            }
        }
    }

    /// Atomically persists the store to `path`.
    ///
    /// The image is written to a temporary file beside `path` and renamed
    /// over it only after a successful write.
    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        atomic_write(path, |w| self.write(w))
    }

    /// Loads the store from `path` if the file exists.
    ///
    /// Returns `Ok(false)` and leaves the store untouched when there is no
    /// file; otherwise behaves like [`RleStore::read`].
    pub fn load_from_path(&self, path: impl AsRef<Path>) -> Result<bool> {
        let path = path.as_ref();
        if !file_exists(path) {
            debug!(path = %path.display(), "no persisted store found");
            return Ok(false);
        }
        let file = File::open(path)?;
        self.read(BufReader::new(file))?;
        Ok(true)
    }
}

impl<V: StoredValue> std::fmt::Debug for RleStore<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("RleStore")
            .field("rows", &inner.row_count)
            .field("runs", &inner.runs.len())
            .finish()
    }
}
