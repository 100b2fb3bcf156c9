#![forbid(unsafe_code)]

use std::{
    fs,
    io::{BufWriter, Write},
    path::Path,
};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::types::{Result, RleError};

/// Returns true if `path` names an existing regular file.
///
/// Used to decide whether a persisted store should be loaded at all; a
/// missing file is not an error for callers that fall back to an empty store.
pub fn file_exists(path: impl AsRef<Path>) -> bool {
    fs::metadata(path)
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

/// Writes a file by streaming into a temporary sibling and renaming it over
/// `path` once `fill` succeeds and the data is synced.
///
/// On failure the temporary file is removed and `path` is left as it was.
pub fn atomic_write<F>(path: impl AsRef<Path>, fill: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        fill(&mut writer)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| RleError::Io(err.error))?;
    debug!(path = %path.display(), "atomic write committed");
    Ok(())
}
