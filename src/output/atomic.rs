//! Replace-by-rename file writes

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Writes a file through a sibling temporary and renames it into place
///
/// The destination is either left untouched or fully replaced. Every call
/// stages into its own uniquely named temporary, which is removed on any
/// error. After the rename the parent directory is synced so the new entry
/// survives a crash.
///
/// # Arguments
///
/// * `path` - Final destination
/// * `write` - Produces the file contents
pub fn write_atomic<E, F>(path: &Path, write: F) -> Result<(), E>
where
    E: From<io::Error>,
    F: FnOnce(&mut dyn Write) -> Result<(), E>,
{
    let parent = parent_dir(path);
    let mut tmp = NamedTempFile::new_in(parent)?;

    {
        let mut out = BufWriter::new(tmp.as_file_mut());
        write(&mut out)?;
        out.flush()?;
    }
    tmp.as_file().sync_all()?;

    tmp.persist(path).map_err(|e| e.error)?;
    sync_dir(parent)?;
    Ok(())
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
