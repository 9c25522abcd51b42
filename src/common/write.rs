use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tempfile::NamedTempFile;

/// Write-then-rename wrapper so a reader never sees a partial output file.
pub(crate) struct PendingWrite {
    target: PathBuf,
    tmp: NamedTempFile,
}

/// Open a temp file next to `target`. Refuses an existing target unless `force`.
pub(crate) fn open_for_write(target: &Path, force: bool) -> Result<PendingWrite> {
    let parent = target.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    if parent.exists() && !parent.is_dir() {
        bail!("Path exists but is not a directory: {}", parent.display());
    }
    fs::create_dir_all(parent)
        .with_context(|| format!("create dir {}", parent.display()))?;
    if !force && target.exists() {
        bail!("Refusing to overwrite existing file: {} (use --force)", target.display());
    }
    let tmp = NamedTempFile::new_in(parent).context("create temp file")?;
    Ok(PendingWrite { target: target.to_path_buf(), tmp })
}

impl Write for PendingWrite {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> { self.tmp.write(buf) }
    fn flush(&mut self) -> std::io::Result<()> { self.tmp.flush() }
}

impl PendingWrite {
    /// Sync and move the temp file into place.
    pub(crate) fn finalize(mut self) -> Result<PathBuf> {
        self.tmp.flush().context("flush temp file")?;
        self.tmp.as_file().sync_all().ok(); // best effort
        self.tmp.persist(&self.target)
            .with_context(|| format!("rename to {}", self.target.display()))?;
        if let Some(dir) = self.target.parent() {
            let _ = File::open(dir).and_then(|f| f.sync_all());
        }
        Ok(self.target)
    }
}

/// Atomically write `bytes` to `target`.
pub(crate) fn write_atomic(target: &Path, bytes: &[u8], force: bool) -> Result<PathBuf> {
    let mut pending = open_for_write(target, force)?;
    pending.write_all(bytes)
        .with_context(|| format!("write {}", target.display()))?;
    pending.finalize()
}
