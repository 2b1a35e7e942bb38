use std::{fs::File, io, path::Path};

use anyhow::{bail, Context, Result};
use tempfile::NamedTempFile;
use tracing::debug;

use super::ensure_dir_exists;

/// Download a large file from `file_url` to `out_path` through a temp file.
/// Refuses to overwrite an existing file unless `force` is set.
pub(crate) fn download_big_file(file_url: &str, out_path: &Path, force: bool) -> Result<()> {
    if !force && out_path.exists() {
        bail!("Refusing to overwrite existing file: {}", out_path.display());
    }
    let dir = out_path.parent().unwrap_or(Path::new("."));
    ensure_dir_exists(dir)?;

    debug!(url = file_url, path = %out_path.display(), "downloading");
    let mut resp = reqwest::blocking::get(file_url)
        .with_context(|| format!("GET {file_url}"))?
        .error_for_status()
        .with_context(|| format!("GET {file_url} returned error status"))?;

    let mut tmp = NamedTempFile::new_in(dir).context("create temp file")?;
    io::copy(&mut resp, &mut tmp).with_context(|| format!("write {}", out_path.display()))?;
    tmp.as_file().sync_all().ok();
    tmp.persist(out_path).with_context(|| format!("rename to {}", out_path.display()))?;

    // fsync the directory entry where supported
    let _ = File::open(dir).and_then(|f| f.sync_all());
    Ok(())
}
