use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Copy `source` byte-for-byte into `raw_dir`, prefixing the stored name
/// with the run timestamp. Returns the full path of the stored copy.
pub fn archive_source(source: &Path, raw_dir: &Path, timestamp: &str) -> Result<PathBuf> {
    let file_name = match source.file_name() {
        Some(name) => name.to_string_lossy().to_string(),
        None => bail!("input path `{}` has no file name", source.display()),
    };

    fs::create_dir_all(raw_dir)
        .with_context(|| format!("creating raw archive directory {}", raw_dir.display()))?;

    let dest = raw_dir.join(format!("{}_{}", timestamp, file_name));
    let bytes = fs::copy(source, &dest).with_context(|| {
        format!(
            "copying `{}` to `{}`",
            source.display(),
            dest.display()
        )
    })?;

    info!(bytes, dest = %dest.display(), "archived raw input");
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archived_copy_is_byte_identical() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let source = dir.path().join("report.xlsx");
        fs::write(&source, b"not really a workbook, but bytes are bytes")?;

        let raw_dir = dir.path().join("raw_files");
        let stored = archive_source(&source, &raw_dir, "20240101_120000")?;

        assert_eq!(
            stored.file_name().unwrap().to_string_lossy(),
            "20240101_120000_report.xlsx"
        );
        assert_eq!(fs::read(&source)?, fs::read(&stored)?);
        Ok(())
    }

    #[test]
    fn unreadable_source_is_an_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let missing = dir.path().join("gone.xlsx");
        let raw_dir = dir.path().join("raw_files");
        assert!(archive_source(&missing, &raw_dir, "20240101_120000").is_err());
        Ok(())
    }
}
