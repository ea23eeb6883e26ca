use anyhow::{bail, Context, Result};
use glob::glob;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extensions calamine can open.
static WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls"];

/// Resolve `input` to the list of workbook files to process.
///
/// A file path resolves to itself; a directory is scanned for spreadsheet
/// files one extension at a time and the result is sorted. A missing path or
/// a directory without any spreadsheets is an error.
pub fn discover_workbooks(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    if input.is_dir() {
        let mut found = Vec::new();
        for ext in WORKBOOK_EXTENSIONS {
            let pattern = format!("{}/*.{}", input.display(), ext);
            for entry in glob(&pattern).context("building workbook glob pattern")? {
                match entry {
                    Ok(path) if path.is_file() => found.push(path),
                    Ok(_) => {}
                    Err(e) => debug!("skipping unreadable dir entry: {}", e),
                }
            }
        }
        found.sort();
        if found.is_empty() {
            bail!("no spreadsheet files found under `{}`", input.display());
        }
        return Ok(found);
    }

    bail!("input path `{}` does not exist", input.display());
}
