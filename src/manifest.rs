use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::process::split::SheetOutput;

/// One processed sheet as recorded in the run's metadata document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetEntry {
    pub sheet_name: String,
    pub row_count: usize,
    pub column_count: usize,
    pub output_path: String,
}

impl From<&SheetOutput> for SheetEntry {
    fn from(output: &SheetOutput) -> Self {
        SheetEntry {
            sheet_name: output.sheet_name.clone(),
            row_count: output.rows,
            column_count: output.columns,
            output_path: output.path.display().to_string(),
        }
    }
}

/// Provenance for one run: which file was processed, when, and what each
/// sheet produced. Written once per run and never touched again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub source_file: String,
    pub run_timestamp: String,
    pub sheets: Vec<SheetEntry>,
}

impl RunManifest {
    pub fn new(source: &Path, run_timestamp: &str, outputs: &[SheetOutput]) -> Self {
        let source_file = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| source.display().to_string());

        RunManifest {
            source_file,
            run_timestamp: run_timestamp.to_string(),
            sheets: outputs.iter().map(SheetEntry::from).collect(),
        }
    }
}

/// Serialize the manifest as pretty JSON to `<run_dir>/metadata.json`.
pub fn write_manifest(run_dir: &Path, manifest: &RunManifest) -> Result<PathBuf> {
    let path = run_dir.join("metadata.json");
    let file = File::create(&path)
        .with_context(|| format!("creating manifest `{}`", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), manifest)
        .context("serializing run manifest")?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn manifest_round_trips_through_json() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let outputs = vec![SheetOutput {
            sheet_name: "Sales".into(),
            rows: 100,
            columns: 5,
            path: dir.path().join("sales.parquet"),
        }];
        let manifest = RunManifest::new(Path::new("/data/q1.xlsx"), "20240101_120000", &outputs);

        let path = write_manifest(dir.path(), &manifest)?;
        let loaded: RunManifest = serde_json::from_slice(&fs::read(&path)?)?;

        assert_eq!(loaded.source_file, "q1.xlsx");
        assert_eq!(loaded.run_timestamp, "20240101_120000");
        assert_eq!(loaded.sheets.len(), 1);
        assert_eq!(loaded.sheets[0].sheet_name, "Sales");
        assert_eq!(loaded.sheets[0].row_count, 100);
        assert_eq!(loaded.sheets[0].column_count, 5);
        Ok(())
    }
}
