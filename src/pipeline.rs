use anyhow::{bail, Context, Result};
use chrono::Local;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::archive::archive_source;
use crate::manifest::{write_manifest, RunManifest};
use crate::process::split::split_workbook_to_parquet;

/// Format for run timestamps and the raw-archive prefix.
const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Owns the output tree under one base directory:
/// `raw_files/` for byte-for-byte input copies and `processed_files/<run>/`
/// for per-sheet Parquet plus `metadata.json`.
pub struct Pipeline {
    raw_dir: PathBuf,
    processed_dir: PathBuf,
}

impl Pipeline {
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir: PathBuf = base_dir.into();
        let raw_dir = base_dir.join("raw_files");
        let processed_dir = base_dir.join("processed_files");
        for dir in [&raw_dir, &processed_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating output directory `{}`", dir.display()))?;
        }
        Ok(Pipeline {
            raw_dir,
            processed_dir,
        })
    }

    /// One run: archive the source, split every sheet into Parquet under a
    /// fresh timestamped directory, then write the metadata sidecar.
    pub fn process_workbook(&self, source: &Path) -> Result<RunManifest> {
        info!(source = %source.display(), "starting run");
        if !source.is_file() {
            bail!("input file `{}` does not exist", source.display());
        }

        let timestamp = Local::now().format(RUN_TIMESTAMP_FORMAT).to_string();
        let (run_dir, run_label) = self.create_run_dir(&timestamp)?;

        let raw_path = archive_source(source, &self.raw_dir, &run_label)?;
        info!(raw = %raw_path.display(), "raw copy stored");

        let outputs = split_workbook_to_parquet(source, &run_dir)?;

        let manifest = RunManifest::new(source, &run_label, &outputs);
        let manifest_path = write_manifest(&run_dir, &manifest)?;
        info!(
            manifest = %manifest_path.display(),
            sheets = manifest.sheets.len(),
            run_dir = %run_dir.display(),
            "run complete"
        );
        Ok(manifest)
    }

    /// Claim `processed_files/<timestamp>`, suffixing `_1`, `_2`, … when
    /// another run already took the same second.
    fn create_run_dir(&self, timestamp: &str) -> Result<(PathBuf, String)> {
        let mut label = timestamp.to_string();
        let mut n = 0;
        loop {
            let dir = self.processed_dir.join(&label);
            match fs::create_dir(&dir) {
                Ok(()) => return Ok((dir, label)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    n += 1;
                    label = format!("{}_{}", timestamp, n);
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("creating run directory `{}`", dir.display())
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_second_runs_get_distinct_directories() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let pipeline = Pipeline::new(dir.path())?;

        let (first, first_label) = pipeline.create_run_dir("20240101_120000")?;
        let (second, second_label) = pipeline.create_run_dir("20240101_120000")?;

        assert_ne!(first, second);
        assert_eq!(first_label, "20240101_120000");
        assert_eq!(second_label, "20240101_120000_1");
        assert!(first.is_dir());
        assert!(second.is_dir());
        Ok(())
    }

    #[test]
    fn missing_input_creates_no_run_directory() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let pipeline = Pipeline::new(dir.path())?;

        let result = pipeline.process_workbook(&dir.path().join("gone.xlsx"));
        assert!(result.is_err());

        let runs: Vec<_> = fs::read_dir(dir.path().join("processed_files"))?
            .filter_map(|e| e.ok())
            .collect();
        assert!(runs.is_empty());
        Ok(())
    }
}
