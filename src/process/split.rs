// src/process/split.rs
use anyhow::{Context, Result};
use arrow::array::Array;
use arrow::record_batch::RecordBatch;
use calamine::{open_workbook_auto, Reader};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::collections::HashSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, instrument, warn};

use crate::process::columns::sheet_file_stem;
use crate::process::convert::table_to_record_batch;
use crate::process::infer::infer_column_type;
use crate::process::SheetTable;

/// What one sheet produced: its shape and where the Parquet file landed.
#[derive(Debug)]
pub struct SheetOutput {
    pub sheet_name: String,
    pub rows: usize,
    pub columns: usize,
    pub path: PathBuf,
}

/// Convert every sheet of `workbook_path` into a Parquet file under
/// `out_dir`. A sheet that cannot be loaded or converted is logged and
/// skipped; an unopenable workbook is fatal.
#[instrument(level = "info", skip(workbook_path, out_dir), fields(workbook = %workbook_path.as_ref().display()))]
pub fn split_workbook_to_parquet<P: AsRef<Path>, Q: AsRef<Path>>(
    workbook_path: P,
    out_dir: Q,
) -> Result<Vec<SheetOutput>> {
    let workbook_path = workbook_path.as_ref();
    let out_dir = out_dir.as_ref();
    let start = Instant::now();

    let mut workbook = open_workbook_auto(workbook_path)
        .with_context(|| format!("opening workbook `{}`", workbook_path.display()))?;

    let sheet_names = workbook.sheet_names().to_vec();
    info!(sheets = sheet_names.len(), "loaded workbook");

    let mut outputs = Vec::with_capacity(sheet_names.len());
    let mut used_stems: HashSet<String> = HashSet::new();

    for sheet_name in &sheet_names {
        let range = match workbook.worksheet_range(sheet_name) {
            Ok(range) => range,
            Err(e) => {
                error!(sheet = %sheet_name, "failed to load sheet, skipping: {}", e);
                continue;
            }
        };

        let table = match SheetTable::from_range(sheet_name, &range) {
            Some(table) => table,
            None => {
                warn!(sheet = %sheet_name, "sheet has no cells, skipping");
                continue;
            }
        };

        let types: Vec<_> = (0..table.headers.len())
            .map(|idx| infer_column_type(table.column(idx)))
            .collect();

        let batch = match table_to_record_batch(&table, &types) {
            Ok(batch) => batch,
            Err(e) => {
                error!(sheet = %sheet_name, "failed to convert sheet, skipping: {:#}", e);
                continue;
            }
        };
        report_null_heavy_columns(sheet_name, &batch);

        let stem = unique_stem(sheet_file_stem(sheet_name), &mut used_stems);
        let out_path = out_dir.join(format!("{}.parquet", stem));
        if let Err(e) = write_parquet(&batch, &out_path) {
            error!(sheet = %sheet_name, "failed to write parquet, skipping: {:#}", e);
            continue;
        }

        info!(
            sheet = %sheet_name,
            rows = batch.num_rows(),
            columns = batch.num_columns(),
            out = %out_path.display(),
            "wrote sheet"
        );
        outputs.push(SheetOutput {
            sheet_name: sheet_name.clone(),
            rows: batch.num_rows(),
            columns: batch.num_columns(),
            path: out_path,
        });
    }

    info!(
        produced = outputs.len(),
        elapsed = ?start.elapsed(),
        "workbook split complete"
    );
    Ok(outputs)
}

/// Write one RecordBatch as a Parquet file. Writes to a `.tmp` path first,
/// then renames into place.
pub fn write_parquet(batch: &RecordBatch, out_path: &Path) -> Result<()> {
    let tmp_path = out_path.with_extension("tmp");
    let file = File::create(&tmp_path)
        .with_context(|| format!("creating `{}`", tmp_path.display()))?;

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .set_dictionary_enabled(true)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
        .context("opening parquet writer")?;
    writer.write(batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;

    fs::rename(&tmp_path, out_path).with_context(|| {
        format!(
            "renaming `{}` to `{}`",
            tmp_path.display(),
            out_path.display()
        )
    })?;
    Ok(())
}

/// Two sheets can normalize to the same file stem; suffix the later one.
fn unique_stem(stem: String, used: &mut HashSet<String>) -> String {
    let mut candidate = stem.clone();
    let mut n = 1;
    while !used.insert(candidate.clone()) {
        candidate = format!("{}_{}", stem, n);
        n += 1;
    }
    candidate
}

fn report_null_heavy_columns(sheet_name: &str, batch: &RecordBatch) {
    let rows = batch.num_rows();
    if rows == 0 {
        return;
    }
    for (field, column) in batch.schema().fields().iter().zip(batch.columns()) {
        let nulls = column.null_count();
        if nulls * 2 > rows {
            warn!(
                sheet = %sheet_name,
                column = %field.name(),
                nulls,
                rows,
                "column is more than half null"
            );
        }
    }
}
