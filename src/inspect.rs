use anyhow::{Context, Result};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::fs::File;
use std::path::Path;

/// Shape of a produced Parquet file, read back from its footer metadata.
#[derive(Debug)]
pub struct TableSummary {
    pub columns: Vec<String>,
    pub rows: u64,
}

/// Read a Parquet file's column names and row count without materializing
/// any data.
pub fn summarize(path: &Path) -> Result<TableSummary> {
    let file =
        File::open(path).with_context(|| format!("opening parquet file `{}`", path.display()))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("reading parquet metadata from `{}`", path.display()))?;

    let rows = builder.metadata().file_metadata().num_rows() as u64;
    let columns = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();

    Ok(TableSummary { columns, rows })
}
