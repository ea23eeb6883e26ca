// src/process/mod.rs
use calamine::{Data, Range};

pub mod columns;
pub mod convert;
pub mod infer;
pub mod split;

/// One sheet's worth of cells, pulled out of the workbook's rectangular
/// range: normalized header names plus every data row below the header.
#[derive(Debug)]
pub struct SheetTable {
    /// Sheet name exactly as the workbook declares it.
    pub name: String,
    /// Normalized column names, one per column of the range.
    pub headers: Vec<String>,
    /// Each data row, one `Data` cell per column.
    pub rows: Vec<Vec<Data>>,
}

impl SheetTable {
    /// Build a table from a loaded cell range. The first row of the range is
    /// the header; everything below is data. Returns `None` when the range
    /// holds no cells at all.
    pub fn from_range(name: &str, range: &Range<Data>) -> Option<SheetTable> {
        let mut rows = range.rows();
        let header_cells = rows.next()?;
        let headers = columns::normalize_headers(header_cells);

        let data: Vec<Vec<Data>> = rows.map(|row| row.to_vec()).collect();
        Some(SheetTable {
            name: name.to_string(),
            headers,
            rows: data,
        })
    }

    /// Iterate the cells of one column, top to bottom.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &Data> {
        self.rows.iter().map(move |row| &row[idx])
    }
}
