// src/process/infer.rs
use calamine::Data;
use chrono::{NaiveDate, NaiveDateTime};

/// Logical type a column is coerced to before conversion to Arrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Float,
    Timestamp,
    Boolean,
}

/// Only the first N non-empty cells of a column vote on its type.
const SAMPLE_LIMIT: usize = 1000;

/// Datetime-then-date formats tried against string cells, most specific first.
static DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];
static DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y", "%d-%b-%Y"];

/// Parse a string cell as a datetime, trying the formats above. Date-only
/// matches land at midnight.
pub fn parse_date_string(s: &str) -> Option<NaiveDateTime> {
    let trimmed = s.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Vote on a column's type from a sample of its cells, using the cell types
/// the workbook parser already assigned. Majority datetime wins over numeric;
/// an all-integral numeric column becomes `Integer`; anything inconclusive
/// stays `Text`.
pub fn infer_column_type<'a>(cells: impl Iterator<Item = &'a Data>) -> ColumnType {
    let mut total = 0usize;
    let mut numeric = 0usize;
    let mut integral = 0usize;
    let mut dates = 0usize;
    let mut bools = 0usize;

    for cell in cells.filter(|c| !matches!(c, Data::Empty)).take(SAMPLE_LIMIT) {
        total += 1;
        match cell {
            Data::Int(_) => {
                numeric += 1;
                integral += 1;
            }
            Data::Float(f) => {
                numeric += 1;
                if f.fract() == 0.0 {
                    integral += 1;
                }
            }
            Data::DateTime(_) | Data::DateTimeIso(_) => dates += 1,
            Data::Bool(_) => bools += 1,
            Data::String(s) if parse_date_string(s).is_some() => dates += 1,
            Data::String(s) if s.trim().parse::<f64>().is_ok() => {
                numeric += 1;
                if s.trim().parse::<i64>().is_ok() {
                    integral += 1;
                }
            }
            _ => {}
        }
    }

    if total == 0 {
        return ColumnType::Text;
    }

    if dates * 2 > total {
        ColumnType::Timestamp
    } else if numeric * 2 > total {
        if integral == numeric {
            ColumnType::Integer
        } else {
            ColumnType::Float
        }
    } else if bools * 2 > total {
        ColumnType::Boolean
    } else {
        ColumnType::Text
    }
}
