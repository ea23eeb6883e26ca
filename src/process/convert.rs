// src/process/convert.rs
use anyhow::{Context, Result};
use arrow::array::{
    ArrayRef, BooleanBuilder, Float64Builder, Int64Builder, StringBuilder,
    TimestampMicrosecondBuilder,
};
use arrow::datatypes::{DataType, Field, Schema as ArrowSchema, TimeUnit};
use arrow::record_batch::RecordBatch;
use calamine::Data;
use chrono::NaiveDateTime;
use std::sync::Arc;

use crate::process::infer::{parse_date_string, ColumnType};
use crate::process::SheetTable;

fn arrow_type(ty: ColumnType) -> DataType {
    match ty {
        ColumnType::Text => DataType::Utf8,
        ColumnType::Integer => DataType::Int64,
        ColumnType::Float => DataType::Float64,
        ColumnType::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, None),
        ColumnType::Boolean => DataType::Boolean,
    }
}

/// Convert one sheet into a RecordBatch, one typed Arrow array per column.
/// Every column is nullable; cells that cannot be coerced to the column's
/// inferred type become nulls rather than failing the sheet.
pub fn table_to_record_batch(table: &SheetTable, types: &[ColumnType]) -> Result<RecordBatch> {
    let fields: Vec<Field> = table
        .headers
        .iter()
        .zip(types)
        .map(|(name, ty)| Field::new(name, arrow_type(*ty), true))
        .collect();
    let schema = Arc::new(ArrowSchema::new(fields));

    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(types.len());
    for (idx, ty) in types.iter().enumerate() {
        let array: ArrayRef = match ty {
            ColumnType::Text => build_text(table, idx),
            ColumnType::Integer => build_integer(table, idx),
            ColumnType::Float => build_float(table, idx),
            ColumnType::Timestamp => build_timestamp(table, idx),
            ColumnType::Boolean => build_boolean(table, idx),
        };
        arrays.push(array);
    }

    RecordBatch::try_new(schema, arrays)
        .with_context(|| format!("assembling record batch for sheet `{}`", table.name))
}

fn build_text(table: &SheetTable, idx: usize) -> ArrayRef {
    let mut b = StringBuilder::new();
    for cell in table.column(idx) {
        match cell {
            Data::Empty | Data::Error(_) => b.append_null(),
            other => b.append_value(other.to_string()),
        }
    }
    Arc::new(b.finish())
}

fn build_integer(table: &SheetTable, idx: usize) -> ArrayRef {
    let mut b = Int64Builder::new();
    for cell in table.column(idx) {
        let v = match cell {
            Data::Int(i) => Some(*i),
            Data::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Data::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        b.append_option(v);
    }
    Arc::new(b.finish())
}

fn build_float(table: &SheetTable, idx: usize) -> ArrayRef {
    let mut b = Float64Builder::new();
    for cell in table.column(idx) {
        let v = match cell {
            Data::Int(i) => Some(*i as f64),
            Data::Float(f) => Some(*f),
            Data::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        b.append_option(v);
    }
    Arc::new(b.finish())
}

fn build_timestamp(table: &SheetTable, idx: usize) -> ArrayRef {
    let mut b = TimestampMicrosecondBuilder::new();
    for cell in table.column(idx) {
        let dt: Option<NaiveDateTime> = match cell {
            Data::DateTime(dt) => dt.as_datetime(),
            Data::DateTimeIso(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .or_else(|| parse_date_string(s)),
            Data::String(s) => parse_date_string(s),
            _ => None,
        };
        b.append_option(dt.map(|dt| dt.and_utc().timestamp_micros()));
    }
    Arc::new(b.finish())
}

fn build_boolean(table: &SheetTable, idx: usize) -> ArrayRef {
    let mut b = BooleanBuilder::new();
    for cell in table.column(idx) {
        let v = match cell {
            Data::Bool(v) => Some(*v),
            _ => None,
        };
        b.append_option(v);
    }
    Arc::new(b.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Int64Array, StringArray, TimestampMicrosecondArray};

    fn sample_table() -> SheetTable {
        SheetTable {
            name: "Sales".into(),
            headers: vec!["item".into(), "qty".into(), "sold_on".into()],
            rows: vec![
                vec![
                    Data::String("widget".into()),
                    Data::Float(4.0),
                    Data::String("2024-01-15".into()),
                ],
                vec![
                    Data::String("gadget".into()),
                    Data::String("oops".into()),
                    Data::Empty,
                ],
            ],
        }
    }

    #[test]
    fn cells_coerce_to_inferred_types() -> Result<()> {
        let table = sample_table();
        let types = [ColumnType::Text, ColumnType::Integer, ColumnType::Timestamp];
        let batch = table_to_record_batch(&table, &types)?;

        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 3);

        let items = batch
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(items.value(0), "widget");

        let qty = batch
            .column(1)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(qty.value(0), 4);
        assert!(qty.is_null(1));

        let sold = batch
            .column(2)
            .as_any()
            .downcast_ref::<TimestampMicrosecondArray>()
            .unwrap();
        assert!(!sold.is_null(0));
        assert!(sold.is_null(1));
        Ok(())
    }

    #[test]
    fn zero_row_table_keeps_schema() -> Result<()> {
        let table = SheetTable {
            name: "Inventory".into(),
            headers: vec!["sku".into(), "stock_level".into()],
            rows: vec![],
        };
        let types = [ColumnType::Text, ColumnType::Integer];
        let batch = table_to_record_batch(&table, &types)?;

        assert_eq!(batch.num_rows(), 0);
        let names: Vec<_> = batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        assert_eq!(names, vec!["sku", "stock_level"]);
        Ok(())
    }
}
