use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type,
    UInt32Type, UInt8Type,
};
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use log::info;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, ResultTable, Row};
use crate::error::{Result, TableError};

// ---------------------------------------------------------------------------
// QueryResult – anything an archive client hands back
// ---------------------------------------------------------------------------

/// A raw archive-query response that can be turned into a [`ResultTable`].
///
/// Conversion is the only thing the filters ever do with a query result.
pub trait QueryResult {
    fn to_table(&self) -> Result<ResultTable>;
}

impl QueryResult for ResultTable {
    fn to_table(&self) -> Result<ResultTable> {
        Ok(self.clone())
    }
}

impl QueryResult for RecordBatch {
    fn to_table(&self) -> Result<ResultTable> {
        table_from_batches(std::slice::from_ref(self))
    }
}

impl QueryResult for [RecordBatch] {
    fn to_table(&self) -> Result<ResultTable> {
        table_from_batches(self)
    }
}

impl QueryResult for Vec<RecordBatch> {
    fn to_table(&self) -> Result<ResultTable> {
        table_from_batches(self)
    }
}

/// Records-oriented JSON: `[{"name": ..., "productType": ...}, ...]`.
impl QueryResult for JsonValue {
    fn to_table(&self) -> Result<ResultTable> {
        table_from_json(self)
    }
}

/// A query result saved to disk. Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` / `.pq` – one row per product, scalar columns
/// * `.json`           – `[{ "name": ..., "productType": ..., ... }, ...]`
/// * `.csv`            – header row with column names
#[derive(Debug, Clone)]
pub struct QueryResultFile {
    path: PathBuf,
}

impl QueryResultFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        QueryResultFile { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl QueryResult for QueryResultFile {
    fn to_table(&self) -> Result<ResultTable> {
        let table = load_file(&self.path)?;
        info!(
            "loaded {} rows ({} columns) from {}",
            table.len(),
            table.column_names().len(),
            self.path.display()
        );
        Ok(table)
    }
}

fn load_file(path: &Path) -> Result<ResultTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => Err(TableError::UnsupportedFormat {
            extension: other.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

fn load_json(path: &Path) -> Result<ResultTable> {
    let text = std::fs::read_to_string(path)?;
    let root: JsonValue = serde_json::from_str(&text)?;
    table_from_json(&root)
}

/// Column order follows the first appearance of each key across records,
/// keys within a record in document order.
fn table_from_json(root: &JsonValue) -> Result<ResultTable> {
    let records = root
        .as_array()
        .ok_or_else(|| TableError::InvalidRecords("expected a top-level array".into()))?;

    let mut columns: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| TableError::InvalidRecords(format!("row {i} is not an object")))?;

        let mut row = Row::new();
        for (key, val) in obj {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
            row.insert(key.clone(), json_to_cell(val));
        }
        rows.push(row);
    }

    Ok(ResultTable::new(columns, rows))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Header row with column names; cell types are guessed per value.
fn load_csv(path: &Path) -> Result<ResultTable> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(col, value)| (col.clone(), guess_cell_type(value)))
            .collect();
        rows.push(row);
    }

    Ok(ResultTable::new(headers, rows))
}

/// Only integers, floats, booleans and the empty string are reinterpreted.
/// Everything else, including values like `F128N`, stays text verbatim.
fn guess_cell_type(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet / Arrow
// ---------------------------------------------------------------------------

fn load_parquet(path: &Path) -> Result<ResultTable> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    // Taken from the schema so a file with no row groups still has columns.
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();

    let mut rows = Vec::new();
    for batch in builder.build()? {
        let batch = batch?;
        rows.extend(table_from_batches(std::slice::from_ref(&batch))?.into_rows());
    }

    Ok(ResultTable::new(columns, rows))
}

/// Flatten record batches into rows. Columns come from the first batch's
/// schema; an empty slice gives an empty table with no columns.
fn table_from_batches(batches: &[RecordBatch]) -> Result<ResultTable> {
    let Some(first) = batches.first() else {
        return Ok(ResultTable::default());
    };
    let columns: Vec<String> = first
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();

    let mut rows = Vec::new();
    for batch in batches {
        let schema = batch.schema();
        for row_idx in 0..batch.num_rows() {
            let mut row = Row::new();
            for (field, col) in schema.fields().iter().zip(batch.columns()) {
                row.insert(field.name().clone(), extract_cell(col, row_idx)?);
            }
            rows.push(row);
        }
    }

    Ok(ResultTable::new(columns, rows))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &ArrayRef, row: usize) -> Result<CellValue> {
    if col.is_null(row) {
        return Ok(CellValue::Null);
    }
    let cell = match col.data_type() {
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        DataType::Int8 => CellValue::Integer(col.as_primitive::<Int8Type>().value(row).into()),
        DataType::Int16 => CellValue::Integer(col.as_primitive::<Int16Type>().value(row).into()),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row).into()),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => CellValue::Integer(col.as_primitive::<UInt8Type>().value(row).into()),
        DataType::UInt16 => CellValue::Integer(col.as_primitive::<UInt16Type>().value(row).into()),
        DataType::UInt32 => CellValue::Integer(col.as_primitive::<UInt32Type>().value(row).into()),
        DataType::Float32 => CellValue::Float(col.as_primitive::<Float32Type>().value(row).into()),
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        // Dictionary-encoded strings, timestamps, u64 and the rest keep their
        // Arrow text rendering.
        _ => CellValue::String(array_value_to_string(col.as_ref(), row)?),
    };
    Ok(cell)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use parquet::arrow::ArrowWriter;

    use super::*;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn sample_batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("name", DataType::Utf8, true),
            Field::new("productType", DataType::Utf8, false),
            Field::new("size", DataType::Int64, true),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec![Some("b"), None])),
                Arc::new(StringArray::from(vec!["preview", "PREVIEW"])),
                Arc::new(Int64Array::from(vec![Some(10), Some(20)])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn json_records() {
        let file = write_temp(
            ".json",
            r#"[{"name": "a", "productType": "PREVIEW", "size": 12},
                {"name": "b", "ra": 148.97, "flag": true, "note": null}]"#,
        );
        let table = QueryResultFile::new(file.path()).to_table().unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.column_names(),
            ["name", "productType", "size", "ra", "flag", "note"]
        );
        let row = &table.rows()[1];
        assert_eq!(ResultTable::cell(row, "ra"), &CellValue::Float(148.97));
        assert_eq!(ResultTable::cell(row, "flag"), &CellValue::Bool(true));
        assert_eq!(ResultTable::cell(row, "productType"), &CellValue::Null);
    }

    #[test]
    fn json_must_be_array_of_objects() {
        let not_array = serde_json::json!({"name": "a"});
        assert!(matches!(
            not_array.to_table(),
            Err(TableError::InvalidRecords(_))
        ));
        let not_object = serde_json::json!([1, 2]);
        assert!(matches!(
            not_object.to_table(),
            Err(TableError::InvalidRecords(_))
        ));
    }

    #[test]
    fn empty_json_array_is_empty_table() {
        let table = serde_json::json!([]).to_table().unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn csv_keeps_header_order_and_text() {
        let file = write_temp(
            ".csv",
            "name,insname,energy_bandpassName,exptime\nib6w,WFC3/IR,F128N,399.2\nic01,WFC3/IR,,\n",
        );
        let table = QueryResultFile::new(file.path()).to_table().unwrap();
        assert_eq!(
            table.column_names(),
            ["name", "insname", "energy_bandpassName", "exptime"]
        );
        let rows = table.rows();
        assert_eq!(
            ResultTable::cell(&rows[0], "energy_bandpassName"),
            &CellValue::from("F128N")
        );
        assert_eq!(
            ResultTable::cell(&rows[0], "exptime"),
            &CellValue::Float(399.2)
        );
        assert_eq!(
            ResultTable::cell(&rows[1], "energy_bandpassName"),
            &CellValue::Null
        );
    }

    #[test]
    fn csv_header_only() {
        let file = write_temp(".csv", "name,productType\n");
        let table = QueryResultFile::new(file.path()).to_table().unwrap();
        assert!(table.is_empty());
        assert_eq!(table.column_names(), ["name", "productType"]);
    }

    #[test]
    fn record_batch_cells() {
        let table = sample_batch().to_table().unwrap();
        assert_eq!(table.column_names(), ["name", "productType", "size"]);
        let rows = table.rows();
        assert_eq!(ResultTable::cell(&rows[0], "name"), &CellValue::from("b"));
        assert_eq!(ResultTable::cell(&rows[1], "name"), &CellValue::Null);
        assert_eq!(ResultTable::cell(&rows[1], "size"), &CellValue::Integer(20));
    }

    #[test]
    fn batches_concatenate() {
        let batches = vec![sample_batch(), sample_batch()];
        assert_eq!(batches.to_table().unwrap().len(), 4);
        assert_eq!(batches.as_slice().to_table().unwrap().len(), 4);
    }

    #[test]
    fn parquet_round_trip_and_empty_file() {
        let batch = sample_batch();
        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer =
            ArrowWriter::try_new(file.reopen().unwrap(), batch.schema(), None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
        let table = QueryResultFile::new(file.path()).to_table().unwrap();
        assert_eq!(table, batch.to_table().unwrap());

        let empty = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let writer = ArrowWriter::try_new(empty.reopen().unwrap(), batch.schema(), None).unwrap();
        writer.close().unwrap();
        let table = QueryResultFile::new(empty.path()).to_table().unwrap();
        assert!(table.is_empty());
        assert_eq!(table.column_names(), ["name", "productType", "size"]);
    }

    #[test]
    fn unknown_extension() {
        let file = write_temp(".xml", "<VOTABLE/>");
        match QueryResultFile::new(file.path()).to_table() {
            Err(TableError::UnsupportedFormat { extension }) => assert_eq!(extension, "xml"),
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }
}
