use std::io::Write;
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use arrow::util::pretty::pretty_format_batches;
use parquet::arrow::ArrowWriter;
use serde_json::{Map, Number, Value as JsonValue};

use super::model::{CellValue, ResultTable};
use crate::error::Result;

/// How a filtered table is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Boxed text table for the terminal.
    #[default]
    Pretty,
    /// Header row plus one record per row. Lossy: null and the empty string
    /// both become an empty field (read back as null), and a whole float such
    /// as `100.0` is written `100` (read back as an integer).
    Csv,
    /// Array of records.
    Json,
    Parquet,
}

/// Write `table` to `out` in the given format. `out` is flushed before
/// returning, so buffered sinks report their final write error here.
pub fn write_table<W: Write + Send>(
    table: &ResultTable,
    format: OutputFormat,
    out: W,
) -> Result<()> {
    match format {
        OutputFormat::Pretty => write_pretty(table, out),
        OutputFormat::Csv => write_csv(table, out),
        OutputFormat::Json => write_json(table, out),
        OutputFormat::Parquet => write_parquet(table, out),
    }
}

fn write_pretty<W: Write>(table: &ResultTable, mut out: W) -> Result<()> {
    let batch = to_record_batch(table)?;
    writeln!(out, "{}", pretty_format_batches(&[batch])?)?;
    writeln!(out, "{} rows", table.len())?;
    out.flush()?;
    Ok(())
}

fn write_csv<W: Write>(table: &ResultTable, out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(table.column_names())?;
    for row in table.rows() {
        writer.write_record(
            table
                .column_names()
                .iter()
                .map(|col| ResultTable::cell(row, col).to_string()),
        )?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json<W: Write>(table: &ResultTable, mut out: W) -> Result<()> {
    let records: Vec<JsonValue> = table
        .rows()
        .iter()
        .map(|row| {
            let obj: Map<String, JsonValue> = table
                .column_names()
                .iter()
                .map(|col| (col.clone(), cell_to_json(ResultTable::cell(row, col))))
                .collect();
            JsonValue::Object(obj)
        })
        .collect();
    serde_json::to_writer_pretty(&mut out, &records)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

fn write_parquet<W: Write + Send>(table: &ResultTable, out: W) -> Result<()> {
    let batch = to_record_batch(table)?;
    let mut writer = ArrowWriter::try_new(out, batch.schema(), None)?;
    writer.write(&batch)?;
    // `close` would drop the sink unflushed.
    writer.into_inner()?.flush()?;
    Ok(())
}

fn cell_to_json(cell: &CellValue) -> JsonValue {
    match cell {
        CellValue::String(s) => JsonValue::String(s.clone()),
        CellValue::Integer(i) => JsonValue::Number((*i).into()),
        CellValue::Float(f) => Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number),
        CellValue::Bool(b) => JsonValue::Bool(*b),
        CellValue::Null => JsonValue::Null,
    }
}

// ---------------------------------------------------------------------------
// ResultTable → Arrow
// ---------------------------------------------------------------------------

/// One Arrow type per column, from the kinds of its non-null cells.
/// Integers mixed with floats widen to Float64; any other mix, or a column
/// of nulls only, becomes Utf8.
fn infer_type<'a>(cells: impl Iterator<Item = &'a CellValue>) -> DataType {
    let mut seen: Option<DataType> = None;
    for cell in cells {
        let kind = match cell {
            CellValue::Null => continue,
            CellValue::String(_) => DataType::Utf8,
            CellValue::Integer(_) => DataType::Int64,
            CellValue::Float(_) => DataType::Float64,
            CellValue::Bool(_) => DataType::Boolean,
        };
        seen = Some(match (seen, kind) {
            (None, k) => k,
            (Some(a), b) if a == b => a,
            (Some(DataType::Int64), DataType::Float64)
            | (Some(DataType::Float64), DataType::Int64) => DataType::Float64,
            _ => return DataType::Utf8,
        });
    }
    seen.unwrap_or(DataType::Utf8)
}

fn build_column(table: &ResultTable, column: &str, data_type: &DataType) -> ArrayRef {
    let cells = table.rows().iter().map(|row| ResultTable::cell(row, column));
    match data_type {
        DataType::Int64 => Arc::new(Int64Array::from(
            cells
                .map(|c| match c {
                    CellValue::Integer(i) => Some(*i),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        DataType::Float64 => Arc::new(Float64Array::from(
            cells
                .map(|c| match c {
                    CellValue::Float(f) => Some(*f),
                    CellValue::Integer(i) => Some(*i as f64),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        DataType::Boolean => Arc::new(BooleanArray::from(
            cells
                .map(|c| match c {
                    CellValue::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        _ => Arc::new(StringArray::from(
            cells
                .map(|c| (!c.is_null()).then(|| c.to_string()))
                .collect::<Vec<Option<String>>>(),
        )),
    }
}

/// Convert a table to a single Arrow record batch, nulls preserved.
pub fn to_record_batch(table: &ResultTable) -> Result<RecordBatch> {
    let mut fields = Vec::with_capacity(table.column_names().len());
    let mut arrays = Vec::with_capacity(table.column_names().len());
    for col in table.column_names() {
        let data_type = infer_type(table.rows().iter().map(|row| ResultTable::cell(row, col)));
        arrays.push(build_column(table, col, &data_type));
        fields.push(Field::new(col.as_str(), data_type, true));
    }
    let options = RecordBatchOptions::new().with_row_count(Some(table.len()));
    let batch =
        RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), arrays, &options)?;
    Ok(batch)
}
