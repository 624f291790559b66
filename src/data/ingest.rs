use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, ArrayRef, BooleanArray, Date32Array, Date64Array, Float32Array, Float64Array,
    Int32Array, Int64Array, LargeStringArray, StringArray, TimestampMillisecondArray,
};
use arrow::datatypes::{DataType as ArrowType, TimeUnit};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::model::{Attribute, ColumnBatch, DataType, Value};

const MILLIS_PER_DAY: i64 = 86_400_000;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Read a column batch from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – flat columns (strings, ints, floats, bools, dates)
/// * `.json`    – `{ name: { "type": .., "values": [..] } }` or `[{ name: value }, ..]`
/// * `.csv`     – header row, one record per row
pub fn load_file(path: &Path) -> Result<ColumnBatch> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let batch = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!(
        "Read {} rows with columns {:?} from {}",
        batch.values().next().map_or(0, Attribute::len),
        batch.keys().collect::<Vec<_>>(),
        path.display()
    );
    Ok(batch)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RawColumn {
    #[serde(rename = "type")]
    data_type: String,
    values: Vec<JsonValue>,
}

/// Two accepted layouts:
///
/// ```json
/// { "score": { "type": "number", "values": [1, 2] },
///   "host":  { "type": "string", "values": ["a", "b"] } }
/// ```
///
/// or records (`df.to_json(orient='records')`), with types inferred per column:
///
/// ```json
/// [ { "score": 1, "host": "a" }, { "score": 2, "host": "b" } ]
/// ```
fn load_json(path: &Path) -> Result<ColumnBatch> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;
    parse_json(root)
}

pub fn parse_json(root: JsonValue) -> Result<ColumnBatch> {
    match root {
        JsonValue::Object(columns) => {
            let mut batch = ColumnBatch::new();
            for (name, column) in columns {
                let raw: RawColumn = serde_json::from_value(column)
                    .with_context(|| format!("Column '{name}' is not {{ type, values }}"))?;
                let data_type = raw
                    .data_type
                    .parse::<DataType>()
                    .with_context(|| format!("Column '{name}'"))?;
                let values = raw.values.iter().map(json_to_value).collect();
                batch.insert(name, Attribute::new(data_type, values));
            }
            Ok(batch)
        }
        JsonValue::Array(records) => {
            let mut names = BTreeSet::new();
            for (i, rec) in records.iter().enumerate() {
                let obj = rec
                    .as_object()
                    .with_context(|| format!("Row {i} is not a JSON object"))?;
                names.extend(obj.keys().cloned());
            }

            let mut columns: BTreeMap<String, Vec<Value>> = names
                .into_iter()
                .map(|name| (name, Vec::with_capacity(records.len())))
                .collect();
            for rec in &records {
                for (name, values) in columns.iter_mut() {
                    values.push(rec.get(name).map_or(Value::Null, json_to_value));
                }
            }

            Ok(columns
                .into_iter()
                .map(|(name, values)| (name, Attribute::new(infer_type(&values), values)))
                .collect())
        }
        _ => bail!("Expected a JSON object of columns or an array of records"),
    }
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => Value::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Null,
        other => Value::String(other.to_string()),
    }
}

/// Number when every non-null cell is numeric, Boolean when every one is a
/// bool, String otherwise.
fn infer_type(values: &[Value]) -> DataType {
    let mut cells = values.iter().filter(|v| !matches!(v, Value::Null)).peekable();
    if cells.peek().is_none() {
        return DataType::String;
    }
    let mut numeric = true;
    let mut boolean = true;
    for cell in cells {
        numeric &= matches!(cell, Value::Integer(_) | Value::Float(_));
        boolean &= matches!(cell, Value::Bool(_));
    }
    if numeric {
        DataType::Number
    } else if boolean {
        DataType::Boolean
    } else {
        DataType::String
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout:  header row with column names, one record per row.
/// Empty cells are null. A column is numeric only if every non-empty cell
/// parses as a number; otherwise its cells are kept as text.
fn load_csv(path: &Path) -> Result<ColumnBatch> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        for (col_idx, cells) in raw.iter_mut().enumerate() {
            cells.push(record.get(col_idx).unwrap_or("").to_string());
        }
    }

    let mut batch = ColumnBatch::new();
    for (name, cells) in headers.into_iter().zip(raw) {
        let guessed: Vec<Value> = cells.iter().map(|s| guess_value(s)).collect();
        let data_type = infer_type(&guessed);
        let values = if data_type == DataType::String {
            cells
                .into_iter()
                .map(|s| if s.is_empty() { Value::Null } else { Value::String(s) })
                .collect()
        } else {
            guessed
        };
        batch.insert(name, Attribute::new(data_type, values));
    }
    Ok(batch)
}

fn guess_value(s: &str) -> Value {
    if s.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Value::Float(f);
    }
    if s == "true" || s == "false" {
        return Value::Bool(s == "true");
    }
    Value::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of flat columns.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`). Dates arrive as epoch milliseconds.
fn load_parquet(path: &Path) -> Result<ColumnBatch> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut batch = ColumnBatch::new();
    for batch_result in reader {
        let record_batch = batch_result.context("reading parquet record batch")?;
        let schema = record_batch.schema();

        for (field, col) in schema.fields().iter().zip(record_batch.columns()) {
            let (data_type, values) = arrow_column(field.name(), col)?;
            batch
                .entry(field.name().clone())
                .or_insert_with(|| Attribute::new(data_type, Vec::new()))
                .values
                .extend(values);
        }
    }
    Ok(batch)
}

// -- Parquet / Arrow helpers --

fn downcast<'a, A: Array + 'static>(col: &'a ArrayRef, name: &str) -> Result<&'a A> {
    col.as_any()
        .downcast_ref::<A>()
        .with_context(|| format!("column '{name}': unexpected array layout"))
}

fn column_cells<A: Array>(arr: &A, cell: impl Fn(usize) -> Value) -> Vec<Value> {
    (0..arr.len())
        .map(|row| if arr.is_null(row) { Value::Null } else { cell(row) })
        .collect()
}

/// Convert one Arrow column into a declared type and cell values.
fn arrow_column(name: &str, col: &ArrayRef) -> Result<(DataType, Vec<Value>)> {
    let converted = match col.data_type() {
        ArrowType::Utf8 => {
            let arr = downcast::<StringArray>(col, name)?;
            (DataType::String, column_cells(arr, |i| Value::String(arr.value(i).to_string())))
        }
        ArrowType::LargeUtf8 => {
            let arr = downcast::<LargeStringArray>(col, name)?;
            (DataType::String, column_cells(arr, |i| Value::String(arr.value(i).to_string())))
        }
        ArrowType::Int32 => {
            let arr = downcast::<Int32Array>(col, name)?;
            (DataType::Number, column_cells(arr, |i| Value::Integer(arr.value(i) as i64)))
        }
        ArrowType::Int64 => {
            let arr = downcast::<Int64Array>(col, name)?;
            (DataType::Number, column_cells(arr, |i| Value::Integer(arr.value(i))))
        }
        ArrowType::Float32 => {
            let arr = downcast::<Float32Array>(col, name)?;
            (DataType::Number, column_cells(arr, |i| Value::Float(arr.value(i) as f64)))
        }
        ArrowType::Float64 => {
            let arr = downcast::<Float64Array>(col, name)?;
            (DataType::Number, column_cells(arr, |i| Value::Float(arr.value(i))))
        }
        ArrowType::Boolean => {
            let arr = downcast::<BooleanArray>(col, name)?;
            (DataType::Boolean, column_cells(arr, |i| Value::Bool(arr.value(i))))
        }
        ArrowType::Date32 => {
            let arr = downcast::<Date32Array>(col, name)?;
            let to_millis = |i| Value::Integer(arr.value(i) as i64 * MILLIS_PER_DAY);
            (DataType::Date, column_cells(arr, to_millis))
        }
        ArrowType::Date64 => {
            let arr = downcast::<Date64Array>(col, name)?;
            (DataType::Date, column_cells(arr, |i| Value::Integer(arr.value(i))))
        }
        ArrowType::Timestamp(TimeUnit::Millisecond, _) => {
            let arr = downcast::<TimestampMillisecondArray>(col, name)?;
            (DataType::Date, column_cells(arr, |i| Value::Integer(arr.value(i))))
        }
        other => bail!("column '{name}': unsupported Arrow type {other:?}"),
    };
    Ok(converted)
}
