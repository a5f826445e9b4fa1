use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use rusqlite::types::Value as SqlValue;
use rusqlite::Connection;
use serde_json::{Map, Value};
use tracing::info;

use crate::record::{self, HikeRecord};

/// Reshaped tabular collection: the fixed column set plus rows in
/// insertion order, as they came back out of the embedded engine.
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Load records into an in-memory SQL table and select everything back out.
/// Bulk-validates the rows (fail-slow, combined report) before loading.
pub fn load_table(records: &[HikeRecord]) -> Result<Table> {
    let rows: Vec<Map<String, Value>> = records.iter().map(HikeRecord::to_row).collect();
    record::validate_rows(&rows)?;

    let columns: Vec<String> = record::COLUMNS.iter().map(|c| c.to_string()).collect();

    let conn = Connection::open_in_memory()?;
    let decls: Vec<String> = columns
        .iter()
        .map(|c| format!("{} {}", c, sql_type(c)))
        .collect();
    conn.execute_batch(&format!("CREATE TABLE oh_hikes ({});", decls.join(", ")))?;

    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
    let mut insert = conn.prepare(&format!(
        "INSERT INTO oh_hikes ({}) VALUES ({})",
        columns.join(", "),
        placeholders.join(", ")
    ))?;
    for row in &rows {
        let cells: Vec<SqlValue> = columns.iter().map(|c| sql_cell(row.get(c))).collect();
        insert.execute(rusqlite::params_from_iter(cells))?;
    }
    drop(insert);

    let mut select = conn.prepare(&format!("SELECT {} FROM oh_hikes", columns.join(", ")))?;
    let selected = select
        .query_map([], |row| {
            (0..columns.len())
                .map(|i| row.get::<_, SqlValue>(i))
                .collect::<rusqlite::Result<Vec<SqlValue>>>()
        })?
        .collect::<rusqlite::Result<Vec<Vec<SqlValue>>>>()?;

    let rows = selected
        .into_iter()
        .map(|row| row.into_iter().map(json_cell).collect())
        .collect();

    Ok(Table { columns, rows })
}

/// Serialize the reshaped table as CSV with minimal quoting.
pub fn write_csv(records: &[HikeRecord], path: &Path) -> Result<()> {
    let table = load_table(records)?;
    let file =
        File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);

    let header: Vec<String> = table.columns.iter().map(|c| csv_field(c)).collect();
    writeln!(out, "{}", header.join(","))?;
    for row in &table.rows {
        let fields: Vec<String> = row.iter().map(|v| csv_field(&cell_text(v))).collect();
        writeln!(out, "{}", fields.join(","))?;
    }
    out.flush()?;

    info!("wrote {} rows to {}", table.rows.len(), path.display());
    Ok(())
}

/// Serialize the reshaped table as a single-batch Parquet file.
pub fn write_parquet(records: &[HikeRecord], path: &Path) -> Result<()> {
    let table = load_table(records)?;

    let fields: Vec<Field> = table
        .columns
        .iter()
        .map(|c| Field::new(c, arrow_type(c), true))
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(table.columns.len());
    for (i, column) in table.columns.iter().enumerate() {
        let cells = table.rows.iter().map(|row| &row[i]);
        let array: ArrayRef = match arrow_type(column) {
            DataType::Int64 => Arc::new(Int64Array::from(
                cells.map(Value::as_i64).collect::<Vec<Option<i64>>>(),
            )),
            _ => Arc::new(StringArray::from(
                cells
                    .map(|v| match v {
                        Value::Null => None,
                        other => Some(cell_text(other)),
                    })
                    .collect::<Vec<Option<String>>>(),
            )),
        };
        arrays.push(array);
    }

    let batch = RecordBatch::try_new(schema.clone(), arrays)?;
    let file =
        File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;

    info!("wrote {} rows to {}", table.rows.len(), path.display());
    Ok(())
}

fn sql_type(column: &str) -> &'static str {
    match column {
        "elevation_gain_in_feet" | "high_point_in_feet" => "INTEGER",
        _ => "TEXT",
    }
}

fn arrow_type(column: &str) -> DataType {
    match column {
        "elevation_gain_in_feet" | "high_point_in_feet" => DataType::Int64,
        _ => DataType::Utf8,
    }
}

fn sql_cell(value: Option<&Value>) -> SqlValue {
    match value {
        None | Some(Value::Null) => SqlValue::Null,
        Some(Value::String(s)) => SqlValue::Text(s.clone()),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Some(other) => SqlValue::Text(other.to_string()),
    }
}

fn json_cell(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(i) => Value::from(i),
        SqlValue::Real(f) => Value::from(f),
        SqlValue::Text(s) => Value::String(s),
        SqlValue::Blob(_) => Value::Null,
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Quote a field only when it contains a comma, quote or newline.
fn csv_field(text: &str) -> String {
    if text.contains(',') || text.contains('"') || text.contains('\n') {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

// ── Tests ──
