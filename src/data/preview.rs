//! JSON rendering of the head of a table

use crate::error::Result;
use polars::prelude::*;
use serde::Serialize;
use serde_json::{Map, Value};

/// First rows of a table as records keyed by column name
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preview {
    pub columns: Vec<String>,
    pub rows: Vec<Map<String, Value>>,
    pub total_rows: usize,
    pub total_columns: usize,
}

/// Render up to `limit` rows of `frame`. Missing cells become `null`.
pub fn render_preview(frame: &DataFrame, limit: usize) -> Result<Preview> {
    let head = frame.head(Some(limit));
    let columns: Vec<String> = frame
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut rows = Vec::with_capacity(head.height());
    for i in 0..head.height() {
        let mut record = Map::with_capacity(columns.len());
        for (name, col) in columns.iter().zip(head.get_columns()) {
            record.insert(name.clone(), cell_to_json(col.get(i)?));
        }
        rows.push(record);
    }

    Ok(Preview {
        columns,
        rows,
        total_rows: frame.height(),
        total_columns: frame.width(),
    })
}

fn cell_to_json(value: AnyValue) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(v) => Value::Bool(v),
        AnyValue::String(v) => Value::String(v.to_string()),
        AnyValue::StringOwned(v) => Value::String(v.to_string()),
        AnyValue::Int8(v) => Value::from(v),
        AnyValue::Int16(v) => Value::from(v),
        AnyValue::Int32(v) => Value::from(v),
        AnyValue::Int64(v) => Value::from(v),
        AnyValue::UInt8(v) => Value::from(v),
        AnyValue::UInt16(v) => Value::from(v),
        AnyValue::UInt32(v) => Value::from(v),
        AnyValue::UInt64(v) => Value::from(v),
        // Non-finite floats have no JSON form and map to null
        AnyValue::Float32(v) => serde_json::Number::from_f64(v as f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        AnyValue::Float64(v) => serde_json::Number::from_f64(v)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        other => Value::String(other.to_string()),
    }
}
