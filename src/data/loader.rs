//! Decoding of uploaded tabular files

use crate::error::{PipelineError, Result};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use polars::prelude::*;
use std::io::Cursor;
use tracing::debug;

/// Tabular formats accepted by the loader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Comma-delimited text with a header row
    Csv,
    /// Excel workbook (`.xls` / `.xlsx`); the first worksheet is read
    Excel,
}

impl FileFormat {
    /// Extensions accepted at the upload boundary
    pub const SUPPORTED_EXTENSIONS: &'static [&'static str] = &[".csv", ".xls", ".xlsx"];

    /// Detect the format from a file name suffix (case-insensitive)
    pub fn from_filename(filename: &str) -> Option<Self> {
        let lower = filename.to_lowercase();
        if lower.ends_with(".csv") {
            Some(FileFormat::Csv)
        } else if lower.ends_with(".xls") || lower.ends_with(".xlsx") {
            Some(FileFormat::Excel)
        } else {
            None
        }
    }
}

/// Turns raw upload bytes into a DataFrame
#[derive(Debug, Clone, Default)]
pub struct DataLoader;

impl DataLoader {
    pub fn new() -> Self {
        Self
    }

    /// Decode `bytes` according to the suffix of `filename`.
    ///
    /// Text columns whose every non-missing entry is a number are
    /// converted to `Float64` and all-`true`/`false` columns to
    /// `Boolean`. Remaining text cells are trimmed; NaN cells become nulls.
    pub fn load_bytes(&self, bytes: &[u8], filename: &str) -> Result<DataFrame> {
        let format = FileFormat::from_filename(filename)
            .ok_or_else(|| PipelineError::UnsupportedFormat(filename.to_string()))?;

        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(PipelineError::EmptyDataset);
        }

        let df = match format {
            FileFormat::Csv => self.read_csv(bytes)?,
            FileFormat::Excel => self.read_spreadsheet(bytes)?,
        };

        if df.height() == 0 {
            return Err(PipelineError::EmptyDataset);
        }

        let df = coerce_columns(df)?;
        debug!(rows = df.height(), columns = df.width(), ?format, "Decoded upload");
        Ok(df)
    }

    fn read_csv(&self, bytes: &[u8]) -> Result<DataFrame> {
        // Every column is read as text; dtypes are decided over all rows
        // by `coerce_columns`, not from a leading sample
        let mut df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()?;

        // Headers written as "a, b" carry the space into the name
        let trimmed: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.trim().to_string())
            .collect();
        df.set_column_names(trimmed)?;
        Ok(df)
    }

    fn read_spreadsheet(&self, bytes: &[u8]) -> Result<DataFrame> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
        let range = match workbook.worksheet_range_at(0) {
            Some(range) => range?,
            None => return Err(PipelineError::EmptyDataset),
        };

        let mut rows = range.rows();
        let header: Vec<String> = match rows.next() {
            Some(cells) => cells
                .iter()
                .enumerate()
                .map(|(i, cell)| match cell {
                    Data::Empty => format!("Unnamed: {}", i),
                    other => other.to_string().trim().to_string(),
                })
                .collect(),
            None => return Err(PipelineError::EmptyDataset),
        };

        let body: Vec<&[Data]> = rows
            .filter(|cells| cells.iter().any(|c| !matches!(c, Data::Empty)))
            .collect();

        let columns: Vec<Column> = header
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let cells: Vec<&Data> = body.iter().map(|row| &row[idx]).collect();
                spreadsheet_column(name, &cells)
            })
            .collect();

        Ok(DataFrame::new(columns)?)
    }
}

fn spreadsheet_column(name: &str, cells: &[&Data]) -> Column {
    let all_numeric = cells
        .iter()
        .all(|c| matches!(c, Data::Int(_) | Data::Float(_) | Data::Empty | Data::Error(_)));

    if all_numeric {
        let values: Vec<Option<f64>> = cells
            .iter()
            .map(|c| match c {
                Data::Int(v) => Some(*v as f64),
                Data::Float(v) if !v.is_nan() => Some(*v),
                _ => None,
            })
            .collect();
        Series::new(name.into(), values).into_column()
    } else {
        let values: Vec<Option<String>> = cells
            .iter()
            .map(|c| match c {
                Data::Empty | Data::Error(_) => None,
                other => Some(other.to_string()),
            })
            .collect();
        Series::new(name.into(), values).into_column()
    }
}

/// Retype text columns and scrub NaN from float columns
fn coerce_columns(mut df: DataFrame) -> Result<DataFrame> {
    let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();

    for name in names {
        let series = df.column(&name)?.as_materialized_series().clone();
        let replacement = match series.dtype() {
            DataType::String => Some(retype_text(&series)?),
            DataType::Float32 | DataType::Float64 => Some(nan_to_null(&series)?),
            _ => None,
        };
        if let Some(replacement) = replacement {
            df.with_column(replacement)?;
        }
    }

    Ok(df)
}

/// Numeric or boolean when every non-blank entry allows it, else trimmed text
fn retype_text(series: &Series) -> Result<Series> {
    if let Some(numeric) = parse_numeric_text(series)? {
        return Ok(numeric);
    }
    if let Some(flags) = parse_boolean_text(series)? {
        return Ok(flags);
    }

    let trimmed: StringChunked = series
        .str()?
        .into_iter()
        .map(|entry| entry.map(str::trim).filter(|text| !text.is_empty()))
        .collect();
    Ok(trimmed.with_name(series.name().clone()).into_series())
}

/// `Some(series)` when every non-blank entry parses as a finite number
fn parse_numeric_text(series: &Series) -> Result<Option<Series>> {
    let ca = series.str()?;
    let mut values = Vec::with_capacity(ca.len());

    for entry in ca.into_iter() {
        match entry.map(str::trim) {
            None | Some("") => values.push(None),
            Some(text) => match text.parse::<f64>() {
                Ok(v) if v.is_finite() => values.push(Some(v)),
                _ => return Ok(None),
            },
        }
    }

    let parsed: Float64Chunked = values.into_iter().collect();
    Ok(Some(parsed.with_name(series.name().clone()).into_series()))
}

/// `Some(series)` when every non-blank entry is `true` or `false`, in any case
fn parse_boolean_text(series: &Series) -> Result<Option<Series>> {
    let ca = series.str()?;
    let mut values = Vec::with_capacity(ca.len());

    for entry in ca.into_iter() {
        match entry.map(str::trim) {
            None | Some("") => values.push(None),
            Some(text) if text.eq_ignore_ascii_case("true") => values.push(Some(true)),
            Some(text) if text.eq_ignore_ascii_case("false") => values.push(Some(false)),
            Some(_) => return Ok(None),
        }
    }

    let parsed: BooleanChunked = values.into_iter().collect();
    Ok(Some(parsed.with_name(series.name().clone()).into_series()))
}

fn nan_to_null(series: &Series) -> Result<Series> {
    let cast = series.cast(&DataType::Float64)?;
    let cleaned: Float64Chunked = cast
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect();
    Ok(cleaned.with_name(series.name().clone()).into_series())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(FileFormat::from_filename("data.CSV"), Some(FileFormat::Csv));
        assert_eq!(FileFormat::from_filename("book.xlsx"), Some(FileFormat::Excel));
        assert_eq!(FileFormat::from_filename("book.xls"), Some(FileFormat::Excel));
        assert_eq!(FileFormat::from_filename("data.json"), None);
        assert_eq!(FileFormat::from_filename("csv"), None);
    }

    #[test]
    fn test_load_csv() {
        let csv = b"a,b,label\n1,2.5,x\n3,4.5,y\n";
        let df = DataLoader::new().load_bytes(csv, "d.csv").unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 3);
        assert_eq!(df.column("label").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_padded_numbers_become_numeric() {
        let csv = b"a, b\n1, 5.1\n2, 6.2\n";
        let df = DataLoader::new().load_bytes(csv, "d.csv").unwrap();
        let b = df.column("b").unwrap();
        assert_eq!(b.dtype(), &DataType::Float64);
        assert_eq!(b.get(0).unwrap(), AnyValue::Float64(5.1));
    }

    #[test]
    fn test_mixed_text_column_left_as_text() {
        let csv = b"a,b\n1,5\n2,five\n";
        let df = DataLoader::new().load_bytes(csv, "d.csv").unwrap();
        assert_eq!(df.column("b").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_missing_cells_are_null() {
        let csv = b"a,b\n1,\n,2\n3,4\n";
        let df = DataLoader::new().load_bytes(csv, "d.csv").unwrap();
        assert_eq!(df.column("a").unwrap().null_count(), 1);
        assert_eq!(df.column("b").unwrap().null_count(), 1);
    }

    #[test]
    fn test_late_text_cell_keeps_column_as_text() {
        let mut csv = String::from("a,b\n");
        for i in 0..1200 {
            let b = if i == 1100 { "n/a".to_string() } else { i.to_string() };
            csv.push_str(&format!("{},{}\n", i, b));
        }
        let df = DataLoader::new().load_bytes(csv.as_bytes(), "late.csv").unwrap();
        assert_eq!(df.height(), 1200);
        assert_eq!(df.column("a").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("b").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("b").unwrap().get(1100).unwrap(), AnyValue::String("n/a"));
    }

    #[test]
    fn test_late_decimal_still_numeric() {
        let mut csv = String::from("a\n");
        for i in 0..1500 {
            csv.push_str(&format!("{}\n", i));
        }
        csv.push_str("0.5\n");
        let df = DataLoader::new().load_bytes(csv.as_bytes(), "d.csv").unwrap();
        let a = df.column("a").unwrap();
        assert_eq!(a.dtype(), &DataType::Float64);
        assert_eq!(a.get(1500).unwrap(), AnyValue::Float64(0.5));
    }

    #[test]
    fn test_padded_text_cells_are_trimmed() {
        let csv = b"a, label\n1, x\n2,x\n3, y \n4,   \n";
        let df = DataLoader::new().load_bytes(csv, "d.csv").unwrap();
        let label = df.column("label").unwrap();
        assert_eq!(label.dtype(), &DataType::String);
        assert_eq!(label.get(0).unwrap(), AnyValue::String("x"));
        assert_eq!(label.get(2).unwrap(), AnyValue::String("y"));
        assert_eq!(label.null_count(), 1);
        assert_eq!(label.as_materialized_series().n_unique().unwrap(), 3);
    }

    #[test]
    fn test_boolean_text_column() {
        let csv = b"flag,label\nTrue,x\nfalse,y\n,x\n";
        let df = DataLoader::new().load_bytes(csv, "d.csv").unwrap();
        let flag = df.column("flag").unwrap();
        assert_eq!(flag.dtype(), &DataType::Boolean);
        assert_eq!(flag.get(0).unwrap(), AnyValue::Boolean(true));
        assert_eq!(flag.null_count(), 1);
    }

    #[test]
    fn test_load_xlsx_workbook() {
        use rust_xlsxwriter::Workbook;

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        // header: "a", blank, "label"
        sheet.write_string(0, 0, "a").unwrap();
        sheet.write_string(0, 2, " label ").unwrap();
        sheet.write_number(1, 0, 1.0).unwrap();
        sheet.write_number(1, 1, 10.0).unwrap();
        sheet.write_string(1, 2, "x").unwrap();
        // row 2 left fully empty
        sheet.write_number(3, 0, 2.5).unwrap();
        sheet.write_string(3, 2, "y").unwrap();
        sheet.write_number(4, 0, 3.0).unwrap();
        sheet.write_number(4, 1, 30.0).unwrap();
        sheet.write_string(4, 2, "x").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let df = DataLoader::new().load_bytes(&bytes, "book.xlsx").unwrap();
        assert_eq!(df.height(), 3);
        assert_eq!(
            df.get_column_names().iter().map(|n| n.as_str()).collect::<Vec<_>>(),
            vec!["a", "Unnamed: 1", "label"]
        );
        assert_eq!(df.column("a").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("a").unwrap().get(1).unwrap(), AnyValue::Float64(2.5));
        assert_eq!(df.column("Unnamed: 1").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("Unnamed: 1").unwrap().null_count(), 1);
        assert_eq!(df.column("label").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("label").unwrap().get(1).unwrap(), AnyValue::String("y"));
    }

    #[test]
    fn test_unsupported_format() {
        let err = DataLoader::new().load_bytes(b"a\n1\n", "d.txt").unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_empty_inputs() {
        let err = DataLoader::new().load_bytes(b"", "d.csv").unwrap_err();
        assert!(matches!(err, PipelineError::EmptyDataset));

        let err = DataLoader::new().load_bytes(b"a,b\n", "d.csv").unwrap_err();
        assert!(matches!(err, PipelineError::EmptyDataset));
    }

    #[test]
    fn test_garbage_spreadsheet_is_processing_error() {
        let err = DataLoader::new().load_bytes(b"not a workbook", "d.xlsx").unwrap_err();
        assert!(err.is_internal());
    }
}
