//! Dataset loading.
//!
//! CSV files go through the Polars lazy reader with schema inference;
//! Excel files go through calamine, first sheet only, first row as headers,
//! with per-column numeric/boolean/text inference.

use crate::error::{AssistantError, Result};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::path::Path;
use tracing::info;

/// The in-memory table the session chats about.
///
/// Immutable once loaded; replaced wholesale when the user loads another file.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub name: String,
    pub frame: DataFrame,
}

impl Dataset {
    pub fn from_frame(name: impl Into<String>, frame: DataFrame) -> Self {
        Self {
            name: name.into(),
            frame,
        }
    }

    /// Load a dataset from a CSV or Excel file.
    pub fn load(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("dataset")
            .to_string();

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let frame = match extension.as_str() {
            "csv" => read_csv(path)?,
            "xlsx" | "xls" | "xlsb" | "ods" => read_excel(path)?,
            other => {
                return Err(AssistantError::Dataset(format!(
                    "Unsupported file type '{}' (expected csv, xlsx or xls)",
                    other
                )))
            }
        };

        info!(
            "Loaded '{}': {} rows, {} columns",
            name,
            frame.height(),
            frame.width()
        );

        Ok(Self { name, frame })
    }

    pub fn row_count(&self) -> usize {
        self.frame.height()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

fn read_csv(path: &Path) -> Result<DataFrame> {
    LazyCsvReader::new(path)
        .with_try_parse_dates(true)
        .with_infer_schema_length(Some(1000))
        .finish()
        .map_err(|e| AssistantError::Dataset(format!("Failed to read CSV: {}", e)))?
        .collect()
        .map_err(|e| AssistantError::Dataset(format!("Failed to collect CSV: {}", e)))
}

fn read_excel(path: &Path) -> Result<DataFrame> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| AssistantError::Dataset(format!("Failed to open Excel file: {}", e)))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let first = sheet_names
        .first()
        .cloned()
        .ok_or_else(|| AssistantError::Dataset("Excel file contains no sheets".to_string()))?;

    let range = workbook
        .worksheet_range(&first)
        .map_err(|e| AssistantError::Dataset(format!("Failed to read sheet '{}': {}", first, e)))?;

    range_to_frame(&range)
}

fn range_to_frame(range: &calamine::Range<Data>) -> Result<DataFrame> {
    let (height, width) = range.get_size();
    if height == 0 || width == 0 {
        return Err(AssistantError::Dataset("Sheet is empty".to_string()));
    }

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|header_row| {
            header_row
                .iter()
                .enumerate()
                .map(|(idx, cell)| match cell {
                    Data::String(s) if !s.trim().is_empty() => s.trim().to_string(),
                    Data::Empty => format!("column_{}", idx + 1),
                    other => other.to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    let body: Vec<&[Data]> = rows.collect();

    let mut columns = Vec::with_capacity(width);
    for (idx, header) in headers.iter().enumerate() {
        columns.push(column_series(header, idx, &body));
    }

    DataFrame::new(columns).map_err(Into::into)
}

static EMPTY_CELL: Data = Data::Empty;

/// Build one column, inferring numeric/boolean/text from the cells present.
fn column_series(name: &str, idx: usize, rows: &[&[Data]]) -> Series {
    let cells: Vec<&Data> = rows
        .iter()
        .map(|row| row.get(idx).unwrap_or(&EMPTY_CELL))
        .collect();

    let has_values = cells.iter().any(|c| !matches!(c, Data::Empty));
    let all_numeric = cells
        .iter()
        .all(|c| matches!(c, Data::Empty | Data::Float(_) | Data::Int(_)));
    let all_boolean = cells.iter().all(|c| matches!(c, Data::Empty | Data::Bool(_)));
    let all_temporal = cells
        .iter()
        .all(|c| matches!(c, Data::Empty | Data::DateTime(_) | Data::DateTimeIso(_)));

    if has_values && all_numeric {
        let values: Vec<Option<f64>> = cells
            .iter()
            .map(|c| match c {
                Data::Float(f) => Some(*f),
                Data::Int(i) => Some(*i as f64),
                _ => None,
            })
            .collect();
        Series::new(name, values)
    } else if has_values && all_boolean {
        let values: Vec<Option<bool>> = cells
            .iter()
            .map(|c| match c {
                Data::Bool(b) => Some(*b),
                _ => None,
            })
            .collect();
        Series::new(name, values)
    } else if has_values && all_temporal {
        let values: Vec<Option<NaiveDateTime>> = cells
            .iter()
            .map(|c| match c {
                Data::DateTime(dt) => dt.as_datetime(),
                Data::DateTimeIso(s) => parse_iso_datetime(s),
                _ => None,
            })
            .collect();
        Series::new(name, values)
    } else {
        let values: Vec<Option<String>> = cells
            .iter()
            .map(|c| match c {
                Data::Empty => None,
                Data::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            })
            .collect();
        Series::new(name, values)
    }
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
