//! Spreadsheet-driven test data
//!
//! The first row of a sheet names the columns. Every following row that has
//! at least one non-empty cell becomes a [`DataRow`] keyed by those names.

use calamine::{open_workbook_auto, Data, Reader};
use serde_json::{Number, Value as JsonValue};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::DataSourceError;

pub type DataRow = HashMap<String, JsonValue>;

#[derive(Debug, Clone, Default)]
pub struct ExcelDataProvider {
    data_dir: PathBuf,
}

impl ExcelDataProvider {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() || path.exists() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }

    fn read_sheet(&self, path: &Path, sheet: &str) -> Result<(Vec<Option<String>>, Vec<Vec<Data>>), DataSourceError> {
        let path = self.resolve(path);
        if !path.exists() {
            return Err(DataSourceError::NotFound(path.display().to_string()));
        }

        let mut workbook = open_workbook_auto(&path).map_err(|e| {
            log::error!("Error reading Excel file: {}", path.display());
            DataSourceError::FileError(format!("Failed to read Excel file: {}", e))
        })?;

        if !workbook.sheet_names().iter().any(|name| name == sheet) {
            return Err(DataSourceError::SheetNotFound {
                sheet: sheet.to_string(),
                path: path.display().to_string(),
            });
        }

        let range = workbook.worksheet_range(sheet)?;
        let mut rows = range.rows();

        let headers: Vec<Option<String>> = rows
            .next()
            .ok_or_else(|| DataSourceError::MissingHeader(sheet.to_string()))?
            .iter()
            .map(|cell| match cell {
                Data::Empty => None,
                other => Some(other.to_string().trim().to_string()).filter(|h| !h.is_empty()),
            })
            .collect();

        if headers.iter().all(Option::is_none) {
            return Err(DataSourceError::MissingHeader(sheet.to_string()));
        }

        Ok((headers, rows.map(<[Data]>::to_vec).collect()))
    }

    /// One map per data row; blank cells are left out of the map
    pub fn rows(&self, path: impl AsRef<Path>, sheet: &str) -> Result<Vec<DataRow>, DataSourceError> {
        let (headers, raw) = self.read_sheet(path.as_ref(), sheet)?;

        let rows: Vec<DataRow> = raw
            .iter()
            .filter_map(|cells| {
                let row: DataRow = headers
                    .iter()
                    .zip(cells.iter())
                    .filter_map(|(header, cell)| {
                        let header = header.as_ref()?;
                        cell_value(cell).map(|value| (header.clone(), value))
                    })
                    .collect();
                (!row.is_empty()).then_some(row)
            })
            .collect();

        log::info!(
            "Read {} rows of test data from: {}, sheet: {}",
            rows.len(),
            path.as_ref().display(),
            sheet
        );
        Ok(rows)
    }

    /// Rows as positional arguments in header order, blanks as `null`
    pub fn row_args(&self, path: impl AsRef<Path>, sheet: &str) -> Result<Vec<Vec<JsonValue>>, DataSourceError> {
        let (headers, raw) = self.read_sheet(path.as_ref(), sheet)?;

        Ok(raw
            .iter()
            .filter_map(|cells| {
                let args: Vec<JsonValue> = headers
                    .iter()
                    .enumerate()
                    .filter(|(_, header)| header.is_some())
                    .map(|(i, _)| cells.get(i).and_then(cell_value).unwrap_or(JsonValue::Null))
                    .collect();
                args.iter().any(|v| !v.is_null()).then_some(args)
            })
            .collect())
    }

    /// Rows from a JSON file holding an array of objects
    pub fn rows_from_json(&self, path: impl AsRef<Path>) -> Result<Vec<DataRow>, DataSourceError> {
        let path = self.resolve(path.as_ref());
        if !path.exists() {
            return Err(DataSourceError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| DataSourceError::FileError(format!("{}: {}", path.display(), e)))?;
        let value: JsonValue = serde_json::from_str(&content)
            .map_err(|e| DataSourceError::InvalidFormat(format!("{}: {}", path.display(), e)))?;

        let items = match value {
            JsonValue::Array(items) => items,
            _ => {
                return Err(DataSourceError::InvalidFormat(format!(
                    "{}: expected an array of objects",
                    path.display()
                )))
            }
        };

        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                JsonValue::Object(map) => Ok(map.into_iter().collect()),
                other => Err(DataSourceError::InvalidFormat(format!(
                    "{}: item {} is {}, not an object",
                    path.display(),
                    index,
                    other
                ))),
            })
            .collect()
    }

    pub fn filter(rows: &[DataRow], key: &str, value: &JsonValue) -> Vec<DataRow> {
        rows.iter().filter(|row| row.get(key) == Some(value)).cloned().collect()
    }

    pub fn row_by_filter(
        &self,
        path: impl AsRef<Path>,
        sheet: &str,
        key: &str,
        value: &JsonValue,
    ) -> Result<Option<DataRow>, DataSourceError> {
        let rows = self.rows(path, sheet)?;
        Ok(Self::filter(&rows, key, value).into_iter().next())
    }
}

/// Typed cell contents; whole floats become integers
fn cell_value(cell: &Data) -> Option<JsonValue> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => Some(JsonValue::String(s.clone())),
        Data::Bool(b) => Some(JsonValue::Bool(*b)),
        Data::Int(i) => Some(JsonValue::from(*i)),
        Data::Float(f) => {
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                Some(JsonValue::from(*f as i64))
            } else {
                Number::from_f64(*f).map(JsonValue::Number)
            }
        }
        Data::DateTime(dt) => Some(JsonValue::String(dt.to_string())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(JsonValue::String(s.clone())),
    }
}
