//! Order-preserving CSV table.
//!
//! The library CSV is edited in place by column name, so this wraps the
//! `csv` crate with a header index and string cells. Column order is kept
//! exactly as read; new columns are appended at the end.

use std::path::Path;

use crate::errors::CsvError;

/// Cell values that count as blank.
///
/// The library CSV has passed through spreadsheet exports that wrote
/// literal `nan` / `none` / `null` strings into empty cells.
pub fn is_blank(val: &str) -> bool {
    let s = val.trim();
    s.is_empty() || matches!(s.to_ascii_lowercase().as_str(), "nan" | "none" | "null")
}

/// A CSV file held in memory as headers plus string rows.
#[derive(Debug, Clone, Default)]
pub struct CsvTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Read a table from disk. Short rows are padded to the header width.
    pub fn read(path: &Path) -> Result<Self, CsvError> {
        if !path.exists() {
            return Err(CsvError::FileNotFound(path.display().to_string()));
        }
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(|c| c.to_string()).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }
        Ok(Self { headers, rows })
    }

    /// Write the table to disk.
    pub fn write(&self, path: &Path) -> Result<(), CsvError> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.col_index(name).is_some()
    }

    fn col_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell value, or `None` if the column does not exist.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.col_index(column)?;
        self.rows.get(row).map(|r| r[col].as_str())
    }

    /// Set a cell. Silently ignored when the column does not exist, so the
    /// enrichment passes can target optional columns without checking first.
    pub fn set(&mut self, row: usize, column: &str, value: impl Into<String>) {
        if let Some(col) = self.col_index(column) {
            if let Some(r) = self.rows.get_mut(row) {
                r[col] = value.into();
            }
        }
    }

    /// Append a column with blank cells if it is not already present.
    pub fn ensure_column(&mut self, name: &str) {
        if self.has_column(name) {
            return;
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
    }

    /// Append a data row, padded or truncated to the header width.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }
}
