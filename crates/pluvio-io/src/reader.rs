//! CSV reader for daily weather observations.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::WeatherTable;

/// Default name of the row-key column.
pub const DEFAULT_KEY_COLUMN: &str = "date";

/// Reads a weather CSV into a [`WeatherTable`].
///
/// Expected CSV format:
/// - Header row required; one column (default `date`) holds the row key,
///   every other column is numeric
/// - `date,tavg,tmin,tmax,prcp,...`
/// - Empty cells, `NaN`/`nan`, infinities, and text that does not parse as a
///   float are read as missing rather than rejected
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::MissingKeyColumn`] | Header lacks the key column |
/// | [`IoError::DuplicateColumn`] | Header names a column twice |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
pub struct WeatherReader {
    path: PathBuf,
    key_column: String,
}

impl WeatherReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            key_column: DEFAULT_KEY_COLUMN.to_string(),
        }
    }

    /// Use `column` as the row key instead of `date`.
    #[must_use]
    pub fn with_key_column(mut self, column: impl Into<String>) -> Self {
        self.key_column = column.into();
        self
    }

    /// Read the CSV file, returning a [`WeatherTable`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<WeatherTable, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) so that our own InconsistentRowLength check fires
        // instead of a low-level CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?.clone();
        let expected_cols = header.len();

        let mut seen = HashSet::with_capacity(expected_cols);
        for name in &header {
            if !seen.insert(name) {
                return Err(IoError::DuplicateColumn {
                    path: self.path.clone(),
                    column: name.to_string(),
                });
            }
        }

        let key_col = header
            .iter()
            .position(|name| name == self.key_column)
            .ok_or_else(|| IoError::MissingKeyColumn {
                path: self.path.clone(),
                column: self.key_column.clone(),
            })?;
        let columns: Vec<String> = header
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != key_col)
            .map(|(_, name)| name.to_string())
            .collect();
        debug!(expected_cols, key_col, "read CSV header");

        let mut row_keys = Vec::new();
        let mut cells = Vec::new();
        let mut n_missing = 0usize;

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;
            let row_key = record.get(key_col).unwrap_or("").to_string();

            if record.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    row_key,
                    expected: expected_cols,
                    got: record.len(),
                });
            }

            let row: Vec<Option<f64>> = record
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != key_col)
                .map(|(_, raw)| parse_cell(raw))
                .collect();
            n_missing += row.iter().filter(|c| c.is_none()).count();

            row_keys.push(row_key);
            cells.push(row);
        }

        if row_keys.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        info!(
            n_rows = row_keys.len(),
            n_columns = columns.len(),
            n_missing,
            "weather table loaded"
        );

        Ok(WeatherTable::new(row_keys, columns, cells))
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}

/// Parse a numeric cell; anything that is not a finite float is missing.
fn parse_cell(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}
