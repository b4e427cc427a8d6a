//! Domain types for pluvio-io.

use crate::IoError;

/// A validated experiment name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Parse and validate an experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidExperimentName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, IoError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(IoError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    /// Return the experiment name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Daily weather observations keyed by date.
///
/// Produced by [`WeatherReader`](crate::WeatherReader). Row keys, column
/// names, and cells are stored in parallel: `cells[row][col]` is the value
/// of `columns[col]` on `row_keys[row]`. A `None` cell is missing.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherTable {
    row_keys: Vec<String>,
    columns: Vec<String>,
    cells: Vec<Vec<Option<f64>>>,
}

impl WeatherTable {
    pub(crate) fn new(
        row_keys: Vec<String>,
        columns: Vec<String>,
        cells: Vec<Vec<Option<f64>>>,
    ) -> Self {
        debug_assert_eq!(row_keys.len(), cells.len());
        Self {
            row_keys,
            columns,
            cells,
        }
    }

    /// Return the row keys (dates) in file order.
    #[must_use]
    pub fn row_keys(&self) -> &[String] {
        &self.row_keys
    }

    /// Return the numeric column names in file order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Return the cells, row-major.
    #[must_use]
    pub fn cells(&self) -> &[Vec<Option<f64>>] {
        &self.cells
    }

    /// Return the number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.row_keys.len()
    }

    /// Return the number of numeric columns.
    #[must_use]
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Return the position of `name` among the numeric columns.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Count the missing cells in column `col`.
    #[must_use]
    pub fn missing_in(&self, col: usize) -> usize {
        self.cells.iter().filter(|row| row[col].is_none()).count()
    }

    pub(crate) fn columns_mut(&mut self) -> &mut Vec<String> {
        &mut self.columns
    }

    pub(crate) fn cells_mut(&mut self) -> &mut Vec<Vec<Option<f64>>> {
        &mut self.cells
    }
}

/// A projection of a [`WeatherTable`] onto an ordered set of feature columns.
///
/// Produced by [`WeatherTable::select_features`]. Cells may still be
/// missing; `Vec<Option<f64>>` rows can be handed directly to the predictor.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    row_keys: Vec<String>,
    names: Vec<String>,
    rows: Vec<Vec<Option<f64>>>,
}

impl FeatureFrame {
    pub(crate) fn new(
        row_keys: Vec<String>,
        names: Vec<String>,
        rows: Vec<Vec<Option<f64>>>,
    ) -> Self {
        Self {
            row_keys,
            names,
            rows,
        }
    }

    /// Return the row keys in table order.
    #[must_use]
    pub fn row_keys(&self) -> &[String] {
        &self.row_keys
    }

    /// Return the selected feature names in selection order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Return the rows, possibly with missing cells.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Option<f64>>] {
        &self.rows
    }

    /// Return the number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Return the rows as a dense matrix.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::MissingValue`] naming the first missing cell.
    pub fn complete_rows(&self) -> Result<Vec<Vec<f64>>, IoError> {
        self.rows
            .iter()
            .zip(&self.row_keys)
            .map(|(row, key)| {
                row.iter()
                    .zip(&self.names)
                    .map(|(cell, name)| {
                        cell.ok_or_else(|| IoError::MissingValue {
                            row_key: key.clone(),
                            column: name.clone(),
                        })
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn experiment_name_valid() {
        let name = ExperimentName::new("gorontalo-2024_01".to_string());
        assert!(name.is_ok());
        assert_eq!(name.unwrap().as_str(), "gorontalo-2024_01");
    }

    #[test]
    fn experiment_name_rejects_empty() {
        let name = ExperimentName::new(String::new());
        assert!(matches!(name, Err(IoError::InvalidExperimentName { .. })));
    }

    #[test]
    fn experiment_name_rejects_special_chars() {
        let name = ExperimentName::new("rain run!".to_string());
        assert!(matches!(name, Err(IoError::InvalidExperimentName { .. })));
    }

    #[test]
    fn table_lookup_and_missing_count() {
        let table = WeatherTable::new(
            vec!["2024-01-01".into(), "2024-01-02".into()],
            vec!["tavg".into(), "prcp".into()],
            vec![vec![Some(27.1), None], vec![Some(26.4), Some(3.2)]],
        );
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.n_columns(), 2);
        assert_eq!(table.column_index("prcp"), Some(1));
        assert_eq!(table.column_index("snow"), None);
        assert_eq!(table.missing_in(0), 0);
        assert_eq!(table.missing_in(1), 1);
    }

    #[test]
    fn complete_rows_reports_first_gap() {
        let frame = FeatureFrame::new(
            vec!["d1".into(), "d2".into()],
            vec!["tavg".into(), "pres".into()],
            vec![vec![Some(27.0), Some(1009.0)], vec![Some(26.0), None]],
        );
        let err = frame.complete_rows().unwrap_err();
        assert!(
            matches!(err, IoError::MissingValue { ref row_key, ref column } if row_key == "d2" && column == "pres")
        );

        let dense = FeatureFrame::new(
            vec!["d1".into()],
            vec!["tavg".into()],
            vec![vec![Some(27.0)]],
        );
        assert_eq!(dense.complete_rows().unwrap(), vec![vec![27.0]]);
    }
}
