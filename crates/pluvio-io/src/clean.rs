//! Column cleaning, median imputation, label derivation, and feature projection.

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::IoError;
use crate::domain::{FeatureFrame, WeatherTable};

/// What [`WeatherTable::clean`] changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanReport {
    /// Columns removed because every cell was missing, in file order.
    pub dropped_columns: Vec<String>,
    /// Columns that had gaps filled, in file order.
    pub imputed: Vec<ColumnImputation>,
}

/// Median fill applied to one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnImputation {
    /// Column name.
    pub column: String,
    /// Median of the observed values.
    pub median: f64,
    /// Number of cells filled.
    pub n_filled: usize,
}

impl WeatherTable {
    /// Drop columns missing in every row, then fill each remaining gap with
    /// its column's median.
    ///
    /// After this call no cell is missing.
    #[instrument(skip(self), fields(n_rows = self.n_rows(), n_columns = self.n_columns()))]
    pub fn clean(&mut self) -> CleanReport {
        let n_rows = self.n_rows();
        let keep: Vec<bool> = (0..self.n_columns())
            .map(|col| self.missing_in(col) < n_rows)
            .collect();

        let mut dropped_columns = Vec::new();
        let mut kept_columns = Vec::new();
        for (name, &k) in self.columns_mut().drain(..).zip(&keep) {
            if k {
                kept_columns.push(name);
            } else {
                dropped_columns.push(name);
            }
        }
        *self.columns_mut() = kept_columns;

        for row in self.cells_mut() {
            let mut flags = keep.iter();
            row.retain(|_| flags.next().copied().unwrap_or(false));
        }
        if !dropped_columns.is_empty() {
            debug!(?dropped_columns, "dropped all-missing columns");
        }

        let mut imputed = Vec::new();
        for col in 0..self.n_columns() {
            let n_filled = self.missing_in(col);
            if n_filled == 0 {
                continue;
            }
            let mut observed: Vec<f64> = self.cells().iter().filter_map(|row| row[col]).collect();
            // Dropping all-missing columns leaves at least one observed value.
            let Some(median) = median(&mut observed) else {
                continue;
            };
            for row in self.cells_mut() {
                row[col].get_or_insert(median);
            }
            imputed.push(ColumnImputation {
                column: self.columns()[col].clone(),
                median,
                n_filled,
            });
        }

        info!(
            n_dropped = dropped_columns.len(),
            n_imputed_columns = imputed.len(),
            "table cleaned"
        );
        CleanReport {
            dropped_columns,
            imputed,
        }
    }

    /// Derive binary rain labels from `source`: 1 when the value is above
    /// zero, else 0.
    ///
    /// Call after [`clean`](Self::clean) so every row has a value.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::UnknownColumn`] | `source` is not a column |
    /// | [`IoError::MissingValue`] | a row has no value in `source` |
    pub fn rain_labels(&self, source: &str) -> Result<Vec<u8>, IoError> {
        let col = self
            .column_index(source)
            .ok_or_else(|| IoError::UnknownColumn {
                column: source.to_string(),
            })?;
        let labels = self
            .cells()
            .iter()
            .zip(self.row_keys())
            .map(|(row, key)| match row[col] {
                Some(v) => Ok(u8::from(v > 0.0)),
                None => Err(IoError::MissingValue {
                    row_key: key.clone(),
                    column: source.to_string(),
                }),
            })
            .collect::<Result<Vec<u8>, IoError>>()?;

        let n_rain = labels.iter().filter(|&&l| l == 1).count();
        debug!(source, n_rain, n_dry = labels.len() - n_rain, "rain labels derived");
        Ok(labels)
    }

    /// Project the table onto `names`, in the given order.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::UnknownColumn`] | a name is not a column |
    /// | [`IoError::RepeatedSelection`] | a name is requested twice |
    pub fn select_features<S: AsRef<str>>(&self, names: &[S]) -> Result<FeatureFrame, IoError> {
        let indices = self.resolve(names)?;
        if let Some(pos) = indices.iter().position(Option::is_none) {
            return Err(IoError::UnknownColumn {
                column: names[pos].as_ref().to_string(),
            });
        }
        Ok(self.project(names, &indices))
    }

    /// Project the table onto `names` like [`select_features`](Self::select_features),
    /// but treat a name with no column as missing in every row.
    ///
    /// Prediction uses this so an absent column fails only the rows whose
    /// path tests it.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::RepeatedSelection`] if a name is requested twice.
    pub fn project_features<S: AsRef<str>>(&self, names: &[S]) -> Result<FeatureFrame, IoError> {
        let indices = self.resolve(names)?;
        let absent: Vec<&str> = names
            .iter()
            .zip(&indices)
            .filter(|(_, col)| col.is_none())
            .map(|(name, _)| name.as_ref())
            .collect();
        if !absent.is_empty() {
            warn!(?absent, "feature columns absent, treating as missing");
        }
        Ok(self.project(names, &indices))
    }

    /// Column index for each name, `None` where the table has no such column.
    fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Option<usize>>, IoError> {
        for (i, name) in names.iter().enumerate() {
            if names[..i].iter().any(|prev| prev.as_ref() == name.as_ref()) {
                return Err(IoError::RepeatedSelection {
                    column: name.as_ref().to_string(),
                });
            }
        }
        Ok(names
            .iter()
            .map(|name| self.column_index(name.as_ref()))
            .collect())
    }

    fn project<S: AsRef<str>>(&self, names: &[S], indices: &[Option<usize>]) -> FeatureFrame {
        let rows = self
            .cells()
            .iter()
            .map(|row| indices.iter().map(|col| col.and_then(|c| row[c])).collect())
            .collect();
        let names = names.iter().map(|n| n.as_ref().to_string()).collect();
        FeatureFrame::new(self.row_keys().to_vec(), names, rows)
    }
}

/// Median of `values`: the middle value, or the mean of the two middle
/// values for an even count. `None` when empty.
fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> WeatherTable {
        WeatherTable::new(
            vec!["d1".into(), "d2".into(), "d3".into(), "d4".into()],
            vec!["tavg".into(), "snow".into(), "prcp".into(), "pres".into()],
            vec![
                vec![Some(27.0), None, Some(0.0), Some(1010.0)],
                vec![None, None, Some(4.2), Some(1006.0)],
                vec![Some(25.0), None, None, Some(1008.0)],
                vec![Some(29.0), None, Some(0.0), None],
            ],
        )
    }

    #[test]
    fn median_odd_and_even() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&mut []), None);
    }

    #[test]
    fn clean_drops_all_missing_columns() {
        let mut t = table();
        let report = t.clean();
        assert_eq!(report.dropped_columns, vec!["snow".to_string()]);
        assert_eq!(t.columns(), &["tavg", "prcp", "pres"]);
        assert!(t.cells().iter().all(|row| row.len() == 3));
    }

    #[test]
    fn clean_fills_gaps_with_medians() {
        let mut t = table();
        let report = t.clean();
        assert!(t.cells().iter().flatten().all(Option::is_some));

        // tavg observed [27, 25, 29] -> 27; prcp [0, 4.2, 0] -> 0; pres [1010, 1006, 1008] -> 1008.
        assert_eq!(t.cells()[1][0], Some(27.0));
        assert_eq!(t.cells()[2][1], Some(0.0));
        assert_eq!(t.cells()[3][2], Some(1008.0));

        let columns: Vec<&str> = report.imputed.iter().map(|i| i.column.as_str()).collect();
        assert_eq!(columns, vec!["tavg", "prcp", "pres"]);
        assert!(report.imputed.iter().all(|i| i.n_filled == 1));
    }

    #[test]
    fn clean_leaves_observed_values_untouched() {
        let mut t = table();
        t.clean();
        assert_eq!(t.cells()[0], vec![Some(27.0), Some(0.0), Some(1010.0)]);
    }

    #[test]
    fn rain_labels_after_clean() {
        let mut t = table();
        t.clean();
        assert_eq!(t.rain_labels("prcp").unwrap(), vec![0, 1, 0, 0]);
    }

    #[test]
    fn rain_labels_before_clean_reports_gap() {
        let err = table().rain_labels("prcp").unwrap_err();
        assert!(matches!(err, IoError::MissingValue { row_key, .. } if row_key == "d3"));
    }

    #[test]
    fn rain_labels_unknown_column() {
        let err = table().rain_labels("rain_mm").unwrap_err();
        assert!(matches!(err, IoError::UnknownColumn { .. }));
    }

    #[test]
    fn select_features_projects_in_requested_order() {
        let frame = table().select_features(&["pres", "tavg"]).unwrap();
        assert_eq!(frame.names(), &["pres", "tavg"]);
        assert_eq!(frame.rows()[0], vec![Some(1010.0), Some(27.0)]);
        assert_eq!(frame.rows()[3], vec![None, Some(29.0)]);
        assert_eq!(frame.row_keys().len(), 4);
    }

    #[test]
    fn select_features_errors() {
        let t = table();
        assert!(matches!(
            t.select_features(&["wspd"]).unwrap_err(),
            IoError::UnknownColumn { .. }
        ));
        assert!(matches!(
            t.select_features(&["tavg", "tavg"]).unwrap_err(),
            IoError::RepeatedSelection { .. }
        ));
    }

    #[test]
    fn project_features_fills_absent_columns_with_gaps() {
        let frame = table().project_features(&["wspd", "pres"]).unwrap();
        assert_eq!(frame.names(), &["wspd", "pres"]);
        assert_eq!(frame.rows()[0], vec![None, Some(1010.0)]);
        assert!(frame.rows().iter().all(|row| row[0].is_none()));
        assert!(matches!(
            table().project_features(&["pres", "pres"]).unwrap_err(),
            IoError::RepeatedSelection { .. }
        ));
    }
}
