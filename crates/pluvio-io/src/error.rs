//! I/O error types for pluvio-io.

use std::path::PathBuf;

/// Errors from weather CSV reading, cleaning, partitioning, and artifact writing.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when the CSV file contains a header but zero data rows.
    #[error("empty dataset (no data rows) in {path}")]
    EmptyDataset {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Returned when the header lacks the row-key column.
    #[error("missing key column \"{column}\" in {path}")]
    MissingKeyColumn {
        /// Path to the CSV file.
        path: PathBuf,
        /// Expected key column name.
        column: String,
    },

    /// Returned when a header names the same column twice.
    #[error("duplicate column \"{column}\" in {path}")]
    DuplicateColumn {
        /// Path to the CSV file.
        path: PathBuf,
        /// The repeated column name.
        column: String,
    },

    /// Returned when a data row has a different number of columns than the header.
    #[error("inconsistent row length in {path}: row {row_index} ({row_key}) has {got} columns, expected {expected}")]
    InconsistentRowLength {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Key of the offending row.
        row_key: String,
        /// Expected number of columns (from header).
        expected: usize,
        /// Actual number of columns in this row.
        got: usize,
    },

    /// Returned when a requested column is not present in the table.
    #[error("unknown column \"{column}\"")]
    UnknownColumn {
        /// The requested column name.
        column: String,
    },

    /// Returned when a feature projection names the same column twice.
    #[error("column \"{column}\" selected more than once")]
    RepeatedSelection {
        /// The repeated column name.
        column: String,
    },

    /// Returned when a complete row is required but a cell is missing.
    #[error("row {row_key} has no value for column \"{column}\"")]
    MissingValue {
        /// Key of the offending row.
        row_key: String,
        /// Column lacking a value.
        column: String,
    },

    /// Returned when the test fraction is outside the open interval (0, 1).
    #[error("test fraction must lie strictly between 0 and 1, got {test_fraction}")]
    InvalidTestFraction {
        /// The rejected fraction.
        test_fraction: f64,
    },

    /// Returned when a train/test partition would leave one side empty.
    #[error("{partition} partition is empty ({n_rows} rows, test fraction {test_fraction})")]
    EmptyPartition {
        /// `"train"` or `"test"`.
        partition: &'static str,
        /// Number of rows being partitioned.
        n_rows: usize,
        /// Requested test fraction.
        test_fraction: f64,
    },

    /// Returned when the experiment name contains characters outside `[a-zA-Z0-9_-]`.
    #[error("invalid experiment name \"{name}\": must match [a-zA-Z0-9_-]+")]
    InvalidExperimentName {
        /// The invalid name.
        name: String,
    },

    /// Returned when the output directory cannot be created.
    #[error("cannot create output directory {path}")]
    OutputDirCreate {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when an artifact cannot be encoded as JSON.
    #[error("cannot encode artifact {path}")]
    EncodeArtifact {
        /// Artifact destination.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// Returned when the tree artifact cannot be produced.
    #[error("cannot write tree artifact {path}")]
    TreeArtifact {
        /// Artifact destination.
        path: PathBuf,
        /// Underlying tree error.
        source: pluvio_tree::TreeError,
    },

    /// Returned when a result file cannot be written.
    #[error("cannot write file {path}")]
    WriteFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
