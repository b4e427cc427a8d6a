use std::path::PathBuf;

/// Errors from decision tree training, prediction, and serialization.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// Returned when the feature matrix or label vector has zero rows.
    #[error("training dataset has zero samples")]
    EmptyDataset,

    /// Returned when the label vector length differs from the number of rows.
    #[error("got {n_labels} labels for {n_samples} samples")]
    LabelCountMismatch {
        /// Number of feature rows.
        n_samples: usize,
        /// Number of labels.
        n_labels: usize,
    },

    /// Returned when a row has a different number of features than the schema.
    #[error("sample {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the sample.
        got: usize,
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when a training label is outside {0, 1}.
    #[error("label {value} at sample {sample_index} is not binary (expected 0 or 1)")]
    InvalidLabel {
        /// The offending raw label value.
        value: u8,
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when a raw value outside {0, 1} is converted to a label.
    #[error("label {value} is not binary (expected 0 or 1)")]
    NonBinaryLabel {
        /// The offending raw label value.
        value: u8,
    },

    /// Returned when a training value is NaN or infinite.
    #[error("non-finite value at sample {sample_index}, feature {feature}")]
    NonFiniteValue {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// Name of the offending feature column.
        feature: String,
    },

    /// Returned when the schema declares a different number of names than the data has columns.
    #[error("schema declares {n_names} feature names for {n_features} feature columns")]
    FeatureNameCountMismatch {
        /// Number of names in the schema.
        n_names: usize,
        /// Number of feature columns in the data.
        n_features: usize,
    },

    /// Returned when the same feature name is declared twice.
    #[error("duplicate feature name \"{name}\"")]
    DuplicateFeatureName {
        /// The duplicated name.
        name: String,
    },

    /// Returned when min_samples_split is zero.
    #[error("min_samples_split must be at least 1, got {min_samples_split}")]
    InvalidMinSamplesSplit {
        /// The invalid min_samples_split value provided.
        min_samples_split: usize,
    },

    /// Returned when min_gain is negative or not finite.
    #[error("min_gain must be finite and non-negative, got {min_gain}")]
    InvalidMinGain {
        /// The invalid min_gain value provided.
        min_gain: f64,
    },

    /// Returned when a row lacks a value for a feature tested on its path.
    #[error("row has no value for feature \"{feature}\"")]
    MissingFeature {
        /// Name of the feature the decision node needed.
        feature: String,
    },

    /// Returned when a portable tree references a feature the schema does not declare.
    #[error("portable tree references unknown feature \"{feature}\"")]
    UnknownFeature {
        /// The unresolved feature name.
        feature: String,
    },

    /// Returned when a portable node holds a value the tree cannot represent.
    #[error("invalid portable node: {reason}")]
    InvalidPortableNode {
        /// Human-readable description of the problem.
        reason: String,
    },

    /// Returned when encoding the portable tree as JSON fails.
    #[error("failed to serialize tree")]
    SerializeTree {
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// Returned when decoding a portable tree from JSON fails.
    #[error("failed to deserialize tree from {path}")]
    DeserializeTree {
        /// Path to the tree file that could not be decoded.
        path: PathBuf,
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// Returned when writing the tree file fails.
    #[error("failed to write tree to {path}")]
    WriteTree {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when reading the tree file fails.
    #[error("failed to read tree from {path}")]
    ReadTree {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
