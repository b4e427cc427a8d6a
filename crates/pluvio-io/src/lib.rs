//! Weather data preparation and artifact output for the pluvio pipeline.
//!
//! Reads daily weather CSVs, cleans and imputes them, derives rain labels,
//! partitions rows for training and evaluation, and writes tree, metric,
//! prediction and diagram artifacts.

mod clean;
mod domain;
mod dot;
mod error;
mod reader;
mod split;
mod writer;

pub use clean::{CleanReport, ColumnImputation};
pub use domain::{ExperimentName, FeatureFrame, WeatherTable};
pub use dot::{DEFAULT_CLASS_NAMES, Dot};
pub use error::IoError;
pub use reader::{DEFAULT_KEY_COLUMN, WeatherReader};
pub use split::{TrainTestSplit, stratified_split};
pub use writer::{ArtifactWriter, EvaluationSummary};
