//! Artifact writer for trees, evaluations, predictions, and diagrams.

use std::fs;
use std::path::{Path, PathBuf};

use pluvio_tree::{BinaryConfusion, DecisionTree, Label, PortableNode, TreeConfig, TreeError};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::clean::CleanReport;
use crate::domain::ExperimentName;
use crate::dot::Dot;

/// Writes run artifacts into one output directory.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_tree.json`, `{experiment}_tree.dot`,
/// `{experiment}_evaluate.json` and `{experiment}_predict.json`. Each
/// `write_*` method returns the path it wrote.
pub struct ArtifactWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

/// Everything the evaluation artifact reports about a training run.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationSummary<'a> {
    /// The fitted tree.
    pub tree: &'a DecisionTree,
    /// Settings the tree was fitted with.
    pub config: &'a TreeConfig,
    /// Column the rain labels were derived from.
    pub label_column: &'a str,
    /// Share of rows held out.
    pub test_fraction: f64,
    /// Seed of the train/test shuffle.
    pub seed: u64,
    /// Confusion counts on the training rows.
    pub train: &'a BinaryConfusion,
    /// Confusion counts on the held-out rows.
    pub test: &'a BinaryConfusion,
    /// Cleaning applied before labelling, if any.
    pub cleaning: Option<&'a CleanReport>,
}

impl ArtifactWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    fn artifact_path(&self, suffix: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{suffix}", self.experiment.as_str()))
    }

    /// Write the portable tree to `{experiment}_tree.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::TreeArtifact`] if encoding or writing fails.
    #[instrument(skip_all)]
    pub fn write_tree(&self, tree: &DecisionTree) -> Result<PathBuf, IoError> {
        let path = self.artifact_path("tree.json");
        tree.save_json(&path).map_err(|e| IoError::TreeArtifact {
            path: path.clone(),
            source: e,
        })?;
        Ok(path)
    }

    /// Write a Graphviz diagram of `root` to `{experiment}_tree.dot`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_dot(
        &self,
        root: &PortableNode,
        class_names: [&str; 2],
    ) -> Result<PathBuf, IoError> {
        let path = self.artifact_path("tree.dot");
        let text = Dot::new(root, self.experiment.as_str())
            .with_class_names(class_names)
            .to_string();
        write_text(&path, &text)?;
        info!(path = %path.display(), n_leaves = root.n_leaves(), "diagram written");
        Ok(path)
    }

    /// Write evaluation results to `{experiment}_evaluate.json`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::EncodeArtifact`] | JSON encoding failed |
    /// | [`IoError::WriteFile`] | the file cannot be written |
    #[instrument(skip_all)]
    pub fn write_evaluation(&self, summary: &EvaluationSummary<'_>) -> Result<PathBuf, IoError> {
        let path = self.artifact_path("evaluate.json");
        let tree = summary.tree;

        let feature_usage = tree
            .schema()
            .names()
            .iter()
            .zip(tree.feature_usage())
            .map(|(name, n_splits)| FeatureUsageEntry {
                name: name.as_str(),
                n_splits,
            })
            .collect();

        let artifact = EvaluateArtifact {
            experiment: self.experiment.as_str(),
            label_column: summary.label_column,
            features: tree.schema().names(),
            config: ConfigEntry {
                max_depth: summary.config.max_depth(),
                min_samples_split: summary.config.min_samples_split(),
                min_gain: summary.config.min_gain(),
            },
            split: SplitEntry {
                test_fraction: summary.test_fraction,
                seed: summary.seed,
                n_train: summary.train.total(),
                n_test: summary.test.total(),
            },
            tree: ShapeEntry {
                n_nodes: tree.n_nodes(),
                n_leaves: tree.n_leaves(),
                depth: tree.depth(),
                feature_usage,
            },
            train: MetricsEntry::from(summary.train),
            test: MetricsEntry::from(summary.test),
            cleaning: summary.cleaning,
        };

        write_json(&path, &artifact)?;
        info!(path = %path.display(), "evaluation result written");
        Ok(path)
    }

    /// Write per-row predictions to `{experiment}_predict.json`.
    ///
    /// `results[i]` is the outcome for `row_keys[i]`. Failed rows are kept
    /// with their error message and no label.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::EncodeArtifact`] | JSON encoding failed |
    /// | [`IoError::WriteFile`] | the file cannot be written |
    #[instrument(skip_all)]
    pub fn write_predictions(
        &self,
        row_keys: &[String],
        results: &[Result<Label, TreeError>],
        class_names: [&str; 2],
    ) -> Result<PathBuf, IoError> {
        let path = self.artifact_path("predict.json");

        let predictions: Vec<PredictionEntry> = row_keys
            .iter()
            .zip(results)
            .map(|(key, result)| match result {
                Ok(label) => PredictionEntry {
                    row_key: key.as_str(),
                    label: Some(label.value()),
                    class: Some(class_names[label.index()]),
                    error: None,
                },
                Err(e) => PredictionEntry {
                    row_key: key.as_str(),
                    label: None,
                    class: None,
                    error: Some(e.to_string()),
                },
            })
            .collect();
        let n_failed = predictions.iter().filter(|p| p.error.is_some()).count();

        let artifact = PredictArtifact {
            experiment: self.experiment.as_str(),
            n_rows: predictions.len(),
            n_failed,
            predictions,
        };

        write_json(&path, &artifact)?;
        info!(path = %path.display(), n_failed, "predictions written");
        Ok(path)
    }
}

fn write_json<T: Serialize>(path: &Path, artifact: &T) -> Result<(), IoError> {
    let json = serde_json::to_string_pretty(artifact).map_err(|e| IoError::EncodeArtifact {
        path: path.to_path_buf(),
        source: e,
    })?;
    write_text(path, &json)
}

fn write_text(path: &Path, text: &str) -> Result<(), IoError> {
    fs::write(path, text).map_err(|e| IoError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct EvaluateArtifact<'a> {
    experiment: &'a str,
    label_column: &'a str,
    features: &'a [String],
    config: ConfigEntry,
    split: SplitEntry,
    tree: ShapeEntry<'a>,
    train: MetricsEntry,
    test: MetricsEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    cleaning: Option<&'a CleanReport>,
}

#[derive(Serialize)]
struct ConfigEntry {
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_gain: f64,
}

#[derive(Serialize)]
struct SplitEntry {
    test_fraction: f64,
    seed: u64,
    n_train: usize,
    n_test: usize,
}

#[derive(Serialize)]
struct ShapeEntry<'a> {
    n_nodes: usize,
    n_leaves: usize,
    depth: usize,
    feature_usage: Vec<FeatureUsageEntry<'a>>,
}

#[derive(Serialize)]
struct FeatureUsageEntry<'a> {
    name: &'a str,
    n_splits: usize,
}

#[derive(Serialize)]
struct MetricsEntry {
    accuracy: f64,
    precision: f64,
    recall: f64,
    f1: f64,
    confusion: BinaryConfusion,
}

impl From<&BinaryConfusion> for MetricsEntry {
    fn from(cm: &BinaryConfusion) -> Self {
        Self {
            accuracy: cm.accuracy(),
            precision: cm.precision(),
            recall: cm.recall(),
            f1: cm.f1(),
            confusion: *cm,
        }
    }
}

#[derive(Serialize)]
struct PredictArtifact<'a> {
    experiment: &'a str,
    n_rows: usize,
    n_failed: usize,
    predictions: Vec<PredictionEntry<'a>>,
}

#[derive(Serialize)]
struct PredictionEntry<'a> {
    row_key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    class: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}
