use std::path::PathBuf;

use anyhow::{Context, Result, bail, ensure};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info, warn};

use pluvio_io::{
    ArtifactWriter, DEFAULT_KEY_COLUMN, Dot, EvaluationSummary, ExperimentName, WeatherReader,
    stratified_split,
};
use pluvio_tree::{BinaryConfusion, DecisionTree, FeatureSchema, Label, TreeConfig, read_portable};

#[derive(Parser)]
#[command(name = "pluvio")]
#[command(about = "Rain prediction from daily weather with gain-ratio decision trees")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for the train/test shuffle
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel prediction (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Pre-pruning settings for tree induction.
#[derive(Args, Debug, Clone)]
struct TreeArgs {
    /// Maximum tree depth
    #[arg(long, default_value_t = 6)]
    max_depth: usize,

    /// Grow without a depth limit (overrides --max-depth)
    #[arg(long, default_value_t = false)]
    unbounded: bool,

    /// Minimum number of rows a node needs to be split
    #[arg(long, default_value_t = 20)]
    min_samples_split: usize,

    /// Minimum gain ratio a split must exceed
    #[arg(long, default_value_t = 1e-4)]
    min_gain: f64,
}

impl TreeArgs {
    fn config(&self) -> TreeConfig {
        let max_depth = if self.unbounded {
            None
        } else {
            Some(self.max_depth)
        };
        TreeConfig::new()
            .with_max_depth(max_depth)
            .with_min_samples_split(self.min_samples_split)
            .with_min_gain(self.min_gain)
    }
}

/// Column layout of the weather CSV.
#[derive(Args, Debug, Clone)]
struct ColumnArgs {
    /// Feature columns, in order
    #[arg(long, value_delimiter = ',', default_value = "tavg,tmin,tmax,wspd,pres")]
    features: Vec<String>,

    /// Row-key column
    #[arg(long, default_value = DEFAULT_KEY_COLUMN)]
    key_column: String,

    /// Display names for label 0 and label 1
    #[arg(long, value_delimiter = ',', default_value = "No Rain,Rain")]
    class_names: Vec<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Clean a weather CSV, fit a tree on a stratified split, and evaluate it
    Train {
        /// Path to the weather CSV file
        #[arg(long)]
        data: PathBuf,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// Column whose positive values mark a rainy day
        #[arg(long, default_value = "prcp")]
        label_column: String,

        /// Share of rows held out for evaluation
        #[arg(long, default_value_t = 0.2)]
        test_fraction: f64,

        #[command(flatten)]
        columns: ColumnArgs,

        #[command(flatten)]
        tree: TreeArgs,
    },

    /// Predict rain for every row of a weather CSV with a saved tree
    Predict {
        /// Path to the saved tree JSON
        #[arg(long)]
        tree: PathBuf,

        /// Path to the weather CSV file
        #[arg(long)]
        data: PathBuf,

        /// Experiment name for output files
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        columns: ColumnArgs,
    },

    /// Render a saved tree JSON as a Graphviz DOT file
    Render {
        /// Path to the saved tree JSON
        #[arg(long)]
        tree: PathBuf,

        /// Destination DOT file
        #[arg(long)]
        output: PathBuf,

        /// Graph name written into the DOT header
        #[arg(long, default_value = "c45_tree")]
        graph_name: String,

        /// Display names for label 0 and label 1
        #[arg(long, value_delimiter = ',', default_value = "No Rain,Rain")]
        class_names: Vec<String>,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct TrainOutput {
    experiment: String,
    n_rows: usize,
    n_train: usize,
    n_test: usize,
    dropped_columns: Vec<String>,
    n_nodes: usize,
    n_leaves: usize,
    depth: usize,
    train_accuracy: f64,
    test_accuracy: f64,
    test_precision: f64,
    test_recall: f64,
    test_f1: f64,
    artifacts: Vec<PathBuf>,
}

#[derive(Serialize)]
struct PredictOutput {
    experiment: String,
    n_rows: usize,
    n_predicted: usize,
    n_failed: usize,
    n_rain: usize,
    artifact: PathBuf,
}

#[derive(Serialize)]
struct RenderOutput {
    output: PathBuf,
    depth: usize,
    n_leaves: usize,
}

fn class_names(names: &[String]) -> Result<[&str; 2]> {
    match names {
        [negative, positive] => Ok([negative.as_str(), positive.as_str()]),
        _ => bail!("expected exactly two class names, got {}", names.len()),
    }
}

fn to_labels(raw: &[u8]) -> Result<Vec<Label>> {
    raw.iter()
        .map(|&v| Label::try_from(v).context("label outside {0, 1}"))
        .collect()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Train {
            data,
            experiment,
            output_dir,
            label_column,
            test_fraction,
            columns,
            tree,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;
            let class_names = class_names(&columns.class_names)?;
            ensure!(
                !columns.features.contains(&label_column),
                "label column \"{label_column}\" cannot also be a feature"
            );

            // 1. Read and clean
            let mut table = WeatherReader::new(&data)
                .with_key_column(&columns.key_column)
                .read()
                .context("failed to read weather CSV")?;
            let cleaning = table.clean();

            // 2. Label and project
            let labels = table
                .rain_labels(&label_column)
                .context("failed to derive rain labels")?;
            let frame = table
                .select_features(&columns.features)
                .context("failed to select feature columns")?;
            let features = frame.complete_rows()?;

            // 3. Split
            let split = stratified_split(&labels, test_fraction, cli.seed)
                .context("failed to split rows")?;
            let (train_x, test_x) = split.select(&features);
            let (train_y, test_y) = split.select(&labels);
            info!(
                n_train = train_x.len(),
                n_test = test_x.len(),
                "rows partitioned"
            );

            // 4. Fit
            let config = tree.config();
            let schema = FeatureSchema::new(frame.names().iter().cloned())?;
            let fitted = config
                .fit(&train_x, &train_y, schema)
                .context("tree induction failed")?;

            // 5. Evaluate
            let train_cm = BinaryConfusion::from_labels(
                &to_labels(&train_y)?,
                &fitted.predict_batch(&train_x)?,
            )?;
            let test_cm =
                BinaryConfusion::from_labels(&to_labels(&test_y)?, &fitted.predict_batch(&test_x)?)?;
            info!(
                train_accuracy = train_cm.accuracy(),
                test_accuracy = test_cm.accuracy(),
                test_f1 = test_cm.f1(),
                "evaluation complete"
            );
            debug!("test confusion\n{test_cm}");

            // 6. Write artifacts
            let writer = ArtifactWriter::new(&output_dir, experiment_name)?;
            let artifacts = vec![
                writer.write_tree(&fitted)?,
                writer.write_dot(&fitted.to_portable(), class_names)?,
                writer.write_evaluation(&EvaluationSummary {
                    tree: &fitted,
                    config: &config,
                    label_column: &label_column,
                    test_fraction,
                    seed: cli.seed,
                    train: &train_cm,
                    test: &test_cm,
                    cleaning: Some(&cleaning),
                })?,
            ];

            // 7. Print summary
            let output = TrainOutput {
                experiment,
                n_rows: table.n_rows(),
                n_train: split.train.len(),
                n_test: split.test.len(),
                dropped_columns: cleaning.dropped_columns,
                n_nodes: fitted.n_nodes(),
                n_leaves: fitted.n_leaves(),
                depth: fitted.depth(),
                train_accuracy: train_cm.accuracy(),
                test_accuracy: test_cm.accuracy(),
                test_precision: test_cm.precision(),
                test_recall: test_cm.recall(),
                test_f1: test_cm.f1(),
                artifacts,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Predict {
            tree,
            data,
            experiment,
            output_dir,
            columns,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;
            let class_names = class_names(&columns.class_names)?;

            // 1. Load tree
            let schema = FeatureSchema::new(columns.features.iter().cloned())?;
            let fitted = DecisionTree::load_json(&tree, schema).context("failed to load tree")?;
            info!(
                n_nodes = fitted.n_nodes(),
                depth = fitted.depth(),
                "tree loaded"
            );

            // 2. Read rows as-is; gaps and absent columns stay missing
            let frame = WeatherReader::new(&data)
                .with_key_column(&columns.key_column)
                .read()
                .context("failed to read weather CSV")?
                .project_features(&columns.features)
                .context("failed to select feature columns")?;

            // 3. Predict, reporting failed rows without aborting
            let results = fitted.predict_many(frame.rows());
            for (key, result) in frame.row_keys().iter().zip(&results) {
                if let Err(e) = result {
                    warn!(row_key = %key, error = %e, "row skipped");
                }
            }
            let n_failed = results.iter().filter(|r| r.is_err()).count();
            let n_rain = results
                .iter()
                .filter(|r| matches!(r, Ok(label) if *label == Label::POSITIVE))
                .count();

            // 4. Write predictions JSON
            let writer = ArtifactWriter::new(&output_dir, experiment_name)?;
            let artifact = writer.write_predictions(frame.row_keys(), &results, class_names)?;

            // 5. Print summary
            let output = PredictOutput {
                experiment,
                n_rows: results.len(),
                n_predicted: results.len() - n_failed,
                n_failed,
                n_rain,
                artifact,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Render {
            tree,
            output,
            graph_name,
            class_names: names,
        } => {
            let root = read_portable(&tree).context("failed to read tree JSON")?;
            let text = Dot::new(&root, &graph_name)
                .with_class_names(class_names(&names)?)
                .to_string();
            std::fs::write(&output, text)
                .with_context(|| format!("failed to write {}", output.display()))?;
            info!(path = %output.display(), "diagram written");

            let summary = RenderOutput {
                depth: root.depth(),
                n_leaves: root.n_leaves(),
                output,
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
