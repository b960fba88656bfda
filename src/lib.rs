//! Unilabel: unify object detection datasets into one label space.
//!
//! Several detection datasets (COCO, CrowdHuman, Pascal VOC, Open Images,
//! pre-indexed YOLO exports such as Objects365) each name and index their
//! classes differently. Unilabel builds one ordered class vocabulary from all
//! of them, converts every source into YOLO-style label files against that
//! vocabulary, keeps image and label files strictly paired, merges the
//! per-source corpora, and draws a seeded subset that still covers every
//! class.
//!
//! # Modules
//!
//! - [`vocab`]: class-name normalization and the unified vocabulary
//! - [`normalize`]: one converter per raw annotation family
//! - [`integrity`]: image/label pairing
//! - [`merge`]: union of per-source corpora
//! - [`sample`]: coverage-preserving subsets
//! - [`pipeline`]: the stages chained end to end
//! - [`config`]: the YAML pipeline configuration
//! - [`ir`]: boxes, label files, and the corpus directory layout

pub mod config;
pub mod error;
pub mod integrity;
pub mod ir;
pub mod merge;
pub mod normalize;
pub mod pipeline;
pub mod sample;
pub mod vocab;

use std::fmt::Display;
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

pub use config::PipelineConfig;
pub use error::UnilabelError;

use integrity::prune_split;
use ir::CorpusLayout;
use sample::SampleOptions;
use vocab::read_vocabulary;

/// The unilabel CLI application.
#[derive(Parser)]
#[command(name = "unilabel")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Report format on stdout.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    output: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Build the unified vocabulary and write it to the configured path.
    Vocab(ConfigArgs),
    /// Convert sources into per-source corpora using the written vocabulary.
    Convert(ConvertArgs),
    /// Delete unpaired images and labels in a corpus.
    Prune(PruneArgs),
    /// Merge the converted corpora into one.
    Merge(ConfigArgs),
    /// Draw a coverage-preserving subset of the merged corpus.
    Sample(SampleArgs),
    /// Run every stage in order.
    Run(ConfigArgs),
}

#[derive(clap::Args)]
struct ConfigArgs {
    /// Pipeline configuration file.
    #[arg(short, long, env = "UNILABEL_CONFIG")]
    config: PathBuf,
}

#[derive(clap::Args)]
struct ConvertArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Convert only this source.
    #[arg(long)]
    source: Option<String>,
}

#[derive(clap::Args)]
struct PruneArgs {
    /// Corpus root containing images/<split>/ and labels/<split>/.
    root: PathBuf,

    /// Splits to prune.
    #[arg(long = "split", default_values_t = ["train".to_string(), "val".to_string()])]
    splits: Vec<String>,
}

#[derive(clap::Args)]
struct SampleArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Override the configured sample fraction.
    #[arg(long)]
    fraction: Option<f64>,

    /// Override the configured seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Override the configured minimum sampled items per class.
    #[arg(long)]
    min_per_class: Option<usize>,
}

/// Run the unilabel CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), UnilabelError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(Commands::Vocab(args)) => run_vocab(args, cli.output),
        Some(Commands::Convert(args)) => run_convert(args, cli.output),
        Some(Commands::Prune(args)) => run_prune(args, cli.output),
        Some(Commands::Merge(args)) => run_merge(args, cli.output),
        Some(Commands::Sample(args)) => run_sample(args, cli.output),
        Some(Commands::Run(args)) => run_all(args, cli.output),
        None => {
            println!("unilabel {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Unify object detection datasets into one label space.");
            println!();
            println!("Run 'unilabel --help' for usage information.");
            Ok(())
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A subscriber may already be installed when run() is called twice in-process.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn emit<T: Serialize + Display>(report: &T, output: OutputFormat) -> Result<(), UnilabelError> {
    match output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(report).map_err(UnilabelError::ReportSerialize)?;
            println!("{json}");
        }
        OutputFormat::Text => print!("{report}"),
    }
    Ok(())
}

fn run_vocab(args: ConfigArgs, output: OutputFormat) -> Result<(), UnilabelError> {
    let config = PipelineConfig::load(&args.config)?;
    let (_, report) = pipeline::build_and_write_vocabulary(&config)?;
    emit(&report, output)
}

fn run_convert(args: ConvertArgs, output: OutputFormat) -> Result<(), UnilabelError> {
    let config = PipelineConfig::load(&args.config.config)?;
    if let Some(name) = &args.source {
        config.source(name)?;
    }

    let vocabulary = read_vocabulary(&config.vocabulary.path)?;
    let report = pipeline::convert_sources(&config, &vocabulary, args.source.as_deref())?;
    emit(&report, output)
}

fn run_prune(args: PruneArgs, output: OutputFormat) -> Result<(), UnilabelError> {
    let layout = CorpusLayout::new(args.root);
    let reports = args
        .splits
        .iter()
        .map(|split| prune_split(&layout, split))
        .collect::<Result<Vec<_>, _>>()?;

    let report = PruneListing(reports);
    emit(&report, output)
}

fn run_merge(args: ConfigArgs, output: OutputFormat) -> Result<(), UnilabelError> {
    let config = PipelineConfig::load(&args.config)?;
    let vocabulary = read_vocabulary(&config.vocabulary.path)?;
    let report = pipeline::merge_converted(&config, &vocabulary)?;
    emit(&report, output)
}

fn run_sample(args: SampleArgs, output: OutputFormat) -> Result<(), UnilabelError> {
    let config = PipelineConfig::load(&args.config.config)?;
    let defaults = config.sample_options();
    let opts = SampleOptions {
        fraction: args.fraction.unwrap_or(defaults.fraction),
        seed: args.seed.unwrap_or(defaults.seed),
        min_per_class: args.min_per_class.unwrap_or(defaults.min_per_class),
    };
    sample::validate_sample_options(&opts)?;

    let vocabulary = read_vocabulary(&config.vocabulary.path)?;
    let report = pipeline::sample_merged(&config, &vocabulary, &opts)?;
    emit(&report, output)
}

fn run_all(args: ConfigArgs, output: OutputFormat) -> Result<(), UnilabelError> {
    let config = PipelineConfig::load(&args.config)?;
    let report = pipeline::run_pipeline(&config)?;
    emit(&report, output)
}

/// Prune reports for several splits, printed one after another.
#[derive(Serialize)]
#[serde(transparent)]
struct PruneListing(Vec<integrity::PruneReport>);

impl Display for PruneListing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for report in &self.0 {
            write!(f, "{report}")?;
        }
        Ok(())
    }
}
