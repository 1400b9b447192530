use clap::Parser;
use std::path::PathBuf;

/// Default dataset on the Hugging Face Hub
pub const DEFAULT_DATASET: &str = "ccdv/arxiv-classification";

/// Exploratory analysis of the abstract classification dataset
#[derive(Parser, Debug, Clone)]
#[command(name = "paperclass-eda")]
#[command(author, version, about = "Summary statistics and charts for the arXiv abstract dataset")]
pub struct Cli {
    /// Hub dataset id
    #[arg(short, long, env = "PAPERCLASS_DATASET", default_value = DEFAULT_DATASET)]
    pub dataset: String,

    /// Dataset configuration (subset) name
    #[arg(long, default_value = "default")]
    pub subset: String,

    /// Split to read
    #[arg(short, long, default_value = "train")]
    pub split: String,

    /// Number of leading rows to analyse
    #[arg(short = 'n', long, default_value = "20000")]
    pub rows: usize,

    /// Read a local .jsonl or .parquet file instead of the Hub
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Directory the charts are written to
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
