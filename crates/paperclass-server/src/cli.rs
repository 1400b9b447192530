//! Command-line interface

use clap::Parser;
use paperclass_model::DeviceSpec;
use std::path::PathBuf;

/// Academic abstract classifier inference service
#[derive(Parser, Debug, Clone)]
#[command(name = "paperclass-server")]
#[command(about = "Classify academic abstracts into arXiv categories over HTTP", long_about = None)]
pub struct Cli {
    /// Configuration file path (missing file means defaults)
    #[arg(short, long, env = "PAPERCLASS_CONFIG", default_value = "paperclass.yaml")]
    pub config: PathBuf,

    /// Listen address
    #[arg(short = 'l', long, env = "PAPERCLASS_HOST")]
    pub host: Option<String>,

    /// Listen port
    #[arg(short = 'P', long, env = "PAPERCLASS_PORT")]
    pub port: Option<u16>,

    /// Base model hub id or local directory
    #[arg(long, env = "PAPERCLASS_BASE_MODEL")]
    pub base_model: Option<String>,

    /// LoRA adapter directory
    #[arg(short, long, env = "PAPERCLASS_ADAPTER_PATH")]
    pub adapter: Option<PathBuf>,

    /// Explicit tokenizer.json
    #[arg(long, env = "PAPERCLASS_TOKENIZER_PATH")]
    pub tokenizer: Option<PathBuf>,

    /// Hub repo (or directory) providing tokenizer.json when no local one is found
    #[arg(long, env = "PAPERCLASS_TOKENIZER_REPO")]
    pub tokenizer_repo: Option<String>,

    /// Inference device: auto, cpu, cuda[:N], metal[:N]
    #[arg(short, long, env = "PAPERCLASS_DEVICE")]
    pub device: Option<DeviceSpec>,

    /// Keep serving health checks when the model fails to load
    #[arg(long)]
    pub keep_serving_on_load_failure: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "PAPERCLASS_LOG_JSON")]
    pub log_json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
