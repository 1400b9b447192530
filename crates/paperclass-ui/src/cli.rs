use clap::{Parser, Subcommand};

/// Default endpoint of the inference service
pub const DEFAULT_API_URL: &str = "http://localhost:8000/predict";

#[derive(Parser, Debug)]
#[command(name = "paperclass-ui")]
#[command(author, version, about = "Academic abstract classifier front end")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the web form
    Serve {
        /// Listen port
        #[arg(short, long, env = "PAPERCLASS_UI_PORT", default_value = "8501")]
        port: u16,

        /// Listen address
        #[arg(short, long, env = "PAPERCLASS_UI_ADDRESS", default_value = "127.0.0.1")]
        address: String,

        /// Classification endpoint of the inference service
        #[arg(long, env = "PAPERCLASS_API_URL", default_value = DEFAULT_API_URL)]
        api_url: String,

        /// Request timeout in seconds
        #[arg(long, default_value = "30")]
        timeout: u64,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Classify one abstract from the terminal
    Classify {
        /// Abstract text; read from stdin when omitted
        text: Option<String>,

        /// Classification endpoint of the inference service
        #[arg(long, env = "PAPERCLASS_API_URL", default_value = DEFAULT_API_URL)]
        api_url: String,

        /// Request timeout in seconds
        #[arg(long, default_value = "30")]
        timeout: u64,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
}
