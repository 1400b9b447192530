//! Service configuration

use crate::cli::Cli;
use paperclass_model::ModelSpec;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

/// Service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Model, adapter and tokenizer locations
    #[serde(default)]
    pub model: ModelSpec,

    /// Exit non-zero when the model fails to load. When false the process
    /// keeps answering health checks and `/predict` returns 503.
    #[serde(default = "default_true")]
    pub exit_on_load_failure: bool,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub log_json: bool,
}

impl ServerConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = Self::from_file_or_default(&cli.config)?;
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    fn from_file_or_default(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config {}: {}", path.display(), e))?;
        Ok(config)
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(host) = &cli.host {
            self.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.port = port;
        }
        if let Some(base_model) = &cli.base_model {
            self.model.base_model = base_model.clone();
        }
        if let Some(adapter) = &cli.adapter {
            self.model.adapter_path = adapter.clone();
        }
        if let Some(tokenizer) = &cli.tokenizer {
            self.model.tokenizer_path = Some(tokenizer.clone());
        }
        if let Some(repo) = &cli.tokenizer_repo {
            self.model.tokenizer_repo = Some(repo.clone());
        }
        if let Some(device) = cli.device {
            self.model.device = device;
        }
        if cli.keep_serving_on_load_failure {
            self.exit_on_load_failure = false;
        }
        if cli.log_json {
            self.log_json = true;
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.model.max_length == 0 {
            anyhow::bail!("model.max_length must be positive");
        }
        if self.model.base_model.trim().is_empty() {
            anyhow::bail!("model.base_model must not be empty");
        }
        Ok(())
    }

    /// Socket address to bind
    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid listen address {}:{}: {}", self.host, self.port, e))?;
        Ok(addr)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            model: ModelSpec::default(),
            exit_on_load_failure: true,
            log_json: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_true() -> bool {
    true
}
