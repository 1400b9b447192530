//! Configuration for locating and loading the classifier

use crate::device::DeviceSpec;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Hub identifier of the base model the adapter was trained on.
pub const DEFAULT_BASE_MODEL: &str = "microsoft/deberta-v3-small";

/// Directory holding the fine-tuned LoRA adapter.
pub const DEFAULT_ADAPTER_DIR: &str = "final_deberta_model";

/// Hub repository with a fast `tokenizer.json` for the DeBERTa-v3 vocabulary.
///
/// `microsoft/deberta-v3-small` only ships the sentencepiece `spm.model`; every
/// DeBERTa-v3 size shares that vocabulary, so a converted tokenizer from any of
/// them encodes identically.
pub const DEFAULT_TOKENIZER_REPO: &str = "protectai/deberta-v3-base-prompt-injection";

/// Maximum number of tokens (special tokens included) fed to the model.
pub const DEFAULT_MAX_LENGTH: usize = 512;

/// Where the base model, adapter and tokenizer come from and how to run them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Hub repository id, or a local directory with `config.json` and weights
    #[serde(default = "default_base_model")]
    pub base_model: String,

    /// Hub revision of the base model
    #[serde(default = "default_revision")]
    pub revision: String,

    /// LoRA adapter directory; relative paths resolve against the working directory
    #[serde(default = "default_adapter_path")]
    pub adapter_path: PathBuf,

    /// Explicit `tokenizer.json`, overriding the adapter and hub lookups
    #[serde(default)]
    pub tokenizer_path: Option<PathBuf>,

    /// Hub repository (or local directory) consulted for `tokenizer.json` when
    /// neither the explicit path, the adapter nor the base model has one
    #[serde(default = "default_tokenizer_repo")]
    pub tokenizer_repo: Option<String>,

    /// Hub revision of `tokenizer_repo`
    #[serde(default = "default_revision")]
    pub tokenizer_revision: String,

    /// Device to run on
    #[serde(default)]
    pub device: DeviceSpec,

    /// Maximum sequence length
    #[serde(default = "default_max_length")]
    pub max_length: usize,
}

fn default_base_model() -> String {
    DEFAULT_BASE_MODEL.to_string()
}

fn default_revision() -> String {
    "main".to_string()
}

fn default_tokenizer_repo() -> Option<String> {
    Some(DEFAULT_TOKENIZER_REPO.to_string())
}

fn default_adapter_path() -> PathBuf {
    PathBuf::from(DEFAULT_ADAPTER_DIR)
}

fn default_max_length() -> usize {
    DEFAULT_MAX_LENGTH
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self {
            base_model: default_base_model(),
            revision: default_revision(),
            adapter_path: default_adapter_path(),
            tokenizer_path: None,
            tokenizer_repo: default_tokenizer_repo(),
            tokenizer_revision: default_revision(),
            device: DeviceSpec::default(),
            max_length: default_max_length(),
        }
    }
}

impl ModelSpec {
    /// Set the base model
    pub fn with_base_model(mut self, base_model: impl Into<String>) -> Self {
        self.base_model = base_model.into();
        self
    }

    /// Set the adapter directory
    pub fn with_adapter(mut self, path: impl Into<PathBuf>) -> Self {
        self.adapter_path = path.into();
        self
    }

    /// Set tokenizer path
    pub fn with_tokenizer(mut self, path: impl Into<PathBuf>) -> Self {
        self.tokenizer_path = Some(path.into());
        self
    }

    /// Set (or clear) the fallback tokenizer repository
    pub fn with_tokenizer_repo(mut self, repo: Option<String>) -> Self {
        self.tokenizer_repo = repo;
        self
    }

    /// Set device
    pub fn with_device(mut self, device: DeviceSpec) -> Self {
        self.device = device;
        self
    }

    /// Adapter directory as an absolute path
    pub fn resolved_adapter_path(&self) -> PathBuf {
        resolve_relative(&self.adapter_path)
    }
}

fn resolve_relative(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
