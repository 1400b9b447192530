//! Base model files: resolution, weight loading, config parsing

use candle_core::{DType, Device, Tensor};
use candle_transformers::models::debertav2::Config as DebertaConfig;
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use paperclass_core::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// On-disk format of the base weights
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightFormat {
    /// `model.safetensors`
    Safetensors,
    /// `pytorch_model.bin`
    Pickle,
}

impl WeightFormat {
    /// File names in lookup order
    const CANDIDATES: [(&'static str, WeightFormat); 2] = [
        ("model.safetensors", WeightFormat::Safetensors),
        ("pytorch_model.bin", WeightFormat::Pickle),
    ];
}

/// Local paths of everything the base model contributes
#[derive(Debug, Clone)]
pub struct BaseModelFiles {
    pub config: PathBuf,
    pub weights: PathBuf,
    pub format: WeightFormat,
    /// Present only if the base model ships a fast tokenizer
    pub tokenizer: Option<PathBuf>,
}

/// Resolve the base model to local files.
///
/// A path to an existing directory is used as-is. Anything else is treated as
/// a hub repository id and downloaded into the hub cache.
pub fn resolve_base_model(id: &str, revision: &str) -> Result<BaseModelFiles> {
    let local = Path::new(id);
    if local.is_dir() {
        tracing::debug!("Using local base model at {}", local.display());
        return resolve_local(local);
    }
    resolve_hub(id, revision)
}

fn resolve_local(dir: &Path) -> Result<BaseModelFiles> {
    let config = dir.join("config.json");
    if !config.is_file() {
        return Err(Error::model_load(format!(
            "config.json not found in {}",
            dir.display()
        )));
    }

    let (weights, format) = WeightFormat::CANDIDATES
        .iter()
        .map(|(name, format)| (dir.join(name), *format))
        .find(|(path, _)| path.is_file())
        .ok_or_else(|| {
            Error::model_load(format!(
                "No model weights in {} (tried model.safetensors, pytorch_model.bin)",
                dir.display()
            ))
        })?;

    let tokenizer = Some(dir.join("tokenizer.json")).filter(|p| p.is_file());

    Ok(BaseModelFiles {
        config,
        weights,
        format,
        tokenizer,
    })
}

fn resolve_hub(repo_id: &str, revision: &str) -> Result<BaseModelFiles> {
    tracing::info!("Fetching {} ({}) from the HuggingFace hub", repo_id, revision);

    let api = Api::new()
        .map_err(|e| Error::model_load(format!("Failed to initialize HuggingFace API: {}", e)))?;
    let repo = api.repo(Repo::with_revision(
        repo_id.to_string(),
        RepoType::Model,
        revision.to_string(),
    ));

    let config = repo
        .get("config.json")
        .map_err(|e| Error::model_load(format!("Failed to download config.json: {}", e)))?;

    let mut errors = Vec::new();
    let mut found = None;
    for (name, format) in WeightFormat::CANDIDATES {
        match repo.get(name) {
            Ok(path) => {
                tracing::debug!("Found weight file: {}", name);
                found = Some((path, format));
                break;
            }
            Err(e) => errors.push(format!("{}: {}", name, e)),
        }
    }
    let (weights, format) = found.ok_or_else(|| {
        Error::model_load(format!(
            "No model weights found for {} [{}]",
            repo_id,
            errors.join(" | ")
        ))
    })?;

    let tokenizer = match repo.get("tokenizer.json") {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::debug!("{} has no tokenizer.json: {}", repo_id, e);
            None
        }
    };

    Ok(BaseModelFiles {
        config,
        weights,
        format,
        tokenizer,
    })
}

/// Fetch `tokenizer.json` from a hub repository, or take it from a local directory
pub fn fetch_tokenizer(repo_id: &str, revision: &str) -> Result<PathBuf> {
    let local = Path::new(repo_id);
    if local.is_dir() {
        let path = local.join("tokenizer.json");
        if path.is_file() {
            return Ok(path);
        }
        return Err(Error::model_load(format!("{} has no tokenizer.json", local.display())));
    }

    tracing::info!("Fetching tokenizer.json from {} ({})", repo_id, revision);
    let api = Api::new()
        .map_err(|e| Error::model_load(format!("Failed to initialize HuggingFace API: {}", e)))?;
    api.repo(Repo::with_revision(
        repo_id.to_string(),
        RepoType::Model,
        revision.to_string(),
    ))
    .get("tokenizer.json")
    .map_err(|e| Error::model_load(format!("Failed to download tokenizer.json from {}: {}", repo_id, e)))
}

/// Read every base tensor into memory as F32.
///
/// Tensors are kept in a map rather than memory-mapped because the adapter
/// merge rewrites some of them before the model is built.
pub fn load_weights(files: &BaseModelFiles, device: &Device) -> Result<HashMap<String, Tensor>> {
    let path = &files.weights;
    let raw: Vec<(String, Tensor)> = match files.format {
        WeightFormat::Safetensors => candle_core::safetensors::load(path, &Device::Cpu)
            .map_err(|e| Error::model_load(format!("Failed to load {}: {}", path.display(), e)))?
            .into_iter()
            .collect(),
        WeightFormat::Pickle => candle_core::pickle::read_all(path)
            .map_err(|e| Error::model_load(format!("Failed to load {}: {}", path.display(), e)))?,
    };

    raw.into_iter()
        .map(|(name, tensor)| {
            let tensor = tensor
                .to_dtype(DType::F32)
                .and_then(|t| t.to_device(device))
                .map_err(|e| Error::model_load(format!("Failed to prepare '{}': {}", name, e)))?;
            Ok((name, tensor))
        })
        .collect()
}

/// Parse a DeBERTa-v2/v3 `config.json`, filling in the pooler settings that
/// checkpoints saved without a classification head leave out.
pub fn load_deberta_config(path: &Path) -> Result<DebertaConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::model_load(format!("Failed to read {}: {}", path.display(), e)))?;
    let mut value: Value = serde_json::from_str(&content)
        .map_err(|e| Error::model_load(format!("Failed to parse {}: {}", path.display(), e)))?;

    patch_pooler_defaults(&mut value)?;

    serde_json::from_value(value)
        .map_err(|e| Error::model_load(format!("Invalid DeBERTa config {}: {}", path.display(), e)))
}

/// Default the pooler to `hidden_size` units, GELU, no dropout
pub(crate) fn patch_pooler_defaults(value: &mut Value) -> Result<()> {
    let obj = value
        .as_object_mut()
        .ok_or_else(|| Error::model_load("config.json is not a JSON object"))?;

    let hidden_size = obj
        .get("hidden_size")
        .and_then(Value::as_u64)
        .ok_or_else(|| Error::model_load("config.json has no hidden_size"))?;

    for (key, default) in [
        ("pooler_hidden_size", Value::from(hidden_size)),
        ("pooler_dropout", Value::from(0.0)),
        ("pooler_hidden_act", Value::from("gelu")),
    ] {
        match obj.get(key) {
            Some(v) if !v.is_null() => {}
            _ => {
                obj.insert(key.to_string(), default);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_patch_fills_missing_pooler_fields() {
        let mut value = json!({ "hidden_size": 768, "pooler_hidden_size": null });
        patch_pooler_defaults(&mut value).unwrap();
        assert_eq!(value["pooler_hidden_size"], 768);
        assert_eq!(value["pooler_dropout"], 0.0);
        assert_eq!(value["pooler_hidden_act"], "gelu");
    }

    #[test]
    fn test_patch_keeps_existing_pooler_fields() {
        let mut value = json!({ "hidden_size": 768, "pooler_hidden_size": 256, "pooler_hidden_act": "tanh" });
        patch_pooler_defaults(&mut value).unwrap();
        assert_eq!(value["pooler_hidden_size"], 256);
        assert_eq!(value["pooler_hidden_act"], "tanh");
    }

    #[test]
    fn test_patch_requires_hidden_size() {
        let mut value = json!({ "vocab_size": 10 });
        assert!(patch_pooler_defaults(&mut value).is_err());
        assert!(patch_pooler_defaults(&mut json!([1, 2])).is_err());
    }

    #[test]
    fn test_resolve_local_directory() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("config.json"), "{}").unwrap();
        std::fs::write(tmp.path().join("pytorch_model.bin"), b"").unwrap();

        let files = resolve_base_model(tmp.path().to_str().unwrap(), "main").unwrap();
        assert_eq!(files.format, WeightFormat::Pickle);
        assert!(files.tokenizer.is_none());

        // safetensors wins when both exist
        std::fs::write(tmp.path().join("model.safetensors"), b"").unwrap();
        std::fs::write(tmp.path().join("tokenizer.json"), "{}").unwrap();
        let files = resolve_base_model(tmp.path().to_str().unwrap(), "main").unwrap();
        assert_eq!(files.format, WeightFormat::Safetensors);
        assert_eq!(files.tokenizer, Some(tmp.path().join("tokenizer.json")));
    }

    #[test]
    fn test_fetch_tokenizer_from_local_directory() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path().to_str().unwrap();
        assert!(fetch_tokenizer(dir, "main").unwrap_err().to_string().contains("no tokenizer.json"));

        std::fs::write(tmp.path().join("tokenizer.json"), "{}").unwrap();
        assert_eq!(fetch_tokenizer(dir, "main").unwrap(), tmp.path().join("tokenizer.json"));
    }

    #[test]
    fn test_resolve_local_without_weights() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("config.json"), "{}").unwrap();
        let err = resolve_base_model(tmp.path().to_str().unwrap(), "main").unwrap_err();
        assert!(err.to_string().contains("No model weights"));
    }

    #[test]
    fn test_load_weights_converts_to_f32() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("model.safetensors");
        let mut tensors = HashMap::new();
        tensors.insert(
            "w".to_string(),
            Tensor::ones((2, 2), DType::F16, &Device::Cpu).unwrap(),
        );
        candle_core::safetensors::save(&tensors, &path).unwrap();

        let files = BaseModelFiles {
            config: tmp.path().join("config.json"),
            weights: path,
            format: WeightFormat::Safetensors,
            tokenizer: None,
        };
        let loaded = load_weights(&files, &Device::Cpu).unwrap();
        assert_eq!(loaded["w"].dtype(), DType::F32);
    }
}
