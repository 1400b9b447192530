//! LoRA adapter loading and merging
//!
//! A PEFT LoRA adapter directory contains `adapter_config.json` and
//! `adapter_model.safetensors` (older exports: `adapter_model.bin`). Tensor
//! names mirror the wrapped model with a `base_model.model.` prefix:
//!
//! - `...query_proj.lora_A.weight` `[r, in]` and `...query_proj.lora_B.weight`
//!   `[out, r]` form a low-rank update of `...query_proj.weight`
//! - everything else (`classifier.weight`, `pooler.dense.bias`, ...) comes from
//!   `modules_to_save` and replaces the base tensor outright
//!
//! Merging folds each pair into its base weight as `W + scale * (B @ A)`, so
//! the forward pass afterwards is exactly the plain architecture.

use candle_core::{DType, Device, Tensor};
use paperclass_core::{Error, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

const SAFETENSORS_FILE: &str = "adapter_model.safetensors";
const PICKLE_FILE: &str = "adapter_model.bin";
const CONFIG_FILE: &str = "adapter_config.json";

/// The subset of `adapter_config.json` that affects merging
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AdapterConfig {
    #[serde(default = "default_peft_type")]
    pub peft_type: String,

    /// LoRA rank
    pub r: usize,

    pub lora_alpha: f64,

    /// Rank-stabilised scaling (`alpha / sqrt(r)`)
    #[serde(default)]
    pub use_rslora: bool,

    /// Base layer stores weights as `[in, out]`
    #[serde(default)]
    pub fan_in_fan_out: bool,

    #[serde(default)]
    pub modules_to_save: Option<Vec<String>>,

    #[serde(default)]
    pub base_model_name_or_path: Option<String>,

    #[serde(default)]
    pub task_type: Option<String>,
}

fn default_peft_type() -> String {
    "LORA".to_string()
}

impl AdapterConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::model_load(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            Error::model_load(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !self.peft_type.eq_ignore_ascii_case("LORA") {
            return Err(Error::model_load(format!(
                "Unsupported adapter type '{}' (only LORA adapters can be merged)",
                self.peft_type
            )));
        }
        if self.r == 0 {
            return Err(Error::model_load("adapter rank r must be positive"));
        }
        Ok(())
    }

    /// Factor applied to `B @ A`
    pub fn scaling(&self) -> f64 {
        if self.use_rslora {
            self.lora_alpha / (self.r as f64).sqrt()
        } else {
            self.lora_alpha / self.r as f64
        }
    }
}

struct LoraPair {
    a: Option<Tensor>,
    b: Option<Tensor>,
}

/// Counts reported after a merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeSummary {
    /// Base weights updated with a low-rank delta
    pub merged: usize,
    /// Base tensors replaced (or added) from `modules_to_save`
    pub replaced: usize,
}

/// A parsed LoRA adapter ready to be folded into base weights
pub struct LoraAdapter {
    config: AdapterConfig,
    pairs: BTreeMap<String, LoraPair>,
    replacements: BTreeMap<String, Tensor>,
    source: PathBuf,
}

impl LoraAdapter {
    /// Load an adapter directory
    pub fn load(dir: &Path, device: &Device) -> Result<Self> {
        if !dir.is_dir() {
            return Err(Error::model_load(format!(
                "Adapter directory not found: {}",
                dir.display()
            )));
        }

        let config = AdapterConfig::from_file(&dir.join(CONFIG_FILE))?;
        let tensors = load_adapter_tensors(dir, device)?;
        tracing::debug!("Read {} adapter tensors from {}", tensors.len(), dir.display());

        let mut adapter = Self::from_tensors(config, tensors)?;
        adapter.source = dir.to_path_buf();
        Ok(adapter)
    }

    /// Build an adapter from already-loaded tensors (keys as stored by PEFT)
    pub fn from_tensors(config: AdapterConfig, tensors: HashMap<String, Tensor>) -> Result<Self> {
        config.validate()?;

        let mut pairs: BTreeMap<String, LoraPair> = BTreeMap::new();
        let mut replacements = BTreeMap::new();

        for (raw_key, tensor) in tensors {
            let key = normalize_key(&raw_key);

            if let Some(module) = key.strip_suffix(".lora_A.weight") {
                pairs
                    .entry(module.to_string())
                    .or_insert(LoraPair { a: None, b: None })
                    .a = Some(tensor);
            } else if let Some(module) = key.strip_suffix(".lora_B.weight") {
                pairs
                    .entry(module.to_string())
                    .or_insert(LoraPair { a: None, b: None })
                    .b = Some(tensor);
            } else if key.contains("lora_") {
                return Err(Error::model_load(format!(
                    "Unsupported adapter tensor '{}' (only lora_A/lora_B weights are merged)",
                    raw_key
                )));
            } else {
                replacements.insert(key, tensor);
            }
        }

        if pairs.is_empty() && replacements.is_empty() {
            return Err(Error::model_load("Adapter contains no tensors"));
        }

        Ok(Self {
            config,
            pairs,
            replacements,
            source: PathBuf::new(),
        })
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Modules receiving a low-rank update, sorted
    pub fn target_modules(&self) -> impl Iterator<Item = &str> {
        self.pairs.keys().map(String::as_str)
    }

    /// Whether the adapter carries a tensor that replaces `key`
    pub fn replaces(&self, key: &str) -> bool {
        self.replacements.contains_key(key)
    }

    /// Fold the adapter into `weights` in place.
    ///
    /// Every LoRA target must already exist in `weights` with the shape of
    /// `B @ A`; replacement tensors may add new keys.
    pub fn merge_into(&self, weights: &mut HashMap<String, Tensor>) -> Result<MergeSummary> {
        let scale = self.config.scaling();
        let mut summary = MergeSummary::default();

        for (module, pair) in &self.pairs {
            let (a, b) = match (&pair.a, &pair.b) {
                (Some(a), Some(b)) => (a, b),
                (None, _) => {
                    return Err(Error::model_load(format!(
                        "LoRA module '{}' is missing lora_A",
                        module
                    )))
                }
                (_, None) => {
                    return Err(Error::model_load(format!(
                        "LoRA module '{}' is missing lora_B",
                        module
                    )))
                }
            };

            let target = format!("{}.weight", module);
            let base = weights.get(&target).ok_or_else(|| {
                Error::model_load(format!(
                    "LoRA target '{}' does not exist in the base model",
                    target
                ))
            })?;

            let merged = merge_pair(base, a, b, scale, self.config.fan_in_fan_out)
                .map_err(|e| Error::model_load(format!("Failed to merge '{}': {}", target, e)))?;
            weights.insert(target, merged);
            summary.merged += 1;
        }

        for (key, tensor) in &self.replacements {
            let tensor = tensor
                .to_dtype(DType::F32)
                .map_err(|e| Error::model_load(format!("Failed to convert '{}': {}", key, e)))?;
            if let Some(existing) = weights.get(key) {
                if existing.dims() != tensor.dims() {
                    tracing::debug!(
                        "Adapter replaces '{}' with new shape {:?} (base {:?})",
                        key,
                        tensor.dims(),
                        existing.dims()
                    );
                }
            }
            weights.insert(key.clone(), tensor);
            summary.replaced += 1;
        }

        tracing::info!(
            "Merged adapter {} (r={}, alpha={}, scale={:.4}): {} LoRA layers, {} replaced tensors",
            self.source.display(),
            self.config.r,
            self.config.lora_alpha,
            scale,
            summary.merged,
            summary.replaced
        );

        Ok(summary)
    }
}

fn merge_pair(
    base: &Tensor,
    a: &Tensor,
    b: &Tensor,
    scale: f64,
    fan_in_fan_out: bool,
) -> candle_core::Result<Tensor> {
    let base = base.to_dtype(DType::F32)?;
    let a = a.to_dtype(DType::F32)?.to_device(base.device())?;
    let b = b.to_dtype(DType::F32)?.to_device(base.device())?;

    let mut delta = b.matmul(&a)?;
    if fan_in_fan_out {
        delta = delta.t()?;
    }
    if delta.dims() != base.dims() {
        candle_core::bail!(
            "delta shape {:?} does not match base shape {:?}",
            delta.dims(),
            base.dims()
        );
    }

    base.add(&delta.affine(scale, 0.0)?)
}

/// Strip PEFT's wrapper prefix and adapter-name segments.
///
/// `base_model.model.classifier.modules_to_save.default.weight` becomes
/// `classifier.weight`; `...query_proj.lora_A.default.weight` becomes
/// `...query_proj.lora_A.weight`.
pub fn normalize_key(key: &str) -> String {
    let key = key.strip_prefix("base_model.model.").unwrap_or(key);
    key.replace(".default.", ".")
        .replace(".modules_to_save.", ".")
        .replace(".original_module.", ".")
}

fn load_adapter_tensors(dir: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    let safetensors = dir.join(SAFETENSORS_FILE);
    if safetensors.is_file() {
        return candle_core::safetensors::load(&safetensors, device).map_err(|e| {
            Error::model_load(format!("Failed to load {}: {}", safetensors.display(), e))
        });
    }

    let pickle = dir.join(PICKLE_FILE);
    if pickle.is_file() {
        let tensors = candle_core::pickle::read_all(&pickle).map_err(|e| {
            Error::model_load(format!("Failed to load {}: {}", pickle.display(), e))
        })?;
        return tensors
            .into_iter()
            .map(|(name, tensor)| {
                let tensor = tensor.to_device(device).map_err(|e| {
                    Error::model_load(format!("Failed to move '{}' to device: {}", name, e))
                })?;
                Ok((name, tensor))
            })
            .collect();
    }

    Err(Error::model_load(format!(
        "No adapter weights in {} (tried {}, {})",
        dir.display(),
        SAFETENSORS_FILE,
        PICKLE_FILE
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(r: usize, alpha: f64) -> AdapterConfig {
        AdapterConfig {
            peft_type: "LORA".to_string(),
            r,
            lora_alpha: alpha,
            use_rslora: false,
            fan_in_fan_out: false,
            modules_to_save: Some(vec!["classifier".to_string()]),
            base_model_name_or_path: None,
            task_type: Some("SEQ_CLS".to_string()),
        }
    }

    fn t(data: &[f32], shape: (usize, usize)) -> Tensor {
        Tensor::from_slice(data, shape, &Device::Cpu).unwrap()
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(
            normalize_key("base_model.model.deberta.encoder.layer.0.attention.self.query_proj.lora_A.weight"),
            "deberta.encoder.layer.0.attention.self.query_proj.lora_A.weight"
        );
        assert_eq!(
            normalize_key("base_model.model.classifier.modules_to_save.default.weight"),
            "classifier.weight"
        );
        assert_eq!(
            normalize_key("base_model.model.layer.lora_B.default.weight"),
            "layer.lora_B.weight"
        );
        assert_eq!(normalize_key("classifier.bias"), "classifier.bias");
    }

    #[test]
    fn test_scaling() {
        assert_eq!(config(8, 16.0).scaling(), 2.0);
        let mut rs = config(16, 32.0);
        rs.use_rslora = true;
        assert_eq!(rs.scaling(), 8.0);
    }

    #[test]
    fn test_merge_applies_scaled_low_rank_delta() {
        // W = 0 (2x3), A = [1 2 3] (1x3), B = [1; 2] (2x1), scale = 2
        let mut weights = HashMap::new();
        weights.insert("layer.weight".to_string(), Tensor::zeros((2, 3), DType::F32, &Device::Cpu).unwrap());

        let mut tensors = HashMap::new();
        tensors.insert("base_model.model.layer.lora_A.weight".to_string(), t(&[1.0, 2.0, 3.0], (1, 3)));
        tensors.insert("base_model.model.layer.lora_B.weight".to_string(), t(&[1.0, 2.0], (2, 1)));

        let adapter = LoraAdapter::from_tensors(config(1, 2.0), tensors).unwrap();
        let summary = adapter.merge_into(&mut weights).unwrap();

        assert_eq!(summary, MergeSummary { merged: 1, replaced: 0 });
        let merged = weights["layer.weight"].to_vec2::<f32>().unwrap();
        assert_eq!(merged, vec![vec![2.0, 4.0, 6.0], vec![4.0, 8.0, 12.0]]);
    }

    #[test]
    fn test_modules_to_save_replace_base() {
        let mut weights = HashMap::new();
        weights.insert("classifier.weight".to_string(), t(&[0.0; 4], (2, 2)));

        let mut tensors = HashMap::new();
        tensors.insert(
            "base_model.model.classifier.modules_to_save.default.weight".to_string(),
            t(&[1.0; 6], (3, 2)),
        );
        tensors.insert("base_model.model.classifier.bias".to_string(), Tensor::ones(3, DType::F32, &Device::Cpu).unwrap());

        let adapter = LoraAdapter::from_tensors(config(4, 8.0), tensors).unwrap();
        assert!(adapter.replaces("classifier.weight"));

        let summary = adapter.merge_into(&mut weights).unwrap();
        assert_eq!(summary, MergeSummary { merged: 0, replaced: 2 });
        assert_eq!(weights["classifier.weight"].dims(), &[3, 2]);
        assert!(weights.contains_key("classifier.bias"));
    }

    #[test]
    fn test_missing_target_is_error() {
        let mut weights = HashMap::new();
        let mut tensors = HashMap::new();
        tensors.insert("missing.lora_A.weight".to_string(), t(&[1.0, 1.0], (1, 2)));
        tensors.insert("missing.lora_B.weight".to_string(), t(&[1.0, 1.0], (2, 1)));

        let adapter = LoraAdapter::from_tensors(config(1, 1.0), tensors).unwrap();
        let err = adapter.merge_into(&mut weights).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_unpaired_lora_is_error() {
        let mut weights = HashMap::new();
        weights.insert("layer.weight".to_string(), t(&[0.0; 4], (2, 2)));
        let mut tensors = HashMap::new();
        tensors.insert("layer.lora_A.weight".to_string(), t(&[1.0, 1.0], (1, 2)));

        let adapter = LoraAdapter::from_tensors(config(1, 1.0), tensors).unwrap();
        let err = adapter.merge_into(&mut weights).unwrap_err();
        assert!(err.to_string().contains("missing lora_B"));
    }

    #[test]
    fn test_shape_mismatch_is_error() {
        let mut weights = HashMap::new();
        weights.insert("layer.weight".to_string(), t(&[0.0; 4], (2, 2)));
        let mut tensors = HashMap::new();
        tensors.insert("layer.lora_A.weight".to_string(), t(&[1.0, 1.0, 1.0], (1, 3)));
        tensors.insert("layer.lora_B.weight".to_string(), t(&[1.0, 1.0], (2, 1)));

        let adapter = LoraAdapter::from_tensors(config(1, 1.0), tensors).unwrap();
        assert!(adapter.merge_into(&mut weights).is_err());
    }

    #[test]
    fn test_rejects_non_lora_adapters() {
        let mut cfg = config(1, 1.0);
        cfg.peft_type = "IA3".to_string();
        let mut tensors = HashMap::new();
        tensors.insert("classifier.weight".to_string(), t(&[1.0; 4], (2, 2)));
        assert!(LoraAdapter::from_tensors(cfg, tensors).is_err());
    }

    #[test]
    fn test_rejects_unknown_lora_tensors() {
        let mut tensors = HashMap::new();
        tensors.insert("layer.lora_magnitude_vector".to_string(), t(&[1.0, 1.0], (1, 2)));
        assert!(LoraAdapter::from_tensors(config(1, 1.0), tensors).is_err());
    }

    #[test]
    fn test_load_from_directory() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(CONFIG_FILE),
            r#"{"peft_type": "LORA", "r": 1, "lora_alpha": 1, "task_type": "SEQ_CLS",
               "target_modules": ["query_proj", "value_proj"], "modules_to_save": ["classifier", "score"]}"#,
        )
        .unwrap();

        let mut tensors = HashMap::new();
        tensors.insert("base_model.model.layer.lora_A.weight".to_string(), t(&[1.0, 0.0], (1, 2)));
        tensors.insert("base_model.model.layer.lora_B.weight".to_string(), t(&[0.5, 0.5], (2, 1)));
        candle_core::safetensors::save(&tensors, tmp.path().join(SAFETENSORS_FILE)).unwrap();

        let adapter = LoraAdapter::load(tmp.path(), &Device::Cpu).unwrap();
        assert_eq!(adapter.target_modules().collect::<Vec<_>>(), vec!["layer"]);

        let mut weights = HashMap::new();
        weights.insert("layer.weight".to_string(), t(&[1.0, 1.0, 1.0, 1.0], (2, 2)));
        adapter.merge_into(&mut weights).unwrap();
        assert_eq!(
            weights["layer.weight"].to_vec2::<f32>().unwrap(),
            vec![vec![1.5, 1.0], vec![1.5, 1.0]]
        );
    }

    #[test]
    fn test_missing_directory_and_weights() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        let err = LoraAdapter::load(&missing, &Device::Cpu).err().unwrap();
        assert!(err.to_string().contains("Adapter directory not found"));

        std::fs::write(tmp.path().join(CONFIG_FILE), r#"{"r": 4, "lora_alpha": 8}"#).unwrap();
        let err = LoraAdapter::load(tmp.path(), &Device::Cpu).err().unwrap();
        assert!(err.to_string().contains("No adapter weights"));
    }
}
