//! End-to-end loading of the fine-tuned abstract classifier
//!
//! Loading runs once, synchronously, and takes seconds to minutes (hub
//! downloads on first start). The resulting [`LoadedClassifier`] is immutable
//! and safe to share between request handlers.

use crate::adapter::LoraAdapter;
use crate::classifier::{Prediction, TextClassifier};
use crate::config::ModelSpec;
use crate::deberta::DebertaSequenceClassifier;
use crate::device::{device_name, select_device};
use crate::tokenize::{locate_tokenizer, TextEncoder};
use crate::weights::{fetch_tokenizer, load_deberta_config, load_weights, resolve_base_model};
use candle_core::{Device, Tensor, D};
use paperclass_core::{Error, LabelMap, Result};
use std::time::Instant;

/// DeBERTa-v3 base model with a merged LoRA adapter
pub struct LoadedClassifier {
    name: String,
    encoder: TextEncoder,
    model: DebertaSequenceClassifier,
    labels: &'static LabelMap,
}

impl LoadedClassifier {
    /// Resolve, download, merge and build the classifier described by `spec`
    pub fn load(spec: &ModelSpec) -> Result<Self> {
        let start = Instant::now();
        let labels = LabelMap::arxiv();
        let adapter_dir = spec.resolved_adapter_path();

        let device = select_device(spec.device)?;

        tracing::info!("Loading base model {}...", spec.base_model);
        let base = resolve_base_model(&spec.base_model, &spec.revision)?;
        let config = load_deberta_config(&base.config)?;

        let tokenizer_path = locate_tokenizer(
            spec.tokenizer_path.as_deref(),
            &adapter_dir,
            base.tokenizer.as_deref(),
            || {
                spec.tokenizer_repo.as_deref().map(|repo| {
                    tracing::info!("{} has no tokenizer.json, falling back to {}", spec.base_model, repo);
                    fetch_tokenizer(repo, &spec.tokenizer_revision)
                })
            },
        )?;
        tracing::info!("Loading tokenizer from {}...", tokenizer_path.display());
        let encoder = TextEncoder::from_file(&tokenizer_path, spec.max_length)?;

        let mut weights = load_weights(&base, &device)?;
        tracing::debug!("Loaded {} base tensors", weights.len());

        tracing::info!("Loading adapter from {}...", adapter_dir.display());
        let adapter = LoraAdapter::load(&adapter_dir, &device)?;
        if let Some(trained_on) = &adapter.config().base_model_name_or_path {
            if trained_on != &spec.base_model {
                tracing::warn!(
                    "Adapter was trained on '{}' but base model is '{}'",
                    trained_on,
                    spec.base_model
                );
            }
        }
        let targets: Vec<&str> = adapter.target_modules().collect();
        tracing::debug!("LoRA targets ({}): {}", targets.len(), targets.join(", "));
        if !adapter.replaces("classifier.weight") {
            tracing::warn!("Adapter carries no classifier.weight; the head must come from the base checkpoint");
        }
        adapter.merge_into(&mut weights)?;

        tracing::info!("Moving model to {}...", device_name(&device));
        let model = DebertaSequenceClassifier::load(weights, &config, labels.len(), &device)?;

        tracing::info!(
            "Model loaded successfully in {:.1}s ({} labels, max_length={})",
            start.elapsed().as_secs_f64(),
            labels.len(),
            encoder.max_length()
        );

        Ok(Self {
            name: format!("{}+lora", spec.base_model),
            encoder,
            model,
            labels,
        })
    }

    pub fn device(&self) -> &Device {
        self.model.device()
    }

    fn logits_to_probabilities(logits: &Tensor) -> Result<Vec<f32>> {
        candle_nn::ops::softmax(logits, D::Minus1)
            .and_then(|p| p.squeeze(0))
            .and_then(|p| p.to_vec1::<f32>())
            .map_err(|e| Error::inference(format!("Softmax failed: {}", e)))
    }

    fn row_tensor(values: &[u32], device: &Device) -> Result<Tensor> {
        Tensor::new(values, device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(|e| Error::inference(format!("Failed to create input tensor: {}", e)))
    }
}

impl TextClassifier for LoadedClassifier {
    fn classify(&self, text: &str) -> Result<Prediction> {
        let encoded = self.encoder.encode(text)?;
        let device = self.model.device();

        let input_ids = Self::row_tensor(&encoded.ids, device)?;
        let token_type_ids = Self::row_tensor(&encoded.type_ids, device)?;
        let attention_mask = Self::row_tensor(&encoded.attention_mask, device)?;

        let logits = self
            .model
            .forward(&input_ids, &token_type_ids, &attention_mask)
            .map_err(|e| Error::inference(format!("Model forward pass failed: {}", e)))?;

        let probabilities = Self::logits_to_probabilities(&logits)?;
        let prediction = Prediction::from_probabilities(probabilities, self.labels, encoded.len())?;
        if tracing::enabled!(tracing::Level::TRACE) {
            let scores: Vec<_> = prediction.scores(self.labels).collect();
            tracing::trace!(?scores, "Class scores");
        }
        Ok(prediction)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn labels(&self) -> &'static LabelMap {
        self.labels
    }
}
