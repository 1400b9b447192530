//! DeBERTa-v3 encoder with a context pooler and linear classification head

use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{Linear, VarBuilder};
use candle_transformers::models::debertav2::{Config, DebertaV2ContextPooler, DebertaV2Model};
use paperclass_core::{Error, Result};
use std::collections::HashMap;

const POOLER_WEIGHT: &str = "pooler.dense.weight";
const POOLER_BIAS: &str = "pooler.dense.bias";
const HEAD_WEIGHT: &str = "classifier.weight";
const HEAD_BIAS: &str = "classifier.bias";

/// `deberta.*` encoder, `pooler.dense.*` and `classifier.*`, matching the
/// layout of HuggingFace sequence-classification checkpoints.
pub struct DebertaSequenceClassifier {
    encoder: DebertaV2Model,
    pooler: DebertaV2ContextPooler,
    classifier: Linear,
    device: Device,
    num_labels: usize,
}

impl DebertaSequenceClassifier {
    /// Build the model from a complete (already merged) weight map
    pub fn load(
        mut weights: HashMap<String, Tensor>,
        config: &Config,
        num_labels: usize,
        device: &Device,
    ) -> Result<Self> {
        let size = config.pooler_hidden_size.unwrap_or(config.hidden_size);
        ensure_pooler(&mut weights, size, config.initializer_range, device)?;
        check_head(&weights, size, num_labels)?;

        let vb = VarBuilder::from_tensors(weights, DType::F32, device);

        let encoder = DebertaV2Model::load(vb.pp("deberta"), config)
            .map_err(|e| Error::model_load(format!("Failed to load DeBERTa encoder: {}", e)))?;
        let pooler = DebertaV2ContextPooler::load(vb.pp("pooler"), config)
            .map_err(|e| Error::model_load(format!("Failed to load pooler: {}", e)))?;
        let output_dim = pooler
            .output_dim()
            .map_err(|e| Error::model_load(format!("Failed to read pooler size: {}", e)))?;
        let classifier = candle_nn::linear(output_dim, num_labels, vb.pp("classifier"))
            .map_err(|e| Error::model_load(format!("Failed to load classifier head: {}", e)))?;

        Ok(Self {
            encoder,
            pooler,
            classifier,
            device: device.clone(),
            num_labels,
        })
    }

    /// Logits of shape `[batch, num_labels]`
    pub fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: &Tensor,
    ) -> candle_core::Result<Tensor> {
        let hidden = self.encoder.forward(
            input_ids,
            Some(token_type_ids.clone()),
            Some(attention_mask.clone()),
        )?;
        let pooled = self.pooler.forward(&hidden)?;
        self.classifier.forward(&pooled)
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn num_labels(&self) -> usize {
        self.num_labels
    }
}

/// Initialise the pooler the way an untrained HuggingFace head would be if
/// neither the base checkpoint nor the adapter carries one.
pub(crate) fn ensure_pooler(
    weights: &mut HashMap<String, Tensor>,
    size: usize,
    std: f64,
    device: &Device,
) -> Result<bool> {
    if weights.contains_key(POOLER_WEIGHT) && weights.contains_key(POOLER_BIAS) {
        return Ok(false);
    }

    tracing::warn!(
        "Checkpoint has no pooler weights, initializing a {}x{} pooler (std={}). \
         Predictions depend on this random initialisation.",
        size,
        size,
        std
    );

    let weight = Tensor::randn(0f32, std as f32, (size, size), device)
        .map_err(|e| Error::model_load(format!("Failed to init pooler weights: {}", e)))?;
    let bias = Tensor::zeros(size, DType::F32, device)
        .map_err(|e| Error::model_load(format!("Failed to init pooler bias: {}", e)))?;

    weights.insert(POOLER_WEIGHT.to_string(), weight);
    weights.insert(POOLER_BIAS.to_string(), bias);
    Ok(true)
}

/// The classification head must come from the checkpoint or adapter with
/// exactly `num_labels` outputs. A random head would make every prediction
/// meaningless, so it is never synthesised.
pub(crate) fn check_head(
    weights: &HashMap<String, Tensor>,
    input_dim: usize,
    num_labels: usize,
) -> Result<()> {
    let weight = weights.get(HEAD_WEIGHT).ok_or_else(|| {
        Error::model_load(format!(
            "No classification head in checkpoint or adapter ({} missing)",
            HEAD_WEIGHT
        ))
    })?;
    if weight.dims() != [num_labels, input_dim] {
        return Err(Error::model_load(format!(
            "Classification head has shape {:?}, expected [{}, {}]",
            weight.dims(),
            num_labels,
            input_dim
        )));
    }

    let bias = weights
        .get(HEAD_BIAS)
        .ok_or_else(|| Error::model_load(format!("{} missing", HEAD_BIAS)))?;
    if bias.dims() != [num_labels] {
        return Err(Error::model_load(format!(
            "Classification bias has shape {:?}, expected [{}]",
            bias.dims(),
            num_labels
        )));
    }

    Ok(())
}
