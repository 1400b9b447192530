//! Classifier trait and common types

use paperclass_core::{ClassificationResponse, Error, LabelMap, Result};

/// Trait for anything that maps text to one of the arXiv categories.
///
/// Implementations are immutable after construction and are shared across
/// request handlers behind an `Arc`. `classify` is synchronous and may be
/// expensive; async callers should run it on a blocking thread.
pub trait TextClassifier: Send + Sync {
    /// Classify the given text
    fn classify(&self, text: &str) -> Result<Prediction>;

    /// Get the classifier name
    fn name(&self) -> &str;

    /// Label set the classifier predicts over
    fn labels(&self) -> &'static LabelMap {
        LabelMap::arxiv()
    }
}

/// Result of classification
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Category name of the most probable class
    pub label: String,

    /// Index of the most probable class
    pub class_index: usize,

    /// Probability of the most probable class (0.0-1.0)
    pub confidence: f32,

    /// Full probability distribution in class-index order
    pub probabilities: Vec<f32>,

    /// Number of tokens fed to the model after truncation
    pub token_count: usize,
}

impl Prediction {
    /// Select the most probable class from a probability vector.
    ///
    /// Ties resolve to the lowest index. NaN entries never win.
    pub fn from_probabilities(
        probabilities: Vec<f32>,
        labels: &LabelMap,
        token_count: usize,
    ) -> Result<Self> {
        if probabilities.len() != labels.len() {
            return Err(Error::inference(format!(
                "model produced {} scores for {} labels",
                probabilities.len(),
                labels.len()
            )));
        }

        let (class_index, confidence) = probabilities
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, p)| !p.is_nan())
            .fold(None, |best: Option<(usize, f32)>, (idx, p)| match best {
                Some((_, best_p)) if best_p >= p => best,
                _ => Some((idx, p)),
            })
            .ok_or_else(|| Error::inference("model produced no finite scores"))?;

        let label = labels
            .label(class_index)
            .ok_or_else(|| Error::inference(format!("no label for class {}", class_index)))?;

        Ok(Self {
            label: label.to_string(),
            class_index,
            confidence: confidence.clamp(0.0, 1.0),
            probabilities,
            token_count,
        })
    }

    /// Scores paired with their category names
    pub fn scores<'a>(&'a self, labels: &'a LabelMap) -> impl Iterator<Item = (&'static str, f32)> + 'a {
        labels
            .iter()
            .map(move |(idx, name)| (name, self.probabilities.get(idx).copied().unwrap_or(0.0)))
    }
}

impl From<Prediction> for ClassificationResponse {
    fn from(prediction: Prediction) -> Self {
        Self {
            label: prediction.label,
            confidence: f64::from(prediction.confidence),
        }
    }
}
