//! PaperClass Model
//!
//! Sequence classifier assigning arXiv abstracts to one of eleven subject
//! categories.
//!
//! The model is `microsoft/deberta-v3-small` fine-tuned with a LoRA adapter.
//! Loading resolves the base checkpoint (local directory or HuggingFace hub),
//! folds the adapter's low-rank updates into the base weights and builds a
//! plain Candle DeBERTa-v2 graph, so inference pays nothing for the adapter.
//!
//! ```no_run
//! use paperclass_model::prelude::*;
//!
//! let classifier = LoadedClassifier::load(&ModelSpec::default())?;
//! let prediction = classifier.classify("We study ideals of Noetherian rings.")?;
//! println!("{} ({:.2})", prediction.label, prediction.confidence);
//! # Ok::<(), paperclass_core::Error>(())
//! ```

pub mod adapter;
pub mod classifier;
pub mod config;
pub mod deberta;
pub mod device;
pub mod model_loader;
pub mod tokenize;
pub mod weights;

pub use adapter::{AdapterConfig, LoraAdapter, MergeSummary};
pub use classifier::{Prediction, TextClassifier};
pub use config::{
    ModelSpec, DEFAULT_ADAPTER_DIR, DEFAULT_BASE_MODEL, DEFAULT_MAX_LENGTH, DEFAULT_TOKENIZER_REPO,
};
pub use device::{select_device, DeviceSpec};
pub use model_loader::LoadedClassifier;
pub use tokenize::{EncodedText, TextEncoder};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::{Prediction, TextClassifier};
    pub use crate::config::ModelSpec;
    pub use crate::device::DeviceSpec;
    pub use crate::model_loader::LoadedClassifier;
}
