//! Background model loading

use crate::state::Readiness;
use paperclass_core::{Error, Result};
use paperclass_model::{LoadedClassifier, ModelSpec, TextClassifier};
use std::sync::Arc;
use std::time::Instant;

/// Load the classifier described by `spec` and publish it through `readiness`
pub async fn load_model(readiness: Readiness, spec: ModelSpec) -> Result<()> {
    load_with(readiness, move || {
        let classifier = LoadedClassifier::load(&spec)?;
        Ok(Arc::new(classifier) as Arc<dyn TextClassifier>)
    })
    .await
}

/// Run `load` on the blocking pool, moving the service to READY or FAILED.
///
/// The returned error is the load failure itself; the service state has
/// already been updated when it is returned.
pub async fn load_with<F>(readiness: Readiness, load: F) -> Result<()>
where
    F: FnOnce() -> Result<Arc<dyn TextClassifier>> + Send + 'static,
{
    readiness.begin_loading()?;
    let start = Instant::now();

    let result = match tokio::task::spawn_blocking(load).await {
        Ok(result) => result,
        Err(e) => Err(Error::internal(format!("Model loading task failed: {}", e))),
    };

    match result {
        Ok(classifier) => {
            tracing::info!(
                "Classifier '{}' ready after {:.1}s",
                classifier.name(),
                start.elapsed().as_secs_f64()
            );
            metrics::gauge!("paperclass_model_ready").set(1.0);
            readiness.mark_ready(classifier)
        }
        Err(e) => {
            tracing::error!("Model failed to load: {}", e);
            metrics::gauge!("paperclass_model_ready").set(0.0);
            readiness.mark_failed(e.to_string())?;
            Err(e)
        }
    }
}
