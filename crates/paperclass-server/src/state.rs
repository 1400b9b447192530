//! Service readiness and shared application state

use metrics_exporter_prometheus::PrometheusHandle;
use paperclass_core::{Error, Result};
use paperclass_model::TextClassifier;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Lifecycle of the model inside one process.
///
/// `Uninitialized -> Loading -> Ready | Failed`. There is no way back
/// without a restart.
#[derive(Clone, Default)]
pub enum ServiceState {
    #[default]
    Uninitialized,
    Loading,
    Ready(Arc<dyn TextClassifier>),
    Failed(String),
}

impl ServiceState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Loading => "loading",
            Self::Ready(_) => "ready",
            Self::Failed(_) => "failed",
        }
    }

    fn can_move_to(&self, next: &ServiceState) -> bool {
        matches!(
            (self, next),
            (Self::Uninitialized, Self::Loading)
                | (Self::Loading, Self::Ready(_))
                | (Self::Loading, Self::Failed(_))
        )
    }
}

impl fmt::Debug for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(classifier) => write!(f, "Ready({})", classifier.name()),
            Self::Failed(reason) => write!(f, "Failed({})", reason),
            other => f.write_str(other.name()),
        }
    }
}

/// Why a classification request cannot be served
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotReady {
    #[error("Model not loaded")]
    NotLoaded,

    #[error("Model failed to load: {0}")]
    Failed(String),
}

/// Shared handle on the service state
#[derive(Clone, Default)]
pub struct Readiness {
    inner: Arc<RwLock<ServiceState>>,
}

impl Readiness {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle that starts out ready; used when the classifier is built up front
    pub fn ready(classifier: Arc<dyn TextClassifier>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ServiceState::Ready(classifier))),
        }
    }

    pub fn begin_loading(&self) -> Result<()> {
        self.transition(ServiceState::Loading)
    }

    pub fn mark_ready(&self, classifier: Arc<dyn TextClassifier>) -> Result<()> {
        self.transition(ServiceState::Ready(classifier))
    }

    pub fn mark_failed(&self, reason: impl Into<String>) -> Result<()> {
        self.transition(ServiceState::Failed(reason.into()))
    }

    fn transition(&self, next: ServiceState) -> Result<()> {
        let mut state = self.inner.write();
        if !state.can_move_to(&next) {
            return Err(Error::state(format!(
                "cannot move from {} to {}",
                state.name(),
                next.name()
            )));
        }
        tracing::debug!("Service state {} -> {}", state.name(), next.name());
        *state = next;
        Ok(())
    }

    /// Snapshot of the current state
    pub fn current(&self) -> ServiceState {
        self.inner.read().clone()
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.inner.read(), ServiceState::Ready(_))
    }

    /// The loaded classifier, if the service is ready
    pub fn classifier(&self) -> std::result::Result<Arc<dyn TextClassifier>, NotReady> {
        match &*self.inner.read() {
            ServiceState::Ready(classifier) => Ok(Arc::clone(classifier)),
            ServiceState::Failed(reason) => Err(NotReady::Failed(reason.clone())),
            ServiceState::Uninitialized | ServiceState::Loading => Err(NotReady::NotLoaded),
        }
    }
}

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    /// Model lifecycle
    pub readiness: Readiness,

    /// Prometheus metrics handle for rendering; absent when no recorder is installed
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(readiness: Readiness, metrics_handle: Option<PrometheusHandle>) -> Self {
        Self {
            readiness,
            metrics_handle,
        }
    }
}
