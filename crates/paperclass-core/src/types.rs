//! Request and response bodies of the classification API

use serde::{Deserialize, Serialize};

/// Body of `POST /predict`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRequest {
    /// Free-form text; truncated by the tokenizer, never by the API
    pub text: String,
}

impl ClassificationRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Successful response of `POST /predict`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResponse {
    /// One of the category names in [`crate::LabelMap`]
    pub label: String,

    /// Probability of `label`, in [0, 1]
    pub confidence: f64,
}

/// Body of `GET /`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub status: String,
    pub message: String,
}

impl ServiceInfo {
    pub fn running() -> Self {
        Self {
            status: "ok".to_string(),
            message: "Academic Abstract Classifier API is running".to_string(),
        }
    }
}

/// Error body returned by the service for non-2xx responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl ErrorBody {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}
