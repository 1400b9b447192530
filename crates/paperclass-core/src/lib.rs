//! PaperClass Core
//!
//! Types shared by every PaperClass component.
//!
//! This crate provides:
//! - The error type and result alias used by the library crates
//! - Request/response bodies of the classification HTTP API
//! - The fixed bijection between class indices and category names

pub mod error;
pub mod labels;
pub mod types;

pub use error::{Error, Result};
pub use labels::{LabelMap, CATEGORY_LABELS, NUM_CATEGORIES};
pub use types::{ClassificationRequest, ClassificationResponse, ErrorBody, ServiceInfo};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::labels::{LabelMap, CATEGORY_LABELS};
    pub use crate::types::{ClassificationRequest, ClassificationResponse};
}
