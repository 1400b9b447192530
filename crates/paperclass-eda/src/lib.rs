//! PaperClass EDA
//!
//! One-shot exploratory analysis of a labeled abstract dataset: load a slice
//! of records, derive length features, print summary statistics and render
//! four PNG charts.

pub mod charts;
pub mod cli;
pub mod dataset;
pub mod stats;

pub use charts::{render_all, ChartSet};
pub use dataset::{load_records, DatasetSource, Record};
pub use stats::{describe, pearson, value_counts, Describe, Features};
