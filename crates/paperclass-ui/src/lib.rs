//! PaperClass UI
//!
//! A single-page form for the abstract classifier. The page posts to this
//! server, which forwards the text to the inference service and returns a
//! rendered outcome, so the browser never talks to the service directly.

pub mod cli;
pub mod client;
pub mod render;
pub mod server;

pub use cli::*;
pub use client::{ClassifierClient, ClientError, SubmitOutcome, DEFAULT_TIMEOUT};
pub use render::{format_confidence, render, OutcomeKind, RenderedOutcome};
pub use server::*;
