//! PaperClass Server
//!
//! HTTP inference service for the academic abstract classifier.
//!
//! The listener comes up immediately; the model loads on a blocking task in
//! the background. Until it is ready `POST /predict` answers 503 with
//! `{"detail": "Model not loaded"}`, and `GET /health/ready` reports the
//! loading state.

pub mod cli;
pub mod config;
pub mod loader;
pub mod routes;
pub mod state;

pub use cli::Cli;
pub use config::ServerConfig;
pub use loader::{load_model, load_with};
pub use routes::{create_router, AppError};
pub use state::{AppState, NotReady, Readiness, ServiceState};
