use crate::client::ClassifierClient;
use crate::server::{routes, static_files};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared state of the front end
#[derive(Clone)]
pub struct UiState {
    pub client: Arc<ClassifierClient>,
}

impl UiState {
    pub fn new(client: ClassifierClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

/// Build the Axum application
pub fn build_app(client: ClassifierClient) -> Router {
    let state = UiState::new(client);

    let api_routes = Router::new()
        .route("/health", get(routes::health))
        .route("/classify", post(routes::classify))
        .layer(DefaultBodyLimit::disable());

    Router::new()
        .nest("/api", api_routes)
        .fallback(static_files::serve_static)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the server
pub async fn run_server(client: ClassifierClient, addr: SocketAddr) -> anyhow::Result<()> {
    let api_url = client.api_url().to_string();
    let app = build_app(client);

    tracing::info!("Starting PaperClass UI on {}", addr);
    tracing::info!("Forwarding classifications to {}", api_url);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
