//! HTTP API server for vocab-deck

pub mod generate;
pub mod health;
pub mod output;
pub mod render;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::response::Html;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::config::Config;
use crate::pipeline::Pipeline;

/// Upload form served at `/` when no static directory is configured
const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// Room for the non-file form fields on top of the upload limit
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub pipeline: Pipeline,
    pub requests_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl ApiState {
    #[must_use]
    pub fn new(pipeline: Pipeline, max_upload_bytes: usize) -> Self {
        Self {
            requests_dir: pipeline.requests_dir().to_path_buf(),
            pipeline,
            max_upload_bytes,
        }
    }
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
    static_dir: Option<PathBuf>,
}

impl ApiServer {
    #[must_use]
    pub fn new(state: ApiState, port: u16) -> Self {
        Self {
            state: Arc::new(state),
            port,
            static_dir: None,
        }
    }

    /// Create a server wired from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the outbound HTTP client cannot be built
    pub fn from_config(config: &Config) -> Result<Self> {
        let pipeline = Pipeline::from_config(config)?;
        let state = ApiState::new(pipeline, config.server.max_upload_bytes);
        Ok(Self::new(state, config.server.port).static_dir(config.server.static_dir.clone()))
    }

    /// Serve the web UI from a directory instead of the embedded form
    #[must_use]
    pub fn static_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.static_dir = dir;
        self
    }

    /// Build the router with all routes
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .merge(generate::router(self.state.clone()))
            .merge(output::router(self.state.clone()))
            .merge(health::router());

        // Serve static files if configured
        if let Some(static_dir) = &self.static_dir {
            let index_file = static_dir.join("index.html");
            let serve_dir = ServeDir::new(static_dir).not_found_service(ServeFile::new(&index_file));

            router = router.fallback_service(serve_dir);
            tracing::info!(path = %static_dir.display(), "serving static files");
        } else {
            router = router.route("/", get(|| async { Html(INDEX_HTML) }));
        }

        let body_limit = DefaultBodyLimit::max(self.state.max_upload_bytes + FORM_OVERHEAD_BYTES);

        // CORS layer for cross-origin requests from frontend
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        router
            .layer(body_limit)
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        match self.state.pipeline.sweep_expired().await {
            Ok(removed) => tracing::debug!(removed, "startup workspace sweep"),
            Err(e) => tracing::warn!(error = %e, "startup workspace sweep failed"),
        }

        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(
            port = self.port,
            requests_dir = %self.state.requests_dir.display(),
            "API server listening"
        );

        axum::serve(listener, self.router())
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }

    /// Run the API server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}
