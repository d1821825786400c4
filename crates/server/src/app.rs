//! Axum application builder.
//!
//! Configures routes, middleware, and state for the server.
//!
//! # Routes
//!
//! - `GET  /health` - Liveness probe
//! - `POST /predict` - Next-day close from the last 7 closes
//! - `GET  /get_stock_data` - Chart history for a registered ticker
//! - `GET  /api/models` - Registered models and metrics
//! - everything else - static files from `static_dir`, when configured

use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::routes::{chart, health, models, predict};
use crate::state::ServerState;

/// Create the Axum application with all routes.
pub fn create_app(state: ServerState, static_dir: Option<&Path>) -> Router {
    // CORS layer for frontend development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    let mut router = Router::new()
        .route("/health", get(health::health))
        .route("/predict", post(predict::predict))
        .route("/get_stock_data", get(chart::get_stock_data))
        .route("/api/models", get(models::get_models));

    if let Some(dir) = static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until the process receives Ctrl-C.
pub async fn serve(config: &ServerConfig, state: ServerState) -> std::io::Result<()> {
    let app = create_app(state, config.static_dir.as_deref());
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            // Without a signal handler the server runs until killed.
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        })
        .await
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Port to listen on.
    pub port: u16,
    /// Host to bind to.
    pub host: String,
    /// Directory served for non-API paths.
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            host: "0.0.0.0".into(),
            static_dir: None,
        }
    }
}

impl ServerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let port = std::env::var("PREDICTOR_SERVER_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5000);

        let host = std::env::var("PREDICTOR_SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let static_dir = std::env::var_os("PREDICTOR_STATIC_DIR").map(PathBuf::from);

        Self {
            port,
            host,
            static_dir,
        }
    }

    /// Get bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
