use axum::http::{HeaderValue, Method};
use domain::PosterStore;
use log::*;
use service::config::Config;
use sse::Manager;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

mod controller;
mod error;
pub mod router;
mod stream;

pub use error::{Error, Result};

// Web-level state: infrastructure from `service` plus the process-local
// broadcast registry and poster state. Cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub service_state: service::AppState,
    pub sse_manager: Arc<Manager>,
    pub poster_store: Arc<PosterStore>,
}

impl AppState {
    pub fn new(service_state: service::AppState) -> Self {
        Self {
            service_state,
            sse_manager: Arc::new(Manager::new()),
            poster_store: Arc::new(PosterStore::new()),
        }
    }

    pub fn config(&self) -> &Config {
        self.service_state.config()
    }
}

pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let config = app_state.config();
    let server_url = format!("{}:{}", config.interface(), config.port);

    info!(
        "Server starting... listening for connections on http://{server_url} ({} mode)",
        config.runtime_env()
    );

    let listener = TcpListener::bind(&server_url).await?;
    let sse_manager = Arc::clone(&app_state.sse_manager);

    axum::serve(listener, router::define_routes(app_state))
        .with_graceful_shutdown(shutdown_signal(sse_manager))
        .await
}

pub(crate) fn cors_layer(config: &Config) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if config.allows_any_origin() {
        if config.is_production() {
            warn!("CORS allows any origin in production; set ALLOWED_ORIGINS to restrict it");
        }
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.trim().parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {origin}: {e}");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

// Open SSE streams never finish on their own, so they are closed before the
// server waits for in-flight connections to drain.
async fn shutdown_signal(sse_manager: Arc<Manager>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
    sse_manager.shutdown();
}
