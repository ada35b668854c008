use anyhow::{Context, Result};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod error;
mod models;
mod services;

use config::AppConfig;
use services::aggregator::Aggregator;
use services::cache::TtlCache;
use services::lookup::LookupService;
use services::sources::letterboxd::LetterboxdClient;
use services::sources::omdb::OmdbClient;
use services::sources::rotten_tomatoes::RottenTomatoesClient;
use services::sources::RatingProvider;

/// Tracks all background task handles for graceful shutdown
struct BackgroundTasks {
    handles: Vec<(&'static str, JoinHandle<()>)>,
    shutdown: CancellationToken,
}

impl BackgroundTasks {
    fn new() -> Self {
        Self {
            handles: Vec::new(),
            shutdown: CancellationToken::new(),
        }
    }

    fn token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    fn spawn<F>(&mut self, name: &'static str, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(future);
        self.handles.push((name, handle));
    }

    async fn shutdown(self) {
        tracing::info!("Initiating graceful shutdown...");

        // Signal all tasks to stop
        self.shutdown.cancel();

        // Wait for all tasks with a timeout
        for (name, handle) in self.handles {
            tracing::debug!("Waiting for {} to finish...", name);
            match tokio::time::timeout(Duration::from_secs(10), handle).await {
                Ok(Ok(())) => tracing::debug!("{} finished cleanly", name),
                Ok(Err(e)) => tracing::warn!("{} panicked: {}", name, e),
                Err(_) => tracing::warn!("{} timed out during shutdown", name),
            }
        }

        tracing::info!("All background tasks stopped");
    }
}

pub struct AppState {
    pub lookup: LookupService,
}

/// Keep panics inside handlers from leaking as bare 500s without a body
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!("Handler panicked: {}", message);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "detail": "An unexpected error occurred" })),
    )
        .into_response()
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "movie_score_aggregator=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = AppConfig::load();

    config.log_config();

    let imdb: Arc<dyn RatingProvider> = Arc::new(OmdbClient::new(
        config.omdb_api_key.clone(),
        config.source_timeout,
    ));
    let letterboxd: Arc<dyn RatingProvider> =
        Arc::new(LetterboxdClient::new(config.source_timeout));
    let rotten_tomatoes: Option<Arc<dyn RatingProvider>> = if config.enable_rotten_tomatoes {
        Some(Arc::new(RottenTomatoesClient::new(config.source_timeout)) as Arc<dyn RatingProvider>)
    } else {
        None
    };

    // The engine enforces its own deadline on top of the HTTP client timeout
    let aggregator = Aggregator::new(
        imdb,
        letterboxd,
        rotten_tomatoes,
        config.source_timeout + Duration::from_secs(1),
    );
    let cache = Arc::new(TtlCache::new(config.cache_ttl));

    let state = Arc::new(AppState {
        lookup: LookupService::new(aggregator, cache),
    });

    // Initialize background task manager with graceful shutdown support
    let mut bg_tasks = BackgroundTasks::new();
    let shutdown_token = bg_tasks.token();

    // Spawn cache sweeper with cancellation
    if let Some(interval) = config.cache_purge_interval {
        let sweep_cache = state.lookup.cache().clone();
        let cancel = shutdown_token.clone();
        bg_tasks.spawn("cache-sweeper", async move {
            tracing::info!("Cache sweeper started (interval: {:?})", interval);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::debug!("Cache sweeper received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        let removed = sweep_cache.purge_expired().await;
                        if removed > 0 {
                            tracing::info!("Purged {} expired cache entries", removed);
                        }
                    }
                }
            }
        });
    } else {
        tracing::info!("Cache sweeper disabled (interval set to 0)");
    }

    // Build router
    let app = Router::new()
        .merge(api::routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.bind_address, config.port)
        .parse()
        .with_context(|| format!("Invalid bind address '{}'", config.bind_address))?;
    tracing::info!("Starting server on {}", addr);

    // Create shutdown signal listener
    let shutdown_signal = async {
        let ctrl_c = async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
            _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
        }
    };

    // Start server with graceful shutdown
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    // After server stops, gracefully shutdown background tasks
    bg_tasks.shutdown().await;

    tracing::info!("Server shutdown complete");
    Ok(())
}
