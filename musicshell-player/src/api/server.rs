//! HTTP server setup and routing

use crate::error::{Error, Result};
use crate::playback::PlaybackController;
use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};
use tracing::info;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub controller: Arc<PlaybackController>,
}

/// Build the router
///
/// Music routes live under `/api/music`; `/health` and `/events` sit at the
/// root.
pub fn create_router(ctx: AppContext) -> Router {
    let music = Router::new()
        .route("/songs", get(super::handlers::get_all_songs))
        .route("/songs/:index", get(super::handlers::get_song_info))
        .route("/play", post(super::handlers::play))
        .route("/pause", post(super::handlers::pause))
        .route("/stop", post(super::handlers::stop))
        .route("/next", post(super::handlers::next))
        .route("/previous", post(super::handlers::previous))
        .route("/list", get(super::handlers::list_songs))
        .route("/current", get(super::handlers::current_song));

    Router::new()
        .route("/health", get(super::handlers::health))
        .route("/events", get(super::sse::event_stream))
        .nest("/api/music", music)
        .with_state(ctx)
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .layer(CorsLayer::permissive())
}

/// Serve the API on `port` until `shutdown` resolves
pub async fn run<F>(port: u16, ctx: AppContext, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    info!("HTTP server stopped");
    Ok(())
}
