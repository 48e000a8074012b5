//! HTTP request handlers

use crate::api::server::AppContext;
use crate::error::Error;
use crate::playback::TransportStatus;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use musicshell_common::events::PlaybackState;
use musicshell_common::SongInfoDto;
use serde::Serialize;
use tracing::{debug, error};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
    git_hash: String,
    build_timestamp: String,
    build_profile: String,
    playback_state: PlaybackState,
}

/// Body of every transport response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    error: String,
}

impl Error {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::IndexOutOfRange { .. } => StatusCode::BAD_REQUEST,
            Error::EmptyPlaylist | Error::NoCurrentSong => StatusCode::NOT_FOUND,
            Error::NotSupported(_) => StatusCode::NOT_IMPLEMENTED,
            Error::LockTimeout(_) | Error::Disposed => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to the client; internal causes stay in the log
    fn public_message(&self) -> String {
        match self {
            Error::PlaylistRead { .. } => "Failed to read playlist".to_string(),
            other if other.status_code() == StatusCode::INTERNAL_SERVER_ERROR => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            debug!("Request rejected: {}", self);
        }
        let error = self.public_message();
        (status, Json(ErrorResponse { error })).into_response()
    }
}

/// HTTP status for a transport result
pub fn transport_status_code(status: &TransportStatus) -> StatusCode {
    match status {
        TransportStatus::Busy | TransportStatus::ShutDown => StatusCode::SERVICE_UNAVAILABLE,
        TransportStatus::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::OK,
    }
}

fn transport_response(status: TransportStatus) -> (StatusCode, Json<MessageResponse>) {
    (
        transport_status_code(&status),
        Json(MessageResponse {
            message: status.to_string(),
        }),
    )
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health
pub async fn health(State(ctx): State<AppContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "musicshell-player".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("GIT_HASH").to_string(),
        build_timestamp: env!("BUILD_TIMESTAMP").to_string(),
        build_profile: env!("BUILD_PROFILE").to_string(),
        playback_state: ctx.controller.playback_state(),
    })
}

// ============================================================================
// Song Queries
// ============================================================================

/// GET /api/music/songs
pub async fn get_all_songs(
    State(ctx): State<AppContext>,
) -> Result<Json<Vec<SongInfoDto>>, Error> {
    let songs = ctx.controller.all_songs().await?;
    Ok(Json(songs.iter().map(SongInfoDto::from).collect()))
}

/// GET /api/music/songs/:index
pub async fn get_song_info(
    State(ctx): State<AppContext>,
    Path(index): Path<i64>,
) -> Result<Json<SongInfoDto>, Error> {
    let song = ctx.controller.song_info(index).await?;
    Ok(Json(song.to_dto()))
}

/// GET /api/music/list
pub async fn list_songs(State(ctx): State<AppContext>) -> Result<Json<Vec<String>>, Error> {
    Ok(Json(ctx.controller.list_songs().await?))
}

/// GET /api/music/current
pub async fn current_song(State(ctx): State<AppContext>) -> Result<Json<SongInfoDto>, Error> {
    let song = ctx.controller.current_song().await?;
    Ok(Json(song.to_dto()))
}

// ============================================================================
// Transport
// ============================================================================

/// POST /api/music/play
pub async fn play(State(ctx): State<AppContext>) -> impl IntoResponse {
    transport_response(ctx.controller.play().await)
}

/// POST /api/music/pause
pub async fn pause(State(ctx): State<AppContext>) -> impl IntoResponse {
    transport_response(ctx.controller.pause())
}

/// POST /api/music/stop
pub async fn stop(State(ctx): State<AppContext>) -> impl IntoResponse {
    transport_response(ctx.controller.stop().await)
}

/// POST /api/music/next
pub async fn next(State(ctx): State<AppContext>) -> impl IntoResponse {
    transport_response(ctx.controller.next().await)
}

/// POST /api/music/previous
pub async fn previous(State(ctx): State<AppContext>) -> impl IntoResponse {
    transport_response(ctx.controller.previous().await)
}
