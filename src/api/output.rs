//! Generated artifact downloads

use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use uuid::Uuid;

use super::{ApiState, render};
use crate::deck::{is_plain_file_name, record};
use crate::pipeline::Workspace;

const DECK_NOT_FOUND: &str = "File not found. Please generate cards first.";

/// Build output router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/output/{request_id}", get(download_deck))
        .route("/audio/{request_id}/{file}", get(audio_clip))
        .with_state(state)
}

fn workspace(state: &ApiState, request_id: &str) -> Option<Workspace> {
    let id = Uuid::parse_str(request_id).ok()?;
    Some(Workspace::open(&state.requests_dir, id))
}

/// Download the `.apkg` produced by a request
async fn download_deck(
    State(state): State<Arc<ApiState>>,
    Path(request_id): Path<String>,
) -> Response {
    let Some(workspace) = workspace(&state, &request_id) else {
        return (StatusCode::NOT_FOUND, DECK_NOT_FOUND).into_response();
    };

    let archive = match tokio::fs::read(workspace.archive_path()).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return (StatusCode::NOT_FOUND, DECK_NOT_FOUND).into_response();
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "failed to read deck");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error downloading file").into_response();
        }
    };

    let record_path = workspace.record_path();
    let deck_name = match tokio::task::spawn_blocking(move || record::load(&record_path)).await {
        Ok(Ok(record)) => record.deck_name,
        Ok(Err(e)) => {
            tracing::warn!(request_id = %request_id, error = %e, "deck record unreadable");
            "deck".to_string()
        }
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "deck record task failed");
            "deck".to_string()
        }
    };

    let disposition = format!(
        "attachment; filename=\"{}\"",
        render::download_name(&deck_name)
    );

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        archive,
    )
        .into_response()
}

/// Serve one generated audio clip for preview
async fn audio_clip(
    State(state): State<Arc<ApiState>>,
    Path((request_id, file)): Path<(String, String)>,
) -> Response {
    let Some(workspace) = workspace(&state, &request_id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if !is_plain_file_name(&file) {
        return StatusCode::NOT_FOUND.into_response();
    }

    match tokio::fs::read(workspace.audio_dir().join(&file)).await {
        Ok(audio) => (StatusCode::OK, [(header::CONTENT_TYPE, "audio/mpeg")], audio).into_response(),
        Err(e) => {
            tracing::debug!(request_id = %request_id, file = %file, error = %e, "audio clip unavailable");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}
