//! Deck generation endpoint
//!
//! `POST /generate` takes a multipart form with `deckName`, `words`
//! (newline-delimited) and an optional `wordFile` upload. An uploaded file
//! takes precedence over typed words.

use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::post,
};

use super::{ApiState, render};
use crate::{Error, ingest};

/// Build generate router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/generate", post(generate))
        .with_state(state)
}

/// Uploaded word file
#[derive(Debug)]
struct Upload {
    file_name: String,
    data: Bytes,
}

/// Parsed generate form
#[derive(Debug, Default)]
struct GenerateForm {
    deck_name: String,
    words: String,
    upload: Option<Upload>,
}

async fn read_form(mut multipart: Multipart, limit: usize) -> Result<GenerateForm, GenerateError> {
    let mut form = GenerateForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| GenerateError::multipart(&e, limit))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "deckName" => {
                form.deck_name = field.text().await.map_err(|e| GenerateError::multipart(&e, limit))?;
            }
            "words" => {
                form.words = field.text().await.map_err(|e| GenerateError::multipart(&e, limit))?;
            }
            "wordFile" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(|e| GenerateError::multipart(&e, limit))?;
                // Browsers submit an empty, unnamed part when no file is chosen
                if !(file_name.is_empty() && data.is_empty()) {
                    form.upload = Some(Upload { file_name, data });
                }
            }
            other => {
                tracing::debug!(field = %other, "ignoring form field");
            }
        }
    }

    Ok(form)
}

/// Generate a deck from the submitted words
async fn generate(State(state): State<Arc<ApiState>>, multipart: Multipart) -> Result<Html<String>, GenerateError> {
    let form = read_form(multipart, state.max_upload_bytes).await?;

    let deck_name = form.deck_name.trim();
    if deck_name.is_empty() {
        return Err(GenerateError::BadRequest("Deck name is required.".to_string()));
    }

    let words = if let Some(upload) = &form.upload {
        if upload.data.len() > state.max_upload_bytes {
            return Err(GenerateError::too_large(state.max_upload_bytes));
        }
        let words = ingest::words_from_upload(&upload.file_name, &upload.data).map_err(|e| match e {
            Error::Input(msg) => GenerateError::BadRequest(msg),
            other => GenerateError::BadRequest(format!("Error reading uploaded file: {other}")),
        })?;
        if words.is_empty() {
            return Err(GenerateError::BadRequest(
                "No words found in the uploaded file. Please check the file format.".to_string(),
            ));
        }
        tracing::info!(file = %upload.file_name, words = words.len(), "read uploaded word list");
        words
    } else if !form.words.is_empty() {
        ingest::parse_lines(&form.words)
    } else {
        return Err(GenerateError::BadRequest(
            "Please either upload a file or enter words manually.".to_string(),
        ));
    };

    let outcome = state.pipeline.run(&words, deck_name).await?;

    let source = form.upload.as_ref().map(|u| u.file_name.as_str());
    Ok(Html(render::success_fragment(&outcome, source)))
}

/// Generate endpoint errors, rendered as a red HTML paragraph
#[derive(Debug)]
pub enum GenerateError {
    BadRequest(String),
    Internal(String),
}

impl GenerateError {
    fn too_large(limit: usize) -> Self {
        Self::BadRequest(format!("Uploaded file exceeds the {limit} byte limit."))
    }

    fn multipart(err: &MultipartError, limit: usize) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::too_large(limit)
        } else {
            Self::BadRequest(err.body_text())
        }
    }
}

impl From<Error> for GenerateError {
    fn from(err: Error) -> Self {
        match err {
            Error::Input(msg) => Self::BadRequest(msg),
            Error::NoCardsBuilt { .. } => Self::BadRequest(
                "No valid words could be processed. Please check your word list.".to_string(),
            ),
            other => {
                tracing::error!(error = %other, "deck generation failed");
                Self::Internal(format!("An error occurred while generating cards: {other}"))
            }
        }
    }
}

impl IntoResponse for GenerateError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Html(render::error_fragment(&message))).into_response()
    }
}
