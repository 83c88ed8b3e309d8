//! Brain endpoints: document ingestion and knowledge-grounded questions.

use crate::agents::run;
use crate::error::ApiError;
use crate::SharedState;
use aura_core::decision::default_user;
use axum::Json;
use axum::extract::{Multipart, State};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

/// `POST /api/brain/upload`: multipart with a `file` part and an optional
/// `user_id` text part.
pub async fn upload(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut user_id = default_user();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        match field.name() {
            Some("file") => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| ApiError::BadRequest("File part has no filename".into()))?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {e}")))?;
                file = Some((filename, bytes.to_vec()));
            }
            Some("user_id") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid user_id: {e}")))?;
                if !text.trim().is_empty() {
                    user_id = text.trim().to_string();
                }
            }
            _ => {}
        }
    }

    let (filename, bytes) = file.ok_or_else(|| ApiError::BadRequest("Missing 'file' part".into()))?;
    info!(file = %filename, bytes = bytes.len(), user = %user_id, "Upload received");

    let report = state.ingestor.ingest(&filename, bytes, &user_id).await?;
    Ok(Json(report.to_json()))
}

#[derive(Debug, Deserialize)]
pub struct DocumentRequest {
    pub content: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_user")]
    pub user_id: String,
}

/// `POST /api/brain/documents`: ingest text that is already extracted.
pub async fn documents(
    State(state): State<SharedState>,
    Json(req): Json<DocumentRequest>,
) -> Result<Json<Value>, ApiError> {
    let source = req
        .source
        .unwrap_or_else(|| format!("note-{}", uuid::Uuid::new_v4()));
    let category = req.category.as_deref().unwrap_or("text");

    let report = state
        .ingestor
        .ingest_text(&source, &req.content, &req.user_id, category)
        .await?;
    Ok(Json(report.to_json()))
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default = "default_user")]
    pub user_id: String,
}

/// `POST /api/brain/query`: answer from the caller's documents via the
/// grounded agent. A missing knowledge store is an error here, not a
/// silent degrade.
pub async fn query(
    State(state): State<SharedState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<Value>, ApiError> {
    run(&state, "brain", &req.query, &req.user_id).await
}
