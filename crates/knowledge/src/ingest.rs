//! Brain ingestion pipeline: extract → reject empty → upsert by owner and filename.

use crate::extract::extract_text;
use aura_core::error::{IngestError, KnowledgeError};
use aura_core::knowledge::{KnowledgeRecord, KnowledgeStore};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Outcome of a successful ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    /// Store key, `{owner_id}/{source}`.
    pub key: String,
    pub source: String,
    pub category: String,
    pub chars: usize,
}

impl IngestReport {
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "status": "success",
            "message": format!("Successfully learned from {}", self.source),
            "key": self.key,
            "source": self.source,
            "category": self.category,
            "chars": self.chars,
        })
    }
}

#[derive(Clone)]
pub struct Ingestor {
    store: Arc<dyn KnowledgeStore>,
    timeout: Duration,
}

impl Ingestor {
    pub fn new(store: Arc<dyn KnowledgeStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Ingest an uploaded file. The record is keyed by owner and `filename`,
    /// so a re-upload by the same owner replaces the earlier content while
    /// another owner's file of the same name is left alone.
    pub async fn ingest(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        owner_id: &str,
    ) -> Result<IngestReport, IngestError> {
        let name = filename.to_string();
        let (kind, text) = tokio::task::spawn_blocking(move || extract_text(&name, &bytes))
            .await
            .map_err(|e| IngestError::ExtractionFailed {
                file: filename.to_string(),
                reason: format!("extractor crashed: {e}"),
            })??;

        self.store_text(filename, &text, owner_id, kind.as_str()).await
    }

    /// Ingest text that arrives already extracted.
    pub async fn ingest_text(
        &self,
        source: &str,
        content: &str,
        owner_id: &str,
        category: &str,
    ) -> Result<IngestReport, IngestError> {
        self.store_text(source, content, owner_id, category).await
    }

    async fn store_text(
        &self,
        source: &str,
        text: &str,
        owner_id: &str,
        category: &str,
    ) -> Result<IngestReport, IngestError> {
        let text = text.trim();
        if text.is_empty() {
            warn!(file = source, "Rejected document with no extractable text");
            return Err(IngestError::EmptyExtraction(source.to_string()));
        }

        let record = KnowledgeRecord::new(text, source, owner_id, category);
        let key = store_key(owner_id, source);
        let key = tokio::time::timeout(self.timeout, self.store.upsert(&key, record))
            .await
            .map_err(|_| {
                KnowledgeError::Unavailable(format!(
                    "upsert timed out after {}s",
                    self.timeout.as_secs()
                ))
            })??;

        info!(key = %key, owner = owner_id, category, chars = text.len(), "Ingested document");
        Ok(IngestReport {
            key,
            source: source.to_string(),
            category: category.to_string(),
            chars: text.chars().count(),
        })
    }
}

fn store_key(owner_id: &str, source: &str) -> String {
    format!("{owner_id}/{source}")
}
