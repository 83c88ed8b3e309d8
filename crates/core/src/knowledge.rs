//! Knowledge Store trait: ingestion and retrieval for grounding.
//!
//! Records are created on document ingestion and read during retrieval;
//! there is no update or delete path beyond upsert-by-key. Implementations
//! must be safe for concurrent ingestion and retrieval at their own
//! consistency level; callers add no locking on top.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::error::KnowledgeError;

/// A stored piece of knowledge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeRecord {
    pub content: String,

    /// Source label, usually the uploaded filename
    pub source: String,

    /// Owning user
    pub owner_id: String,

    /// Category, usually the document type ("pdf", "md", "style_guide"...)
    pub category: String,

    pub created_at: DateTime<Utc>,

    /// Relevance score (set by retrieval)
    #[serde(default)]
    pub score: f32,
}

impl KnowledgeRecord {
    pub fn new(
        content: impl Into<String>,
        source: impl Into<String>,
        owner_id: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            source: source.into(),
            owner_id: owner_id.into(),
            category: category.into(),
            created_at: Utc::now(),
            score: 0.0,
        }
    }
}

/// A retrieval query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeQuery {
    pub text: String,

    /// Restrict to one owner's records. `None` searches everything.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,

    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    5
}

impl KnowledgeQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            owner_id: None,
            limit: default_limit(),
        }
    }

    pub fn for_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// The Knowledge Store capability.
///
/// Implementations: in-memory (tests, local runs) and PostgreSQL + pgvector.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// The backend name (e.g., "in_memory", "pgvector").
    fn name(&self) -> &str;

    /// Insert or replace the record stored under `key`. Returns the key.
    async fn upsert(&self, key: &str, record: KnowledgeRecord) -> Result<String, KnowledgeError>;

    /// Records relevant to the query, best first, at most `query.limit`.
    async fn retrieve(&self, query: KnowledgeQuery) -> Result<Vec<KnowledgeRecord>, KnowledgeError>;

    /// Total number of stored records.
    async fn count(&self) -> Result<usize, KnowledgeError>;
}

/// Render retrieved records as a grounding block for a system prompt.
/// Returns an empty string when there is nothing to ground on.
pub fn format_grounding(records: &[KnowledgeRecord]) -> String {
    if records.is_empty() {
        return String::new();
    }

    let mut ctx = String::from("## Knowledge Base\n");
    for (i, rec) in records.iter().enumerate() {
        ctx.push_str(&format!(
            "{}. [source: {}] {}\n",
            i + 1,
            rec.source,
            rec.content.trim()
        ));
    }
    ctx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_defaults() {
        let query = KnowledgeQuery::new("brand voice");
        assert_eq!(query.limit, 5);
        assert!(query.owner_id.is_none());

        let scoped = query.for_owner("u1").with_limit(2);
        assert_eq!(scoped.owner_id.as_deref(), Some("u1"));
        assert_eq!(scoped.limit, 2);
    }

    #[test]
    fn grounding_lists_sources() {
        let records = vec![
            KnowledgeRecord::new("Friendly, futuristic tone.", "style.md", "u1", "md"),
            KnowledgeRecord::new("Use emojis sparingly.", "guide.pdf", "u1", "pdf"),
        ];
        let ctx = format_grounding(&records);
        assert!(ctx.starts_with("## Knowledge Base"));
        assert!(ctx.contains("1. [source: style.md] Friendly, futuristic tone."));
        assert!(ctx.contains("2. [source: guide.pdf]"));
    }

    #[test]
    fn grounding_empty_when_no_records() {
        assert!(format_grounding(&[]).is_empty());
    }
}
