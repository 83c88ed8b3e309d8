//! In-memory knowledge store (for testing and local runs).

use async_trait::async_trait;
use aura_core::error::KnowledgeError;
use aura_core::knowledge::{KnowledgeQuery, KnowledgeRecord, KnowledgeStore};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Keyword-scored store. Records live as long as the process.
pub struct InMemoryKnowledgeStore {
    records: Arc<RwLock<Vec<(String, KnowledgeRecord)>>>,
}

impl InMemoryKnowledgeStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryKnowledgeStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercased query terms worth matching on (three letters or more).
fn terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 3)
        .map(str::to_lowercase)
        .collect()
}

/// Fraction of query terms present in `content`.
fn score(terms: &[String], content: &str) -> f32 {
    if terms.is_empty() {
        return 0.0;
    }
    let content = content.to_lowercase();
    let hits = terms.iter().filter(|t| content.contains(t.as_str())).count();
    hits as f32 / terms.len() as f32
}

#[async_trait]
impl KnowledgeStore for InMemoryKnowledgeStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn upsert(&self, key: &str, record: KnowledgeRecord) -> Result<String, KnowledgeError> {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = record,
            None => records.push((key.to_string(), record)),
        }
        Ok(key.to_string())
    }

    async fn retrieve(&self, query: KnowledgeQuery) -> Result<Vec<KnowledgeRecord>, KnowledgeError> {
        let records = self.records.read().await;
        let terms = terms(&query.text);

        let mut results: Vec<KnowledgeRecord> = records
            .iter()
            .map(|(_, r)| r)
            .filter(|r| query.owner_id.as_deref().is_none_or(|o| r.owner_id == o))
            .cloned()
            .map(|mut r| {
                r.score = score(&terms, &r.content);
                r
            })
            .filter(|r| r.score > 0.0)
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        results.truncate(query.limit);

        Ok(results)
    }

    async fn count(&self) -> Result<usize, KnowledgeError> {
        Ok(self.records.read().await.len())
    }
}
