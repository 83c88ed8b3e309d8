//! Stand-in store used when no knowledge backend is configured or the
//! configured one could not be reached at startup.

use async_trait::async_trait;
use aura_core::error::KnowledgeError;
use aura_core::knowledge::{KnowledgeQuery, KnowledgeRecord, KnowledgeStore};

/// Fails every operation with [`KnowledgeError::Unavailable`].
pub struct UnavailableStore {
    reason: String,
}

impl UnavailableStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl KnowledgeStore for UnavailableStore {
    fn name(&self) -> &str { "none" }

    async fn upsert(&self, _key: &str, _record: KnowledgeRecord) -> Result<String, KnowledgeError> {
        Err(KnowledgeError::Unavailable(self.reason.clone()))
    }

    async fn retrieve(&self, _query: KnowledgeQuery) -> Result<Vec<KnowledgeRecord>, KnowledgeError> {
        Err(KnowledgeError::Unavailable(self.reason.clone()))
    }

    async fn count(&self) -> Result<usize, KnowledgeError> {
        Err(KnowledgeError::Unavailable(self.reason.clone()))
    }
}
