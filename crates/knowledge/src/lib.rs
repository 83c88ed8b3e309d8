//! Knowledge Store backends and document ingestion for Aura.

pub mod extract;
pub mod in_memory;
pub mod ingest;
pub mod pgvector;
pub mod unavailable;

pub use extract::{DocumentKind, TextExtractor, extract_text};
pub use in_memory::InMemoryKnowledgeStore;
pub use ingest::{IngestReport, Ingestor};
pub use pgvector::PgVectorStore;
pub use unavailable::UnavailableStore;

use aura_config::KnowledgeConfig;
use aura_core::{KnowledgeStore, Provider};
use std::sync::Arc;
use tracing::{info, warn};

/// Build the shared Knowledge Store handle from configuration.
///
/// Never fails: a missing database URL or an unreachable database yields
/// an [`UnavailableStore`], and grounded agents degrade accordingly.
pub async fn build_from_config(
    config: &KnowledgeConfig,
    embedder: Arc<dyn Provider>,
) -> Arc<dyn KnowledgeStore> {
    match config.backend.as_str() {
        "memory" => {
            info!("Using in-memory knowledge store");
            Arc::new(InMemoryKnowledgeStore::new())
        }
        "postgres" => {
            let Some(url) = config.database_url.as_deref() else {
                warn!("No DATABASE_URL configured; knowledge features are disabled");
                return Arc::new(UnavailableStore::new("no database URL configured"));
            };
            match PgVectorStore::connect(
                url,
                &config.table_name,
                embedder,
                &config.embedding_model,
                config.embedding_dim,
            )
            .await
            {
                Ok(store) => Arc::new(store),
                Err(e) => {
                    warn!("Knowledge store unavailable: {e}");
                    Arc::new(UnavailableStore::new(e.to_string()))
                }
            }
        }
        _ => {
            info!("Knowledge store disabled");
            Arc::new(UnavailableStore::new("knowledge backend disabled"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aura_core::KnowledgeQuery;
    use aura_core::error::KnowledgeError;

    struct NoProvider;

    #[async_trait::async_trait]
    impl Provider for NoProvider {
        fn name(&self) -> &str { "none" }
        async fn complete(
            &self,
            _request: aura_core::ProviderRequest,
        ) -> Result<aura_core::ProviderResponse, aura_core::ProviderError> {
            Err(aura_core::ProviderError::NotConfigured("test".into()))
        }
    }

    #[tokio::test]
    async fn postgres_without_url_is_unavailable() {
        let store = build_from_config(&KnowledgeConfig::default(), Arc::new(NoProvider)).await;
        assert_eq!(store.name(), "none");
        let err = store.retrieve(KnowledgeQuery::new("x")).await.unwrap_err();
        assert!(matches!(err, KnowledgeError::Unavailable(_)));
    }

    #[tokio::test]
    async fn memory_backend_selected() {
        let config = KnowledgeConfig {
            backend: "memory".into(),
            ..KnowledgeConfig::default()
        };
        let store = build_from_config(&config, Arc::new(NoProvider)).await;
        assert_eq!(store.name(), "in_memory");
    }
}
