//! Stand-in provider used when no model credential is configured.
//!
//! Lets the server start and serve health checks; every model call fails
//! with [`ProviderError::NotConfigured`], which the API reports as 503.

use async_trait::async_trait;
use aura_core::error::ProviderError;
use aura_core::provider::*;

pub struct UnconfiguredProvider {
    reason: String,
}

impl UnconfiguredProvider {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl aura_core::Provider for UnconfiguredProvider {
    fn name(&self) -> &str {
        "unconfigured"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::NotConfigured(self.reason.clone()))
    }

    async fn embed(&self, _request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        Err(ProviderError::NotConfigured(self.reason.clone()))
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aura_core::{Message, Provider};

    #[tokio::test]
    async fn every_call_is_not_configured() {
        let provider = UnconfiguredProvider::new("set OPENAI_API_KEY");
        let err = provider
            .complete(ProviderRequest::new("gpt-4o", vec![Message::user("hi")]))
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
        assert!(err.to_string().contains("OPENAI_API_KEY"));
        assert!(!provider.health_check().await.unwrap());
    }
}
