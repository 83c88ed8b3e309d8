//! LLM provider implementations for Aura.

pub mod openai_compat;
pub mod unconfigured;

use aura_config::AppConfig;
use aura_core::Provider;
use std::sync::Arc;
use tracing::{info, warn};

pub use openai_compat::OpenAiCompatProvider;
pub use unconfigured::UnconfiguredProvider;

/// Build the LLM Gateway from configuration.
///
/// A missing credential yields an [`UnconfiguredProvider`] so the process
/// can still start.
pub fn build_from_config(config: &AppConfig) -> Arc<dyn Provider> {
    match config.api_key.as_deref().filter(|k| !k.is_empty()) {
        Some(key) => {
            info!(url = %config.api_url, model = %config.default_model, "LLM gateway configured");
            Arc::new(OpenAiCompatProvider::new(
                "openai",
                &config.api_url,
                key,
                config.request_timeout(),
            ))
        }
        None => {
            warn!("No API key configured (AURA_API_KEY / OPENAI_API_KEY); model calls will fail");
            Arc::new(UnconfiguredProvider::new(
                "no API key configured; set AURA_API_KEY or OPENAI_API_KEY",
            ))
        }
    }
}
