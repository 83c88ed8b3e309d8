//! Side-effect capabilities available to Aura agent roles.
//!
//! Roles name the capabilities they may use; the agent resolves those
//! names against the registry built here.

pub mod web_search;

use aura_core::tool::CapabilityRegistry;
use std::sync::Arc;
use std::time::Duration;

pub use web_search::WebSearchTool;

/// Registry with every built-in capability.
pub fn default_capabilities(timeout: Duration) -> CapabilityRegistry {
    let mut registry = CapabilityRegistry::new();
    registry.register(Arc::new(WebSearchTool::new(timeout)));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_capabilities_include_web_search() {
        let registry = default_capabilities(Duration::from_secs(5));
        assert_eq!(registry.names(), vec!["web_search"]);
    }
}
