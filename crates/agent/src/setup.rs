//! Startup wiring: build every role's agent and the Router from config.

use crate::registry::{ToolDescriptor, ToolRegistry};
use crate::role::{AgentRole, builtin_roles};
use crate::router::Router;
use crate::structured::StructuredAgent;
use aura_config::AppConfig;
use aura_core::knowledge::KnowledgeStore;
use aura_core::provider::Provider;
use aura_core::tool::CapabilityRegistry;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Every agent plus the Router that delegates to the routable ones.
///
/// Built once; read-only afterwards.
pub struct AgentSet {
    agents: BTreeMap<String, Arc<StructuredAgent>>,
    router: Arc<Router>,
}

impl AgentSet {
    /// Build the built-in roles.
    pub fn build(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        knowledge: Arc<dyn KnowledgeStore>,
        capabilities: Arc<CapabilityRegistry>,
    ) -> Self {
        Self::from_roles(builtin_roles(), config, provider, knowledge, capabilities)
    }

    pub fn from_roles(
        roles: Vec<AgentRole>,
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        knowledge: Arc<dyn KnowledgeStore>,
        capabilities: Arc<CapabilityRegistry>,
    ) -> Self {
        let mut agents = BTreeMap::new();
        let mut registry = ToolRegistry::new();

        for role in roles {
            let name = role.name.clone();
            let model = config.model_for(&name, role.default_model.as_deref());
            let routable = role.routable;
            let description = role.description.clone();

            let agent = Arc::new(
                StructuredAgent::new(Arc::new(role), provider.clone(), model)
                    .with_temperature(config.temperature_for(&name))
                    .with_max_tokens(config.default_max_tokens)
                    .with_capabilities(capabilities.clone())
                    .with_knowledge(knowledge.clone())
                    .with_retrieval_limit(config.knowledge.retrieval_limit)
                    .with_repair_attempts(config.repair_attempts_for(&name))
                    .with_timeouts(config.request_timeout(), config.knowledge_timeout()),
            );

            if routable {
                registry.register(ToolDescriptor::new(&name, description, agent.clone()));
            }
            agents.insert(name, agent);
        }

        let mut router = Router::new(provider, config.router_model(), Arc::new(registry))
            .with_temperature(config.default_temperature)
            .with_timeout(config.request_timeout());
        if let Some(prompt) = &config.router.platform_prompt {
            router = router.with_platform_prompt(prompt);
        }

        info!(
            agents = agents.len(),
            tools = router.registry().len(),
            "Agents ready"
        );

        Self {
            agents,
            router: Arc::new(router),
        }
    }

    pub fn router(&self) -> Arc<Router> {
        self.router.clone()
    }

    pub fn agent(&self, name: &str) -> Option<Arc<StructuredAgent>> {
        self.agents.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.agents.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::ScriptedProvider;
    use aura_config::AgentOverride;
    use aura_knowledge::InMemoryKnowledgeStore;

    fn build(config: &AppConfig) -> AgentSet {
        AgentSet::build(
            config,
            Arc::new(ScriptedProvider::texts(&[])),
            Arc::new(InMemoryKnowledgeStore::new()),
            Arc::new(CapabilityRegistry::new()),
        )
    }

    #[test]
    fn registry_holds_only_routable_roles() {
        let set = build(&AppConfig::default());
        assert_eq!(
            set.router().registry().names(),
            vec!["analytics", "content", "email", "message", "static_ad", "ugc"]
        );
        assert!(set.agent("brain").is_some());
        assert_eq!(set.names().len(), 7);
    }

    #[test]
    fn models_follow_role_defaults_and_overrides() {
        let mut config = AppConfig::default();
        config.agents.insert(
            "email".into(),
            AgentOverride {
                model: Some("gpt-4.1".into()),
                temperature: None,
                repair_attempts: Some(3),
            },
        );
        let set = build(&config);

        assert_eq!(set.agent("content").unwrap().model(), "gpt-4o-mini");
        assert_eq!(set.agent("ugc").unwrap().model(), "gpt-4o");
        assert_eq!(set.agent("email").unwrap().model(), "gpt-4.1");
        assert_eq!(set.agent("email").unwrap().repair_attempts(), 3);
        assert_eq!(set.agent("ugc").unwrap().repair_attempts(), 1);
    }

    #[test]
    fn unknown_agent_is_none() {
        assert!(build(&AppConfig::default()).agent("video").is_none());
    }
}
