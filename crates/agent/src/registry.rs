//! Tool Registry: the Router's table of delegable agents.
//!
//! Each entry binds a tool name to an agent invocation with the input
//! contract `{prompt: string}`. Built once at startup and never mutated
//! afterwards, so it is shared behind an `Arc` without locking.

use crate::structured::{AgentError, InvocationContext, StructuredAgent};
use async_trait::async_trait;
use aura_core::provider::ToolDefinition;
use aura_core::StructuredResult;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Something the Router can delegate a prompt to.
#[async_trait]
pub trait AgentInvocation: Send + Sync {
    async fn invoke(
        &self,
        prompt: &str,
        ctx: &InvocationContext,
    ) -> Result<StructuredResult, AgentError>;
}

#[async_trait]
impl AgentInvocation for StructuredAgent {
    async fn invoke(
        &self,
        prompt: &str,
        ctx: &InvocationContext,
    ) -> Result<StructuredResult, AgentError> {
        self.invoke_with_repair(prompt, ctx, self.repair_attempts()).await
    }
}

#[derive(Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    invocation: Arc<dyn AgentInvocation>,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        invocation: Arc<dyn AgentInvocation>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            invocation,
        }
    }

    /// Definition offered to the classification model.
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "prompt": {
                        "type": "string",
                        "description": "Self-contained instructions for the agent, keeping every detail from the user"
                    }
                },
                "required": ["prompt"]
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error(transparent)]
    Agent(#[from] AgentError),
}

#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, ToolDescriptor>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, descriptor: ToolDescriptor) {
        self.tools.insert(descriptor.name.clone(), descriptor);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Definitions for every registered tool, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(ToolDescriptor::definition).collect()
    }

    /// Invoke the named tool and flatten its result to text.
    ///
    /// Never falls back to another tool: an absent name is
    /// [`DispatchError::UnknownTool`].
    pub async fn dispatch(
        &self,
        name: &str,
        prompt: &str,
        ctx: &InvocationContext,
    ) -> Result<String, DispatchError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| DispatchError::UnknownTool(name.to_string()))?;

        debug!(tool = name, "Dispatching to agent");
        let result = tool.invocation.invoke(prompt, ctx).await?;

        if let StructuredResult::Malformed { error, .. } = &result {
            warn!(tool = name, %error, "Agent output did not match its schema; relaying raw text");
        }
        Ok(result.flatten())
    }
}
