//! The generic Structured Agent.
//!
//! One type serves every role. An invocation runs, in order:
//!
//! 1. **Grounding** (if the role asks for it): retrieve from the Knowledge
//!    Store and prepend the records to the system prompt
//! 2. **Model call** with the role's allowed capabilities offered as tools
//! 3. **One tool round-trip** if the model asked for tools: execute them,
//!    feed the results back, call the model once more without tools
//! 4. **Shaping**: validate against the role's schema, or trim to text
//!
//! Every suspension point is bounded by a timeout and by the caller's
//! cancellation token.

use crate::role::{AgentRole, Grounding};
use aura_core::error::{KnowledgeError, ProviderError};
use aura_core::knowledge::{KnowledgeQuery, KnowledgeStore, format_grounding};
use aura_core::message::{Message, MessageToolCall};
use aura_core::provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition};
use aura_core::tool::{CapabilityRegistry, ToolCall};
use aura_core::StructuredResult;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Per-request context passed explicitly to every invocation.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    pub user_id: String,
    pub cancel: CancellationToken,
}

impl InvocationContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

impl Default for InvocationContext {
    fn default() -> Self {
        Self::new(aura_core::decision::default_user())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Prompt must not be empty")]
    EmptyPrompt,

    #[error("LLM gateway error: {0}")]
    Gateway(#[from] ProviderError),

    #[error("Knowledge store error: {0}")]
    Knowledge(#[from] KnowledgeError),

    #[error("Invocation cancelled")]
    Cancelled,
}

pub struct StructuredAgent {
    role: Arc<AgentRole>,
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    capabilities: Arc<CapabilityRegistry>,
    knowledge: Option<Arc<dyn KnowledgeStore>>,
    retrieval_limit: usize,
    repair_attempts: u32,
    call_timeout: Duration,
    knowledge_timeout: Duration,
}

impl StructuredAgent {
    pub fn new(role: Arc<AgentRole>, provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            role,
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            capabilities: Arc::new(CapabilityRegistry::new()),
            knowledge: None,
            retrieval_limit: 5,
            repair_attempts: 0,
            call_timeout: Duration::from_secs(120),
            knowledge_timeout: Duration::from_secs(15),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_capabilities(mut self, capabilities: Arc<CapabilityRegistry>) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_knowledge(mut self, store: Arc<dyn KnowledgeStore>) -> Self {
        self.knowledge = Some(store);
        self
    }

    pub fn with_retrieval_limit(mut self, limit: usize) -> Self {
        self.retrieval_limit = limit;
        self
    }

    /// Repair attempts used when the agent is invoked through the Tool
    /// Registry or the HTTP surface.
    pub fn with_repair_attempts(mut self, attempts: u32) -> Self {
        self.repair_attempts = attempts;
        self
    }

    pub fn with_timeouts(mut self, call: Duration, knowledge: Duration) -> Self {
        self.call_timeout = call;
        self.knowledge_timeout = knowledge;
        self
    }

    pub fn role(&self) -> &AgentRole {
        &self.role
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn repair_attempts(&self) -> u32 {
        self.repair_attempts
    }

    /// Run one invocation of this role.
    pub async fn invoke(
        &self,
        prompt: &str,
        ctx: &InvocationContext,
    ) -> Result<StructuredResult, AgentError> {
        let (_, raw) = self.converse(prompt, ctx).await?;
        Ok(self.shape(&raw))
    }

    /// Like [`invoke`](Self::invoke), but re-asks the model up to
    /// `attempts` times while the output stays malformed, each time
    /// naming the validation error.
    pub async fn invoke_with_repair(
        &self,
        prompt: &str,
        ctx: &InvocationContext,
        attempts: u32,
    ) -> Result<StructuredResult, AgentError> {
        let (mut messages, raw) = self.converse(prompt, ctx).await?;
        let mut result = self.shape(&raw);

        for attempt in 1..=attempts {
            let StructuredResult::Malformed { raw, error } = &result else {
                break;
            };
            warn!(role = %self.role.name, attempt, %error, "Malformed output, asking for a repair");

            messages.push(Message::assistant(raw.clone()));
            messages.push(Message::user(format!(
                "Your previous reply did not match the required format ({error}). \
                 Reply again with ONLY the corrected JSON object, no other text."
            )));

            let response = self.call_model(messages.clone(), Vec::new(), ctx).await?;
            result = self.shape(&response.message.content);
        }

        Ok(result)
    }

    /// Grounding, the primary call, and the optional tool round-trip.
    /// Returns the conversation so far and the final raw text.
    async fn converse(
        &self,
        prompt: &str,
        ctx: &InvocationContext,
    ) -> Result<(Vec<Message>, String), AgentError> {
        if prompt.trim().is_empty() {
            return Err(AgentError::EmptyPrompt);
        }

        info!(role = %self.role.name, user = %ctx.user_id, model = %self.model, "Invoking agent");

        let grounding = self.ground(prompt, ctx).await?;
        let system = if grounding.is_empty() {
            self.role.system_prompt()
        } else {
            format!("{}\n\n{grounding}", self.role.system_prompt())
        };

        let mut messages = vec![Message::system(system), Message::user(prompt)];
        let tools = self.capabilities.definitions_for(&self.role.capabilities);

        let response = self.call_model(messages.clone(), tools.clone(), ctx).await?;

        if tools.is_empty() || !response.message.requests_tools() {
            return Ok((messages, response.message.content));
        }

        // One tool round-trip, then a final call without tools.
        let calls = response.message.tool_calls.clone();
        messages.push(response.message);
        for call in &calls {
            let output = self.run_capability(call).await;
            messages.push(Message::tool_result(&call.id, output));
        }

        let followup = self.call_model(messages.clone(), Vec::new(), ctx).await?;
        if followup.message.requests_tools() {
            warn!(role = %self.role.name, "Ignoring tool calls after the tool round-trip");
        }
        Ok((messages, followup.message.content))
    }

    async fn ground(&self, prompt: &str, ctx: &InvocationContext) -> Result<String, AgentError> {
        let required = match self.role.grounding {
            Grounding::None => return Ok(String::new()),
            Grounding::Optional => false,
            Grounding::Required => true,
        };

        let retrieved = match &self.knowledge {
            None => Err(KnowledgeError::Unavailable("no knowledge store configured".into())),
            Some(store) => {
                let query = KnowledgeQuery::new(prompt)
                    .for_owner(&ctx.user_id)
                    .with_limit(self.retrieval_limit);
                tokio::select! {
                    _ = ctx.cancel.cancelled() => return Err(AgentError::Cancelled),
                    r = tokio::time::timeout(self.knowledge_timeout, store.retrieve(query)) => {
                        r.unwrap_or_else(|_| Err(KnowledgeError::Unavailable(format!(
                            "retrieval timed out after {}s",
                            self.knowledge_timeout.as_secs()
                        ))))
                    }
                }
            }
        };

        match retrieved {
            Ok(records) => {
                debug!(role = %self.role.name, count = records.len(), "Retrieved grounding records");
                Ok(format_grounding(&records))
            }
            Err(e) if required => Err(e.into()),
            Err(e) => {
                warn!(role = %self.role.name, "Proceeding without grounding: {e}");
                Ok(String::new())
            }
        }
    }

    async fn call_model(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
        ctx: &InvocationContext,
    ) -> Result<ProviderResponse, AgentError> {
        let request = ProviderRequest::new(&self.model, messages)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
            .with_tools(tools);

        tokio::select! {
            _ = ctx.cancel.cancelled() => Err(AgentError::Cancelled),
            r = tokio::time::timeout(self.call_timeout, self.provider.complete(request)) => {
                let response = r.map_err(|_| {
                    ProviderError::Timeout(format!("no response within {}s", self.call_timeout.as_secs()))
                })??;
                Ok(response)
            }
        }
    }

    /// Execute one requested capability. Failures become text fed back to
    /// the model rather than errors.
    async fn run_capability(&self, call: &MessageToolCall) -> String {
        if !self.role.allows(&call.name) {
            warn!(role = %self.role.name, tool = %call.name, "Model requested a capability outside its role");
            return format!("Error: capability '{}' is not allowed for this role", call.name);
        }

        let tool_call = ToolCall {
            id: call.id.clone(),
            name: call.name.clone(),
            arguments: call.parsed_arguments(),
        };

        match self.capabilities.execute(&tool_call).await {
            Ok(result) => {
                debug!(tool = %call.name, success = result.success, "Capability executed");
                result.output
            }
            Err(e) => {
                warn!(tool = %call.name, "Capability failed: {e}");
                format!("Error: {e}")
            }
        }
    }

    fn shape(&self, raw: &str) -> StructuredResult {
        match &self.role.schema {
            Some(schema) => schema.validate(raw),
            None => StructuredResult::Text {
                text: raw.trim().to_string(),
            },
        }
    }
}
