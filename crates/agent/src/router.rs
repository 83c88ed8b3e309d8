//! The Router: one classification call per request, then exactly one of
//! answer, delegate, or redirect.
//!
//! ```text
//! Idle ─► Classifying ─┬─► Answering ───┐
//!                      ├─► Dispatching ─┼─► Done
//!                      └─► Redirecting ─┘
//! ```
//!
//! Each request runs the machine independently; the only shared state is
//! the read-only [`ToolRegistry`].

use crate::registry::{DispatchError, ToolRegistry};
use crate::role::PLATFORM_PROMPT;
use crate::structured::{AgentError, InvocationContext};
use aura_core::decision::{NavigationDirective, RouterDecision, RouterRequest};
use aura_core::error::ProviderError;
use aura_core::message::Message;
use aura_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Answer given when the model picks a tool that does not exist.
pub const UNKNOWN_TOOL_APOLOGY: &str =
    "Sorry, I couldn't complete that request right now. Please try again, or open the matching generator from the dashboard.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteState {
    Idle,
    Classifying,
    Answering,
    Dispatching,
    Redirecting,
    Done,
}

#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    #[error("Classification failed: {0}")]
    Classification(#[source] ProviderError),

    #[error("Tool '{tool}' failed: {source}")]
    Dispatch {
        tool: String,
        #[source]
        source: AgentError,
    },

    #[error("Request cancelled")]
    Cancelled,
}

pub struct Router {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    timeout: Duration,
    platform_prompt: String,
    registry: Arc<ToolRegistry>,
}

impl Router {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.3,
            timeout: Duration::from_secs(120),
            platform_prompt: PLATFORM_PROMPT.to_string(),
            registry,
        }
    }

    pub fn with_platform_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.platform_prompt = prompt.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Run the full machine for one request.
    ///
    /// Never returns [`RouterDecision::ToolInvocation`]: a delegated
    /// tool's text comes back verbatim as a direct answer.
    pub async fn route(
        &self,
        request: &RouterRequest,
        cancel: CancellationToken,
    ) -> Result<RouterDecision, RoutingError> {
        let ctx = InvocationContext::new(&request.user_id).with_cancel(cancel);
        let mut state = RouteState::Idle;
        info!(user = %request.user_id, "Routing message");

        transition(&mut state, RouteState::Classifying);
        let decision = self.classify(request, &ctx).await?;

        let outcome = match decision {
            RouterDecision::ToolInvocation {
                tool_name,
                derived_prompt,
            } => {
                transition(&mut state, RouteState::Dispatching);
                match self.registry.dispatch(&tool_name, &derived_prompt, &ctx).await {
                    Ok(text) => RouterDecision::answer(text),
                    Err(DispatchError::UnknownTool(name)) => {
                        error!(tool = %name, "Model selected an unregistered tool");
                        RouterDecision::answer(UNKNOWN_TOOL_APOLOGY)
                    }
                    Err(DispatchError::Agent(AgentError::Cancelled)) => {
                        return Err(RoutingError::Cancelled);
                    }
                    Err(DispatchError::Agent(source)) => {
                        return Err(RoutingError::Dispatch {
                            tool: tool_name,
                            source,
                        });
                    }
                }
            }
            RouterDecision::NavigationDirective(directive) => {
                transition(&mut state, RouteState::Redirecting);
                RouterDecision::NavigationDirective(directive)
            }
            answer @ RouterDecision::DirectAnswer { .. } => {
                transition(&mut state, RouteState::Answering);
                answer
            }
        };

        transition(&mut state, RouteState::Done);
        Ok(outcome)
    }

    /// The single classification call. Yields exactly one decision.
    pub async fn classify(
        &self,
        request: &RouterRequest,
        ctx: &InvocationContext,
    ) -> Result<RouterDecision, RoutingError> {
        let provider_request = ProviderRequest::new(
            &self.model,
            vec![
                Message::system(&self.platform_prompt),
                Message::user(&request.message),
            ],
        )
        .with_temperature(self.temperature)
        .with_tools(self.registry.definitions());

        let response = tokio::select! {
            _ = ctx.cancel.cancelled() => return Err(RoutingError::Cancelled),
            r = tokio::time::timeout(self.timeout, self.provider.complete(provider_request)) => {
                r.map_err(|_| RoutingError::Classification(ProviderError::Timeout(format!(
                    "no response within {}s",
                    self.timeout.as_secs()
                ))))?
                .map_err(RoutingError::Classification)?
            }
        };

        let decision = interpret(&response.message, &request.message);
        debug!(kind = decision.kind(), "Classified message");
        Ok(decision)
    }
}

fn transition(state: &mut RouteState, next: RouteState) {
    debug!(from = ?state, to = ?next, "Router state");
    *state = next;
}

/// Turn the classification model's reply into a decision.
///
/// Tool calls win. Only the first is honored; the derived prompt falls
/// back to the original message when the arguments carry none. Text is
/// a navigation directive only when it is exclusively the JSON object.
pub fn interpret(message: &Message, original: &str) -> RouterDecision {
    if let Some(call) = message.tool_calls.first() {
        if message.tool_calls.len() > 1 {
            warn!(
                count = message.tool_calls.len(),
                "Model requested several tools; only the first is used"
            );
        }
        let derived_prompt = call.parsed_arguments()["prompt"]
            .as_str()
            .filter(|p| !p.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| original.to_string());
        return RouterDecision::ToolInvocation {
            tool_name: call.name.clone(),
            derived_prompt,
        };
    }

    let text = message.content.trim();
    match parse_navigation(text) {
        Some(directive) => RouterDecision::NavigationDirective(directive),
        None => RouterDecision::answer(text),
    }
}

/// Strict acceptance test for the navigation JSON: the whole trimmed text
/// must be the object, with nothing before or after it.
pub fn parse_navigation(text: &str) -> Option<NavigationDirective> {
    let text = text.trim();
    if !(text.starts_with('{') && text.ends_with('}')) {
        return None;
    }
    serde_json::from_str(text).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{AgentInvocation, ToolDescriptor};
    use crate::test_helpers::*;
    use async_trait::async_trait;
    use aura_core::StructuredResult;
    use std::sync::Mutex;

    /// Records the prompts it receives and answers with fixed text.
    struct Recorder {
        reply: Result<String, ()>,
        prompts: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn ok(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.into()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err(()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AgentInvocation for Recorder {
        async fn invoke(
            &self,
            prompt: &str,
            _ctx: &InvocationContext,
        ) -> Result<StructuredResult, AgentError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Ok(text) => Ok(StructuredResult::Text { text: text.clone() }),
                Err(()) => Err(AgentError::Gateway(ProviderError::Network("down".into()))),
            }
        }
    }

    fn registry(tools: &[(&str, Arc<Recorder>)]) -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        for (name, agent) in tools {
            registry.register(ToolDescriptor::new(*name, format!("{name} tool"), agent.clone()));
        }
        Arc::new(registry)
    }

    fn request(message: &str) -> RouterRequest {
        RouterRequest::new(message, "u1")
    }

    #[test]
    fn exact_navigation_json_is_directive() {
        let msg = Message::assistant(
            r#"  {"type":"action","action":"navigate","path":"/dashboard/brain","message":"Upload there"}  "#,
        );
        let decision = interpret(&msg, "x");
        assert_eq!(
            decision,
            RouterDecision::NavigationDirective(NavigationDirective {
                target_path: "/dashboard/brain".into(),
                explanation: "Upload there".into(),
            })
        );
    }

    #[test]
    fn navigation_with_surrounding_prose_is_answer() {
        let text = r#"Sure! {"type":"action","action":"navigate","path":"/x","message":"m"}"#;
        let decision = interpret(&Message::assistant(text), "x");
        assert_eq!(decision, RouterDecision::answer(text));
    }

    #[test]
    fn non_navigation_json_is_answer() {
        let text = r#"{"type":"info","path":"/x"}"#;
        assert_eq!(interpret(&Message::assistant(text), "x"), RouterDecision::answer(text));
    }

    #[test]
    fn prose_is_trimmed_answer() {
        let decision = interpret(&Message::assistant("\n  Olá! Como posso ajudar?  \n"), "oi");
        assert_eq!(decision, RouterDecision::answer("Olá! Como posso ajudar?"));
    }

    #[test]
    fn first_tool_call_wins() {
        let mut msg = Message::assistant("");
        msg.tool_calls = vec![
            make_tool_call("content", serde_json::json!({"prompt": "post about café"})),
            make_tool_call("email", serde_json::json!({"prompt": "email"})),
        ];
        assert_eq!(
            interpret(&msg, "orig"),
            RouterDecision::ToolInvocation {
                tool_name: "content".into(),
                derived_prompt: "post about café".into(),
            }
        );
    }

    #[test]
    fn missing_prompt_argument_falls_back_to_message() {
        let mut msg = Message::assistant("");
        msg.tool_calls = vec![make_tool_call("content", serde_json::json!({}))];
        let RouterDecision::ToolInvocation { derived_prompt, .. } = interpret(&msg, "original ask") else {
            panic!("expected tool invocation");
        };
        assert_eq!(derived_prompt, "original ask");
    }

    #[tokio::test]
    async fn classification_offers_registry_tools() {
        let provider = Arc::new(ScriptedProvider::texts(&["Hi!"]));
        let router = Router::new(
            provider.clone(),
            "gpt-4o-mini",
            registry(&[("content", Recorder::ok("")), ("email", Recorder::ok(""))]),
        );
        router.route(&request("hello"), CancellationToken::new()).await.unwrap();

        let sent = &provider.requests()[0];
        assert_eq!(sent.tools.len(), 2);
        assert_eq!(sent.messages[0].content, PLATFORM_PROMPT);
        assert_eq!(sent.messages[1].content, "hello");
    }

    #[tokio::test]
    async fn dispatch_relays_tool_text_verbatim() {
        let content = Recorder::ok("☕ Fresh post");
        let provider = Arc::new(ScriptedProvider::new(vec![tool_call_response(vec![make_tool_call(
            "content",
            serde_json::json!({"prompt": "short post about café"}),
        )])]));
        let router = Router::new(provider.clone(), "m", registry(&[("content", content.clone())]));

        let decision = router.route(&request("post rápido"), CancellationToken::new()).await.unwrap();
        assert_eq!(decision, RouterDecision::answer("☕ Fresh post"));
        assert_eq!(content.prompts(), vec!["short post about café".to_string()]);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn unknown_tool_falls_back_to_apology() {
        let content = Recorder::ok("x");
        let provider = Arc::new(ScriptedProvider::new(vec![tool_call_response(vec![make_tool_call(
            "video_editor",
            serde_json::json!({"prompt": "p"}),
        )])]));
        let router = Router::new(provider, "m", registry(&[("content", content.clone())]));

        let decision = router.route(&request("edit"), CancellationToken::new()).await.unwrap();
        assert_eq!(decision, RouterDecision::answer(UNKNOWN_TOOL_APOLOGY));
        assert!(content.prompts().is_empty());
    }

    #[tokio::test]
    async fn dispatch_failure_propagates_without_fallback() {
        let email = Recorder::failing();
        let content = Recorder::ok("x");
        let provider = Arc::new(ScriptedProvider::new(vec![tool_call_response(vec![make_tool_call(
            "email",
            serde_json::json!({"prompt": "p"}),
        )])]));
        let router = Router::new(
            provider,
            "m",
            registry(&[("email", email.clone()), ("content", content.clone())]),
        );

        let err = router.route(&request("email"), CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, RoutingError::Dispatch { ref tool, .. } if tool == "email"));
        assert_eq!(email.prompts().len(), 1);
        assert!(content.prompts().is_empty());
    }

    #[tokio::test]
    async fn classification_failure_is_routing_error() {
        let provider = Arc::new(FailingProvider::new(ProviderError::AuthenticationFailed("bad".into())));
        let router = Router::new(provider, "m", registry(&[]));
        let err = router.route(&request("hi"), CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, RoutingError::Classification(ProviderError::AuthenticationFailed(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn classification_timeout_is_routing_error() {
        let provider = Arc::new(SlowProvider::new(Duration::from_secs(30)));
        let router = Router::new(provider, "m", registry(&[])).with_timeout(Duration::from_secs(2));
        let err = router.route(&request("hi"), CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, RoutingError::Classification(ProviderError::Timeout(_))));
    }

    #[tokio::test]
    async fn cancelled_before_classification() {
        let provider = Arc::new(SlowProvider::new(Duration::from_secs(30)));
        let router = Router::new(provider, "m", registry(&[]));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = router.route(&request("hi"), cancel).await.unwrap_err();
        assert!(matches!(err, RoutingError::Cancelled));
    }

    #[tokio::test]
    async fn custom_platform_prompt_is_sent() {
        let provider = Arc::new(ScriptedProvider::texts(&["ok"]));
        let router = Router::new(provider.clone(), "m", registry(&[])).with_platform_prompt("Be brief.");
        router.route(&request("hi"), CancellationToken::new()).await.unwrap();
        assert_eq!(provider.requests()[0].messages[0].content, "Be brief.");
    }
}
