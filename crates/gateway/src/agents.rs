//! Per-agent endpoints. Each payload is assembled into a single prompt and
//! sent straight to one Structured Agent, bypassing the Router.

use crate::error::ApiError;
use crate::{RequestGuard, SharedState};
use aura_agent::InvocationContext;
use aura_core::StructuredResult;
use aura_core::decision::default_user;
use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
pub struct AgentRequest {
    pub message: String,
    #[serde(default = "default_user")]
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UgcRequest {
    pub product_name: String,
    pub audience_name: String,
    pub expert_name: String,
    pub style: String,
    #[serde(default = "default_user")]
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct StaticAdRequest {
    pub product_name: String,
    pub audience_name: String,
    pub offer: String,
    #[serde(default = "default_user")]
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub product_name: String,
    pub audience_name: String,
    pub objective: String,
    #[serde(default = "default_user")]
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub context: String,
    #[serde(default = "default_tone")]
    pub tone: String,
    #[serde(default = "default_user")]
    pub user_id: String,
}

fn default_tone() -> String {
    "friendly".into()
}

impl UgcRequest {
    fn prompt(&self) -> String {
        format!(
            "Create a viral UGC video script.\nProduct: {}\nTarget Audience: {}\nBrand Persona/Expert: {}\nVideo Style: {}",
            self.product_name, self.audience_name, self.expert_name, self.style
        )
    }
}

impl StaticAdRequest {
    fn prompt(&self) -> String {
        format!(
            "Write copy for a high-converting static ad.\nProduct: {}\nTarget Audience: {}\nOffer/Objective: {}",
            self.product_name, self.audience_name, self.offer
        )
    }
}

impl EmailRequest {
    fn prompt(&self) -> String {
        format!(
            "Write a marketing email.\nProduct: {}\nTarget Audience: {}\nEmail Objective: {}",
            self.product_name, self.audience_name, self.objective
        )
    }
}

impl MessageRequest {
    fn prompt(&self) -> String {
        format!(
            "Write three message variations.\nContext/Objective: {}\nTone of Voice: {}",
            self.context, self.tone
        )
    }
}

pub async fn content(
    State(state): State<SharedState>,
    Json(req): Json<AgentRequest>,
) -> Result<Json<Value>, ApiError> {
    run(&state, "content", &req.message, &req.user_id).await
}

pub async fn analytics(
    State(state): State<SharedState>,
    Json(req): Json<AgentRequest>,
) -> Result<Json<Value>, ApiError> {
    run(&state, "analytics", &req.message, &req.user_id).await
}

pub async fn ugc(
    State(state): State<SharedState>,
    Json(req): Json<UgcRequest>,
) -> Result<Json<Value>, ApiError> {
    run(&state, "ugc", &req.prompt(), &req.user_id).await
}

pub async fn static_ad(
    State(state): State<SharedState>,
    Json(req): Json<StaticAdRequest>,
) -> Result<Json<Value>, ApiError> {
    run(&state, "static_ad", &req.prompt(), &req.user_id).await
}

pub async fn email(
    State(state): State<SharedState>,
    Json(req): Json<EmailRequest>,
) -> Result<Json<Value>, ApiError> {
    run(&state, "email", &req.prompt(), &req.user_id).await
}

pub async fn message(
    State(state): State<SharedState>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<Value>, ApiError> {
    run(&state, "message", &req.prompt(), &req.user_id).await
}

/// Invoke one agent with its configured repair attempts.
///
/// Free text answers `{response}`, a record answers its own fields, and
/// output still malformed after repair becomes a 422 carrying the raw text.
pub(crate) async fn run(
    state: &SharedState,
    agent_name: &str,
    prompt: &str,
    user_id: &str,
) -> Result<Json<Value>, ApiError> {
    let agent = state
        .agents
        .agent(agent_name)
        .ok_or_else(|| ApiError::Internal(format!("Agent not wired: {agent_name}")))?;

    let guard = RequestGuard::new();
    let ctx = InvocationContext::new(user_id).with_cancel(guard.token());

    let result = agent
        .invoke_with_repair(prompt, &ctx, agent.repair_attempts())
        .await?;

    match result {
        StructuredResult::Text { text } => Ok(Json(json!({ "response": text }))),
        StructuredResult::Record { fields, .. } => Ok(Json(Value::Object(fields))),
        StructuredResult::Malformed { raw, error } => Err(ApiError::Malformed { raw, error }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ugc_prompt_carries_every_field() {
        let req = UgcRequest {
            product_name: "Cold Brew Kit".into(),
            audience_name: "Busy parents".into(),
            expert_name: "Barista Ana".into(),
            style: "Unboxing".into(),
            user_id: default_user(),
        };
        assert_eq!(
            req.prompt(),
            "Create a viral UGC video script.\nProduct: Cold Brew Kit\nTarget Audience: Busy parents\nBrand Persona/Expert: Barista Ana\nVideo Style: Unboxing"
        );
    }

    #[test]
    fn message_tone_defaults() {
        let req: MessageRequest = serde_json::from_str(r#"{"context":"cart recovery"}"#).unwrap();
        assert_eq!(req.tone, "friendly");
        assert_eq!(req.user_id, "default");
        assert!(req.prompt().contains("cart recovery"));
    }

    #[test]
    fn static_ad_and_email_prompts() {
        let ad = StaticAdRequest {
            product_name: "Beans".into(),
            audience_name: "Students".into(),
            offer: "20% off".into(),
            user_id: default_user(),
        };
        assert!(ad.prompt().contains("Offer/Objective: 20% off"));

        let email = EmailRequest {
            product_name: "Beans".into(),
            audience_name: "Students".into(),
            objective: "welcome".into(),
            user_id: default_user(),
        };
        assert!(email.prompt().contains("Email Objective: welcome"));
    }
}
