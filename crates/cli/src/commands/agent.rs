//! `aura agent`: invoke one agent directly, bypassing the Router.

use anyhow::{Context, bail};
use aura_agent::InvocationContext;
use aura_core::StructuredResult;
use aura_gateway::AppState;

pub async fn run(name: &str, message: &str, user: &str) -> anyhow::Result<()> {
    let config = super::load_config()?;
    let state = AppState::from_config(&config).await;

    let agent = state.agents.agent(name).with_context(|| {
        format!(
            "Unknown agent '{name}'. Available: {}",
            state.agents.names().join(", ")
        )
    })?;

    let ctx = InvocationContext::new(user);
    let result = agent
        .invoke_with_repair(message, &ctx, agent.repair_attempts())
        .await?;

    match result {
        StructuredResult::Text { text } => println!("{text}"),
        StructuredResult::Record { fields, .. } => {
            println!("{}", serde_json::to_string_pretty(&fields)?)
        }
        StructuredResult::Malformed { raw, error } => {
            eprintln!("{raw}");
            bail!("Agent output did not match the expected format: {error}");
        }
    }
    Ok(())
}
