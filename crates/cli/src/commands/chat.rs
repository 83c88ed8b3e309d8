//! `aura chat`: one routed turn, printed as the `/api/chat` JSON.

use aura_core::decision::RouterRequest;
use aura_gateway::AppState;
use tokio_util::sync::CancellationToken;

pub async fn run(message: &str, user: &str) -> anyhow::Result<()> {
    let config = super::load_config()?;
    let state = AppState::from_config(&config).await;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let decision = state
        .agents
        .router()
        .route(&RouterRequest::new(message, user), cancel)
        .await?;

    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}
