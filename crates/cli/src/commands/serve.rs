//! `aura serve`: start the HTTP API.

pub async fn run(port_override: Option<u16>) -> anyhow::Result<()> {
    let mut config = super::load_config()?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("Aura AI Backend");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Model: {}", config.default_model);
    println!("   Knowledge backend: {}", config.knowledge.backend);

    aura_gateway::start(config)
        .await
        .map_err(|e| anyhow::anyhow!("Gateway stopped: {e}"))?;

    Ok(())
}
