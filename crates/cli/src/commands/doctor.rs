//! `aura doctor`: diagnose configuration and backends.

use aura_config::AppConfig;
use aura_core::provider::Provider;
use std::sync::Arc;

pub async fn run() -> anyhow::Result<()> {
    println!("Aura Doctor");
    println!("===========\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ok    Config file: {}", config_path.display());
    } else {
        println!("  info  No config file at {}, using defaults", config_path.display());
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ok    Config valid");
            config
        }
        Err(e) => {
            println!("  FAIL  Config invalid: {e}");
            return Ok(());
        }
    };

    let provider: Arc<dyn Provider> = aura_providers::build_from_config(&config);
    if config.has_api_key() {
        match provider.health_check().await {
            Ok(true) => println!("  ok    LLM gateway reachable at {}", config.api_url),
            Ok(false) => {
                println!("  WARN  LLM gateway at {} rejected the health check", config.api_url);
                issues += 1;
            }
            Err(e) => {
                println!("  FAIL  LLM gateway unreachable: {e}");
                issues += 1;
            }
        }
    } else {
        println!("  WARN  No API key. Set AURA_API_KEY or OPENAI_API_KEY");
        issues += 1;
    }

    let knowledge = aura_knowledge::build_from_config(&config.knowledge, provider).await;
    match knowledge.count().await {
        Ok(n) => println!("  ok    Knowledge store '{}' ({n} documents)", knowledge.name()),
        Err(e) => {
            println!("  WARN  Knowledge store unavailable: {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  All checks passed.");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
