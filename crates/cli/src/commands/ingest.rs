//! `aura ingest`: teach the Brain one local document.

use anyhow::Context;
use aura_gateway::AppState;
use std::path::Path;

pub async fn run(file: &Path, user: &str) -> anyhow::Result<()> {
    let config = super::load_config()?;
    let state = AppState::from_config(&config).await;

    let filename = file
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Not a file path: {}", file.display()))?;
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let report = state.ingestor.ingest(filename, bytes, user).await?;
    println!(
        "Learned {} chars from {} ({})",
        report.chars, report.source, report.category
    );
    Ok(())
}
