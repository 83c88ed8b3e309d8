pub mod agent;
pub mod chat;
pub mod doctor;
pub mod ingest;
pub mod serve;

use anyhow::Context;
use aura_config::AppConfig;

pub(crate) fn load_config() -> anyhow::Result<AppConfig> {
    AppConfig::load().context("Failed to load config")
}
