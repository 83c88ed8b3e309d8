//! Configuration loading, validation, and management for Aura.
//!
//! Loads configuration from `~/.aura/config.toml` with environment
//! variable overrides. Validates all settings at startup.
//!
//! A missing model credential or database URL is not an error: the
//! dependent features degrade at request time instead.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
///
/// Maps directly to `~/.aura/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model-provider credential
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_model")]
    pub default_model: String,

    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Timeout for a single LLM Gateway call
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub router: RouterConfig,

    /// Per-role overrides, keyed by role name
    #[serde(default)]
    pub agents: HashMap<String, AgentOverride>,

    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_request_timeout() -> u64 {
    120
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("router", &self.router)
            .field("agents", &self.agents)
            .field("knowledge", &self.knowledge)
            .field("gateway", &self.gateway)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Model used for classification (falls back to `default_model`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Replaces the built-in platform knowledge prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_prompt: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Corrective re-asks when structured output is malformed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repair_attempts: Option<u32>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// "postgres", "memory", or "none"
    #[serde(default = "default_knowledge_backend")]
    pub backend: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,

    #[serde(default = "default_table_name")]
    pub table_name: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,

    /// Records prepended to a grounded prompt
    #[serde(default = "default_retrieval_limit")]
    pub retrieval_limit: usize,

    #[serde(default = "default_knowledge_timeout")]
    pub timeout_secs: u64,
}

fn default_knowledge_backend() -> String {
    "postgres".into()
}
fn default_table_name() -> String {
    "agent_knowledge".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_embedding_dim() -> usize {
    1536
}
fn default_retrieval_limit() -> usize {
    5
}
fn default_knowledge_timeout() -> u64 {
    15
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            backend: default_knowledge_backend(),
            database_url: None,
            table_name: default_table_name(),
            embedding_model: default_embedding_model(),
            embedding_dim: default_embedding_dim(),
            retrieval_limit: default_retrieval_limit(),
            timeout_secs: default_knowledge_timeout(),
        }
    }
}

impl std::fmt::Debug for KnowledgeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeConfig")
            .field("backend", &self.backend)
            .field("database_url", &redact(&self.database_url))
            .field("table_name", &self.table_name)
            .field("embedding_model", &self.embedding_model)
            .field("embedding_dim", &self.embedding_dim)
            .field("retrieval_limit", &self.retrieval_limit)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// CORS origins allowed to call the API
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:3000".into()]
}
fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            allowed_origins: default_allowed_origins(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.aura/config.toml).
    ///
    /// Environment overrides (highest priority):
    /// - `AURA_API_KEY`, then `OPENAI_API_KEY`
    /// - `AURA_API_URL`, `AURA_MODEL`, `AURA_PORT`
    /// - `DATABASE_URL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup` (injectable for tests).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("AURA_API_KEY").or_else(|| lookup("OPENAI_API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(url) = lookup("AURA_API_URL") {
            self.api_url = url;
        }
        if let Some(model) = lookup("AURA_MODEL") {
            self.default_model = model;
        }
        if let Some(db_url) = lookup("DATABASE_URL") {
            self.knowledge.database_url = Some(db_url);
        }
        match lookup("AURA_PORT").map(|p| p.parse::<u16>()) {
            Some(Ok(port)) => self.gateway.port = port,
            Some(Err(e)) => tracing::warn!("Ignoring invalid AURA_PORT: {e}"),
            None => {}
        }
    }

    pub fn config_dir() -> PathBuf {
        dirs_home().join(".aura")
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.request_timeout_secs == 0 || self.knowledge.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeouts must be at least one second".into(),
            ));
        }

        if !matches!(self.knowledge.backend.as_str(), "postgres" | "memory" | "none") {
            return Err(ConfigError::ValidationError(format!(
                "unknown knowledge backend '{}' (expected postgres, memory or none)",
                self.knowledge.backend
            )));
        }

        for (name, over) in &self.agents {
            if let Some(t) = over.temperature {
                if !(0.0..=2.0).contains(&t) {
                    return Err(ConfigError::ValidationError(format!(
                        "agents.{name}.temperature must be between 0.0 and 2.0"
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn knowledge_timeout(&self) -> Duration {
        Duration::from_secs(self.knowledge.timeout_secs)
    }

    /// Model for a role: explicit override, else the role's own default,
    /// else the global default.
    pub fn model_for(&self, role: &str, role_default: Option<&str>) -> String {
        self.agents
            .get(role)
            .and_then(|o| o.model.clone())
            .or_else(|| role_default.map(str::to_string))
            .unwrap_or_else(|| self.default_model.clone())
    }

    pub fn temperature_for(&self, role: &str) -> f32 {
        self.agents
            .get(role)
            .and_then(|o| o.temperature)
            .unwrap_or(self.default_temperature)
    }

    pub fn repair_attempts_for(&self, role: &str) -> u32 {
        self.agents
            .get(role)
            .and_then(|o| o.repair_attempts)
            .unwrap_or(1)
    }

    pub fn router_model(&self) -> String {
        self.router
            .model
            .clone()
            .unwrap_or_else(|| self.default_model.clone())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout(),
            router: RouterConfig::default(),
            agents: HashMap::new(),
            knowledge: KnowledgeConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.gateway.port, 8000);
        assert_eq!(config.knowledge.table_name, "agent_knowledge");
        assert!(!config.has_api_key());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_model, config.default_model);
        assert_eq!(parsed.gateway.allowed_origins, config.gateway.allowed_origins);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            default_temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_knowledge_backend_rejected() {
        let mut config = AppConfig::default();
        config.knowledge.backend = "redis".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.default_model, "gpt-4o-mini");
    }

    #[test]
    fn load_from_file_with_agent_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_model = "gpt-4o-mini"
request_timeout_secs = 30

[agents.email]
model = "gpt-4o"
repair_attempts = 2

[knowledge]
backend = "memory"
retrieval_limit = 3
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.model_for("email", None), "gpt-4o");
        assert_eq!(config.repair_attempts_for("email"), 2);
        assert_eq!(config.repair_attempts_for("ugc"), 1);
        assert_eq!(config.knowledge.backend, "memory");
        assert_eq!(config.knowledge.retrieval_limit, 3);
    }

    #[test]
    fn model_resolution_order() {
        let config = AppConfig::default();
        assert_eq!(config.model_for("ugc", Some("gpt-4o")), "gpt-4o");
        assert_eq!(config.model_for("content", None), "gpt-4o-mini");
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config.apply_env(|key| match key {
            "OPENAI_API_KEY" => Some("sk-test".into()),
            "DATABASE_URL" => Some("postgres://localhost/aura".into()),
            "AURA_PORT" => Some("9000".into()),
            _ => None,
        });
        assert!(config.has_api_key());
        assert_eq!(config.knowledge.database_url.as_deref(), Some("postgres://localhost/aura"));
        assert_eq!(config.gateway.port, 9000);
    }

    #[test]
    fn aura_key_wins_over_openai_key() {
        let mut config = AppConfig::default();
        config.apply_env(|key| match key {
            "AURA_API_KEY" => Some("aura-key".into()),
            "OPENAI_API_KEY" => Some("openai-key".into()),
            _ => None,
        });
        assert_eq!(config.api_key.as_deref(), Some("aura-key"));
    }

    #[test]
    fn debug_redacts_secrets() {
        let mut config = AppConfig::default();
        config.api_key = Some("sk-secret".into());
        config.knowledge.database_url = Some("postgres://user:pw@host/db".into());
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(!dbg.contains("pw@host"));
    }
}
