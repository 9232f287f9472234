use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Databricks workspace connection. Host + personal access token, both
/// falling back to the standard env vars the vendor SDK reads.
#[derive(Debug, Deserialize)]
pub struct WorkspaceConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_token")]
    pub token: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            token: default_token(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: crate::llm::Provider,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
}

/// Limits for a multi-turn chat session.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
    #[serde(default = "default_cost_limit")]
    pub cost_limit_usd: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            cost_limit_usd: default_cost_limit(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// TTL for the cached catalog/principal directory listings.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            cache_ttl_secs: default_cache_ttl(),
        }
    }
}

// Defaults
fn default_host() -> String {
    std::env::var("DATABRICKS_HOST").unwrap_or_default()
}
fn default_token() -> String {
    std::env::var("DATABRICKS_TOKEN").unwrap_or_default()
}
fn default_model() -> String {
    "gpt-4.1-nano".into()
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_max_turns() -> u32 {
    20
}
fn default_cost_limit() -> f64 {
    5.0
}
fn default_bind_address() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8080
}
fn default_cache_ttl() -> u64 {
    600
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace: WorkspaceConfig::default(),
            llm: LlmConfig {
                provider: crate::llm::Provider::default(),
                model: default_model(),
                max_tokens: default_max_tokens(),
                api_key_env: None,
                base_url: None,
            },
            agent: AgentConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config {}: {e}", path.display())))?;
        toml::from_str(&content).map_err(|e| Error::config(format!("Failed to parse config: {e}")))
    }

    pub fn validate(&self) -> Result<()> {
        if self.workspace.host.is_empty() {
            return Err(Error::config(
                "DATABRICKS_HOST not set. Export it or set workspace.host in config.toml",
            ));
        }
        if self.workspace.token.is_empty() {
            return Err(Error::config(
                "DATABRICKS_TOKEN not set. Export it or set workspace.token in config.toml",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config_parses() {
        let toml = r#"
[workspace]
host = "https://dbc-123.cloud.databricks.com"
token = "dapi-test"

[llm]
provider = "anthropic"
model = "claude-sonnet-4-5-20250929"
max_tokens = 2048

[agent]
max_turns = 10
cost_limit_usd = 2.5

[server]
bind_address = "0.0.0.0"
port = 9090
cache_ttl_secs = 120
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.workspace.host, "https://dbc-123.cloud.databricks.com");
        assert_eq!(config.workspace.token, "dapi-test");
        assert_eq!(config.llm.model, "claude-sonnet-4-5-20250929");
        assert_eq!(config.agent.max_turns, 10);
        assert!((config.agent.cost_limit_usd - 2.5).abs() < f64::EPSILON);
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.cache_ttl_secs, 120);
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let toml = r#"
[llm]
model = "test"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.llm.model, "test");
        assert_eq!(config.llm.max_tokens, 4096);
        assert_eq!(config.agent.max_turns, 20);
        assert!((config.agent.cost_limit_usd - 5.0).abs() < f64::EPSILON);
        assert_eq!(config.server.bind_address, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.cache_ttl_secs, 600);
    }

    #[test]
    fn agent_config_defaults() {
        let agent = AgentConfig::default();
        assert_eq!(agent.max_turns, 20);
        assert!((agent.cost_limit_usd - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn validate_rejects_missing_credentials() {
        let mut config = Config::default();
        config.workspace.host = String::new();
        assert!(config.validate().is_err());

        config.workspace.host = "https://example.databricks.com".into();
        config.workspace.token = String::new();
        assert!(config.validate().is_err());

        config.workspace.token = "dapi-test".into();
        assert!(config.validate().is_ok());
    }
}
