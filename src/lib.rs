pub mod agent;
pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod llm;
pub mod server;
pub mod workspace;

/// CLI override for LLM provider/model.
pub struct LlmOverride {
    pub provider: llm::Provider,
    pub model: String,
}
