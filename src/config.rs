use std::{fs, path::Path, time::Duration};

use serde::Deserialize;

use crate::{AgentflowError, Result, dispatcher::JoinPolicy};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// execution config
    pub execution: ExecutionConfig,
    /// language model provider config
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// overall deadline of one execution in milliseconds, 0 disables it, defaults to 60000
    pub timeout_ms: u64,
    /// how merge nodes wait for their predecessors
    pub join_policy: JoinPolicy,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    #[default]
    Simulated,
    #[serde(rename = "openai")]
    OpenAi,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// provider type
    pub provider: LlmProvider,
    /// base url of an OpenAI-compatible api
    pub base_url: String,
    /// api key, falls back to the OPENAI_API_KEY environment variable
    pub api_key: Option<String>,
    /// model used by nodes that do not configure one
    pub default_model: String,
    /// per-request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 60_000,
            join_policy: JoinPolicy::default(),
        }
    }
}

impl ExecutionConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            default_model: "gpt-3.5-turbo".to_string(),
            request_timeout_ms: 30_000,
        }
    }
}

impl Config {
    pub fn create<T: AsRef<Path>>(path: T) -> Result<Self> {
        let data = fs::read_to_string(path.as_ref()).map_err(|e| AgentflowError::Config(format!("failed to load config file {:?}: {}", path.as_ref(), e)))?;

        Self::load_from_str(data.as_str())
    }

    pub fn load_from_str(toml_str: &str) -> Result<Self> {
        let config = toml::from_str::<Config>(toml_str)?;
        Ok(config)
    }
}
