use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Agent backend the evaluation run talks to
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AgentConfig {
    /// Orchestration agent exposed as an HTTP service
    Http {
        /// URL accepting `{"user_input": ...}` and returning the agent output
        endpoint: String,
        /// Environment variable holding an optional bearer token
        #[serde(default)]
        env_var_api_key: Option<String>,
    },
    /// Agent driven directly through an OpenAI-compatible chat endpoint
    Chat {
        /// Chat completions API base
        api_endpoint: String,
        /// Environment variable name containing the API key
        env_var_api_key: String,
        /// Model to use for generating the marketing content
        model: String,
        /// Temperature for response generation (0.0 to 1.0)
        #[serde(default = "default_temperature")]
        temperature: f64,
        /// Maximum tokens for response generation
        #[serde(default = "default_max_tokens")]
        max_tokens: u16,
        /// System prompt describing the expected output object
        #[serde(default = "default_system_prompt")]
        system_prompt: String,
    },
}

/// Root configuration for one evaluation run
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Golden scenario file
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,
    /// Where the per-scenario results are written
    #[serde(default = "default_results_path")]
    pub results_path: PathBuf,
    /// Wall-clock bound for a single agent invocation
    #[serde(default = "default_agent_timeout_secs")]
    pub agent_timeout_secs: u64,
    /// Rate limit for agent invocations per second, disabled when <= 0
    #[serde(default)]
    pub rate_limit_rps: f64,
    pub agent: AgentConfig,
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("data/evaluation_dataset.json")
}

fn default_results_path() -> PathBuf {
    PathBuf::from("eval_results.json")
}

fn default_agent_timeout_secs() -> u64 {
    60
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u16 {
    2000
}

fn default_system_prompt() -> String {
    "You are a marketing concierge. Given a marketing request, reply with a single JSON \
     object with the keys \"recommendations\" (an object with a \"suggestions\" string), \
     \"promotions\" (an array of objects with \"offer\" and \"discount\" strings) and \
     \"social_posts\" (an object mapping the platforms X, Facebook and Instagram to post text)."
        .to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?;

        if !config.rate_limit_rps.is_finite() {
            bail!(
                "Invalid rate_limit_rps {} in {}: must be a finite number",
                config.rate_limit_rps,
                path.display()
            );
        }

        Ok(config)
    }

    pub fn agent_timeout(&self) -> Duration {
        Duration::from_secs(self.agent_timeout_secs)
    }
}
