use crate::config::AgentConfig;
use crate::models::AgentOutput;
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Ways an agent invocation can fail
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Environment variable {0} not found")]
    MissingApiKey(String),

    #[error("Agent request failed: {0}")]
    Transport(String),

    #[error("Agent returned status {0}")]
    Status(u16),

    #[error("Agent output is not valid: {0}")]
    InvalidOutput(String),

    #[error("Agent timed out after {0:?}")]
    Timeout(Duration),
}

/// The marketing orchestration agent under evaluation
#[async_trait]
pub trait Agent: Send + Sync {
    async fn run(&self, user_input: &str) -> Result<AgentOutput, AgentError>;
}

/// Build the agent described by the run configuration
pub fn from_config(config: &AgentConfig) -> Result<Box<dyn Agent>, AgentError> {
    match config {
        AgentConfig::Http {
            endpoint,
            env_var_api_key,
        } => {
            let api_key = match env_var_api_key {
                Some(var) => Some(read_api_key(var)?),
                None => None,
            };
            Ok(Box::new(HttpAgent::new(endpoint.clone(), api_key)))
        }
        AgentConfig::Chat {
            api_endpoint,
            env_var_api_key,
            model,
            temperature,
            max_tokens,
            system_prompt,
        } => {
            let api_key = read_api_key(env_var_api_key)?;
            let openai_config = OpenAIConfig::new()
                .with_api_key(api_key)
                .with_api_base(api_endpoint);

            Ok(Box::new(ChatAgent {
                client: Client::with_config(openai_config),
                model: model.clone(),
                temperature: *temperature,
                max_tokens: *max_tokens,
                system_prompt: system_prompt.clone(),
            }))
        }
    }
}

fn read_api_key(var: &str) -> Result<String, AgentError> {
    std::env::var(var).map_err(|_| AgentError::MissingApiKey(var.to_string()))
}

/// Agent service reached over HTTP
pub struct HttpAgent {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpAgent {
    pub fn new(endpoint: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl Agent for HttpAgent {
    async fn run(&self, user_input: &str) -> Result<AgentOutput, AgentError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "user_input": user_input }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AgentError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::Status(status.as_u16()));
        }

        response
            .json::<AgentOutput>()
            .await
            .map_err(|e| AgentError::InvalidOutput(e.to_string()))
    }
}

/// Agent prompted directly through an OpenAI-compatible chat endpoint
pub struct ChatAgent {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f64,
    max_tokens: u16,
    system_prompt: String,
}

impl ChatAgent {
    /// Build the chat completion request for one marketing request
    fn build_request(&self, user_input: &str) -> Result<CreateChatCompletionRequest, AgentError> {
        let invalid = |e: async_openai::error::OpenAIError| AgentError::InvalidOutput(e.to_string());

        let system_message: ChatCompletionRequestMessage = ChatCompletionRequestSystemMessageArgs::default()
            .content(self.system_prompt.clone())
            .build()
            .map_err(invalid)?
            .into();

        let user_message: ChatCompletionRequestMessage = ChatCompletionRequestUserMessageArgs::default()
            .content(user_input.to_string())
            .build()
            .map_err(invalid)?
            .into();

        CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([system_message, user_message])
            .temperature(self.temperature as f32)
            .max_tokens(self.max_tokens)
            .build()
            .map_err(invalid)
    }
}

#[async_trait]
impl Agent for ChatAgent {
    async fn run(&self, user_input: &str) -> Result<AgentOutput, AgentError> {
        let request = self.build_request(user_input)?;
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AgentError::Transport(e.to_string()))?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default();

        parse_agent_output(&content)
    }
}

/// Parse agent output from a model reply, handling JSON embedded in prose
pub fn parse_agent_output(reply: &str) -> Result<AgentOutput, AgentError> {
    if let Ok(output) = serde_json::from_str(reply) {
        return Ok(output);
    }

    let start = reply
        .find('{')
        .ok_or_else(|| AgentError::InvalidOutput("No JSON found in response".to_string()))?;
    let end = reply.rfind('}').filter(|&end| end > start).ok_or_else(|| {
        AgentError::InvalidOutput("Found opening brace but no closing brace in response".to_string())
    })?;

    serde_json::from_str(&reply[start..=end]).map_err(|e| AgentError::InvalidOutput(e.to_string()))
}
