use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::{Value, json};

use crate::{
    AgentflowError, Result,
    config::LlmConfig,
    tools::{LlmAdapter, LlmReply, LlmRequest},
};

const API_KEY_ENV: &str = "OPENAI_API_KEY";
const TOOL: &str = "llm";

/// Client for OpenAI-compatible `/chat/completions` endpoints.
pub struct OpenAiLlm {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiLlm {
    /// Builds the client from configuration, falling back to the
    /// `OPENAI_API_KEY` environment variable for the key.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .ok_or_else(|| AgentflowError::Config(format!("llm.api_key is not set and {} is missing", API_KEY_ENV)))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| AgentflowError::Config(format!("failed to build http client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.api_key)).map_err(|e| AgentflowError::Config(format!("invalid api key: {}", e)))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn payload(request: &LlmRequest) -> Value {
        json!({
            "model": request.model,
            "temperature": request.temperature,
            "messages": [
                {"role": "user", "content": request.prompt}
            ],
        })
    }

    /// Extracts the first choice's message content.
    fn parse_reply(body: &Value) -> Result<LlmReply> {
        if let Some(message) = body.get("error").and_then(|e| e.get("message")).and_then(|m| m.as_str()) {
            return Err(AgentflowError::tool(TOOL, message));
        }

        let content = body
            .get("choices")
            .and_then(|v| v.as_array())
            .and_then(|arr| arr.first())
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| AgentflowError::tool(TOOL, "response carries no message content"))?;

        Ok(LlmReply {
            content: content.to_string(),
        })
    }
}

#[async_trait]
impl LlmAdapter for OpenAiLlm {
    async fn invoke(
        &self,
        request: LlmRequest,
    ) -> Result<LlmReply> {
        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(model = %request.model, "calling {}", url);

        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(&Self::payload(&request))
            .send()
            .await
            .map_err(|e| AgentflowError::tool(TOOL, e))?;

        let status = response.status();
        let body: Value = response.json().await.map_err(|e| AgentflowError::tool(TOOL, e))?;
        if !status.is_success() {
            return match Self::parse_reply(&body) {
                Err(e) => Err(e),
                Ok(_) => Err(AgentflowError::tool(TOOL, format!("provider returned {}", status))),
            };
        }

        Self::parse_reply(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(key: Option<&str>) -> LlmConfig {
        LlmConfig {
            api_key: key.map(str::to_string),
            base_url: "http://localhost:9/v1/".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_reply() {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": "hi there"}}]});
        assert_eq!(OpenAiLlm::parse_reply(&body).unwrap().content, "hi there");

        let body = json!({"error": {"message": "rate limited"}});
        let err = OpenAiLlm::parse_reply(&body).unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "llm invocation failed: rate limited");

        assert!(OpenAiLlm::parse_reply(&json!({"choices": []})).is_err());
    }

    #[test]
    fn test_payload() {
        let payload = OpenAiLlm::payload(&LlmRequest {
            model: "gpt-4o".to_string(),
            prompt: "hello".to_string(),
            temperature: 0.5,
        });
        assert_eq!(payload["model"], "gpt-4o");
        assert_eq!(payload["temperature"], 0.5);
        assert_eq!(payload["messages"][0]["content"], "hello");
    }

    #[test]
    fn test_new_trims_base_url() {
        let llm = OpenAiLlm::new(&config(Some("sk-test"))).unwrap();
        assert_eq!(llm.base_url, "http://localhost:9/v1");
        assert!(llm.headers().unwrap().contains_key(AUTHORIZATION));
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_tool_error() {
        let llm = OpenAiLlm::new(&config(Some("sk-test"))).unwrap();
        let err = llm
            .invoke(LlmRequest {
                model: "m".to_string(),
                prompt: "p".to_string(),
                temperature: 0.7,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AgentflowError::ToolInvocation { .. }));
    }
}
