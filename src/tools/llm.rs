use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmReply {
    pub content: String,
}

/// A text-completion backend.
///
/// Implementations report provider failures as
/// [`AgentflowError::ToolInvocation`](crate::AgentflowError::ToolInvocation).
#[async_trait]
pub trait LlmAdapter: Send + Sync {
    async fn invoke(
        &self,
        request: LlmRequest,
    ) -> Result<LlmReply>;
}

/// Offline stand-in that echoes the prompt back.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedLlm;

#[async_trait]
impl LlmAdapter for SimulatedLlm {
    async fn invoke(
        &self,
        request: LlmRequest,
    ) -> Result<LlmReply> {
        Ok(LlmReply {
            content: format!("Simulated {} response to: {}", request.model, request.prompt),
        })
    }
}
