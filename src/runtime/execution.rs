use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    Result,
    flow::consts,
    model::{FlowModel, NodeId},
    runtime::ExecutionContext,
};

pub type ExecutionId = String;

/// The textual answer of an execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowResponse {
    pub content: String,
    pub format: String,
}

impl FlowResponse {
    pub fn new(
        content: impl Into<String>,
        format: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            format: format.into(),
        }
    }

    /// Plain text response.
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(content, consts::FORMAT_TEXT)
    }

    pub fn no_output() -> Self {
        Self::text(consts::NO_OUTPUT)
    }

    /// Picks the response out of a finished context: `finalOutput`, then
    /// `agentResponse`, then `llmResponse`. Empty replies count as absent.
    pub fn from_context(ctx: &ExecutionContext) -> Self {
        if let Some(output) = ctx.final_output() {
            return output;
        }
        ctx.agent_response()
            .filter(|s| !s.is_empty())
            .or_else(|| ctx.llm_response().filter(|s| !s.is_empty()))
            .map(Self::text)
            .unwrap_or_else(Self::no_output)
    }
}

/// Everything known about a finished execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
    pub id: ExecutionId,
    /// id of the executed flow, empty for ad-hoc flows
    pub flow_id: String,
    pub response: FlowResponse,
    pub context: ExecutionContext,
    /// nodes in the order they ran
    pub visited: Vec<NodeId>,
    pub elapsed_ms: i64,
}

/// A flow handed to the engine, either live or still serialized.
#[derive(Debug, Clone)]
pub enum FlowSource {
    Model(FlowModel),
    Value(Value),
    Json(String),
}

impl FlowSource {
    pub fn into_model(self) -> Result<FlowModel> {
        match self {
            FlowSource::Model(model) => Ok(model),
            FlowSource::Value(value) => FlowModel::from_value(value),
            FlowSource::Json(text) => FlowModel::from_json(&text),
        }
    }
}

impl From<FlowModel> for FlowSource {
    fn from(model: FlowModel) -> Self {
        FlowSource::Model(model)
    }
}

impl From<&FlowModel> for FlowSource {
    fn from(model: &FlowModel) -> Self {
        FlowSource::Model(model.clone())
    }
}

impl From<Value> for FlowSource {
    fn from(value: Value) -> Self {
        FlowSource::Value(value)
    }
}

impl From<String> for FlowSource {
    fn from(text: String) -> Self {
        FlowSource::Json(text)
    }
}

impl From<&str> for FlowSource {
    fn from(text: &str) -> Self {
        FlowSource::Json(text.to_string())
    }
}
