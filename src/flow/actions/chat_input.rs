use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{Result, common::Vars, runtime::ExecutionContext};

use super::{Action, ActionScope, NodeType};

/// Entry point of a conversation. Passes the context through unchanged.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChatInputAction;

#[async_trait]
impl Action for ChatInputAction {
    fn create(_: &Vars) -> Result<Self> {
        Ok(ChatInputAction)
    }

    fn schema() -> serde_json::Value {
        json!({})
    }

    fn node_type(&self) -> NodeType {
        NodeType::ChatInput
    }

    async fn run(
        &self,
        _: &ActionScope<'_>,
        ctx: ExecutionContext,
    ) -> Result<ExecutionContext> {
        Ok(ctx)
    }
}
